use sfs_ingest::document::DocumentNode;
use sfs_ingest::runtime::logging::{init_logging, LogLevel};
use sfs_ingest::runtime::types::ParserResources;
use sfs_ingest::sources::configs::ParserConfig;
use sfs_ingest::sources::sfs::adapter::parse_document;
use sfs_ingest::sources::sfs::parser::parse_body;
use sfs_ingest::sources::sfs::reader::TextCursor;
use sfs_ingest::sources::sfs::registry::Registry;
use sfs_ingest::types::DocumentInput;
use std::time::{Duration, Instant};

fn summarize(durations: &[Duration]) -> (f64, f64) {
    let secs: Vec<f64> = durations.iter().map(Duration::as_secs_f64).collect();
    let avg = secs.iter().sum::<f64>() / secs.len().max(1) as f64;
    let min = secs.iter().copied().fold(f64::INFINITY, f64::min);
    (avg, min)
}

fn node_count(node: &DocumentNode) -> usize {
    node.count_where(&|_| true)
}

fn main() {
    init_logging(LogLevel::Warn);

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .expect("Usage: bench_parser <statute.txt> [config.json]");
    let text = std::fs::read_to_string(&path).expect("Failed to read statute text");
    let config = match args.next() {
        Some(config_path) => {
            ParserConfig::load_from_file(config_path).expect("Failed to load config")
        }
        None => ParserConfig::default(),
    };
    let resources = ParserResources::load(&config).expect("Failed to load parser resources");
    let registry = Registry::default();
    let input = DocumentInput::sfs(None, text.clone());

    let iterations = 5;

    // Baseline: structure only
    let mut baseline = Vec::new();
    for i in 0..iterations {
        let start = Instant::now();
        let body = parse_body(TextCursor::new(&text, config.reader_options()))
            .expect("structural parse failed");
        let elapsed = start.elapsed();
        baseline.push(elapsed);
        println!(
            "Structure {}: {:.3}s ({} nodes)",
            i + 1,
            elapsed.as_secs_f64(),
            node_count(&body),
        );
    }
    let (baseline_avg, baseline_min) = summarize(&baseline);
    println!("Structure avg: {:.3}s, min: {:.3}s\n", baseline_avg, baseline_min);

    let mut durations = Vec::new();
    for i in 0..iterations {
        let start = Instant::now();
        let document =
            parse_document(&input, &resources, &registry, &config).expect("parse failed");
        let elapsed = start.elapsed();
        durations.push(elapsed);
        let references = document.body.as_ref().map_or(0, |body| {
            let mut count = 0;
            body.walk(&mut |node| {
                count += node
                    .runs()
                    .iter()
                    .filter(|run| matches!(run, sfs_ingest::document::InlineRun::Reference(_)))
                    .count();
            });
            count
        });
        println!(
            "Full {}: {:.3}s ({}, {} references)",
            i + 1,
            elapsed.as_secs_f64(),
            document.status.as_str(),
            references,
        );
    }

    let (avg, min) = summarize(&durations);
    println!("\nFull avg: {:.3}s, min: {:.3}s", avg, min);
    println!("Overhead vs structure: {:.1}x", avg / baseline_avg);
}
