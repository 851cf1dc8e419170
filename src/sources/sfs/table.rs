//! Column inference for whitespace-aligned tables.

use crate::document::{DocumentNode, NodeKind, Validity};
use crate::sources::sfs::temporal::{
    blank_markers, find_markers, strip_markers, validity_from_markers,
};

const STOP_TOLERANCE: usize = 1;

/// A cell fragment and the character column where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    start: usize,
    text: String,
}

#[derive(Debug, Default)]
struct PendingRow {
    cells: Vec<String>,
    validity: Option<Validity>,
}

impl PendingRow {
    fn put(&mut self, column: usize, text: &str) {
        if self.cells.len() <= column {
            self.cells.resize(column + 1, String::new());
        }
        let cell = &mut self.cells[column];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(text);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TableReconstructor;

impl TableReconstructor {
    pub fn new() -> Self {
        Self
    }

    /// Builds a `Table` node from the raw lines of a table block.
    pub fn reconstruct(&self, block: &str) -> DocumentNode {
        let lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
        let margin = lines
            .iter()
            .filter(|l| !strip_markers(l).is_empty())
            .map(|l| leading_spaces(l))
            .min()
            .unwrap_or(0);

        let mut stops: Vec<usize> = Vec::new();
        let mut rows: Vec<PendingRow> = Vec::new();
        let mut active: Option<Validity> = None;

        for line in lines {
            let markers = find_markers(line);
            if !markers.is_empty() {
                active = validity_from_markers(&markers);
                if strip_markers(line).is_empty() {
                    continue;
                }
            }
            let indented = line.chars().nth(margin) == Some(' ');
            let line: String = blank_markers(line).chars().skip(margin).collect();
            let segments = split_segments(&line);
            if segments.is_empty() {
                continue;
            }

            let continuation = indented && !rows.is_empty();
            if stops.is_empty() {
                stops = segments.iter().map(|s| s.start).collect();
            }

            if continuation {
                if let Some(row) = rows.last_mut() {
                    for segment in &segments {
                        row.put(column_for(&stops, segment.start), &segment.text);
                    }
                }
                continue;
            }

            let mut row = PendingRow {
                cells: Vec::new(),
                validity: active.clone(),
            };
            let mut last_column: Option<usize> = None;
            for segment in &segments {
                let mut column = column_for(&stops, segment.start);
                if last_column.is_some_and(|last| column <= last) {
                    let rightmost = stops.last().copied().unwrap_or(0);
                    if segment.start > rightmost {
                        stops.push(segment.start);
                        column = stops.len() - 1;
                    }
                }
                row.put(column, &segment.text);
                last_column = Some(column);
            }
            rows.push(row);
        }

        let width = rows
            .iter()
            .map(|r| r.cells.len())
            .max()
            .unwrap_or(0)
            .max(stops.len());

        let mut table = DocumentNode::new(NodeKind::Table);
        for mut pending in rows {
            pending.cells.resize(width, String::new());
            let mut row = DocumentNode::new(NodeKind::TableRow).with_validity(pending.validity);
            for cell in pending.cells {
                row.push(DocumentNode::leaf(NodeKind::TableCell, &normalize_cell(&cell)));
            }
            table.push(row);
        }
        table
    }
}

fn leading_spaces(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

/// Index of the rightmost stop at or left of `start`.
fn column_for(stops: &[usize], start: usize) -> usize {
    stops
        .iter()
        .rposition(|stop| *stop <= start + STOP_TOLERANCE)
        .unwrap_or(0)
}

/// Splits a line on runs of two or more spaces.
fn split_segments(line: &str) -> Vec<Segment> {
    let chars: Vec<char> = line.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && chars[i] == ' ' {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        let start = i;
        let mut end = i;
        while end < chars.len() {
            if chars[end] == ' ' && chars.get(end + 1) == Some(&' ') {
                break;
            }
            end += 1;
        }
        let text: String = chars[start..end].iter().collect();
        segments.push(Segment {
            start,
            text: text.trim_end().to_string(),
        });
        i = end;
    }
    segments
}

fn normalize_cell(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
