//! Line- and paragraph-oriented cursor over decoded statute text.

use crate::error::CursorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub linesep: String,
    pub autostrip: bool,
    pub expand_tabs: bool,
    pub tab_width: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            linesep: "\n".to_string(),
            autostrip: true,
            expand_tabs: true,
            tab_width: 8,
        }
    }
}

/// Forward-only cursor. Lookahead (`peek_*`) never moves the position;
/// every `read_*` that returns while not at end-of-input moves it forward.
#[derive(Debug, Clone)]
pub struct TextCursor {
    data: String,
    pos: usize,
    options: ReaderOptions,
    paragraph_sep: String,
}

impl TextCursor {
    pub fn new(text: &str, options: ReaderOptions) -> Self {
        let data = if options.linesep == "\n" {
            text.replace("\r\n", "\n")
        } else {
            text.to_string()
        };
        let paragraph_sep = options.linesep.repeat(2);
        Self {
            data,
            pos: 0,
            options,
            paragraph_sep,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text, ReaderOptions::default())
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn linesep(&self) -> &str {
        &self.options.linesep
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Unread input, unprocessed.
    pub fn remaining(&self) -> &str {
        &self.data[self.pos..]
    }

    fn process(&self, raw: &str) -> String {
        let out = self.expand(raw);
        if self.options.autostrip {
            out.trim().to_string()
        } else {
            out
        }
    }

    fn expand(&self, raw: &str) -> String {
        if self.options.expand_tabs && raw.contains('\t') {
            expand_tabs(raw, self.options.tab_width)
        } else {
            raw.to_string()
        }
    }

    /// Byte range of the next chunk ending at `delimiter`, starting at `from`,
    /// and the position after the delimiter.
    fn chunk_bounds(&self, from: usize, delimiter: &str) -> (usize, usize) {
        match self.data[from..].find(delimiter) {
            Some(idx) => (from + idx, from + idx + delimiter.len()),
            None => (self.data.len(), self.data.len()),
        }
    }

    fn peek_chunk(&self, delimiter: &str, n: usize) -> Option<String> {
        let mut from = self.pos;
        let mut result = None;
        for _ in 0..n.max(1) {
            if from >= self.data.len() {
                return None;
            }
            let (end, next) = self.chunk_bounds(from, delimiter);
            result = Some(self.process(&self.data[from..end]));
            from = next;
        }
        result
    }

    pub fn read_chunk(&mut self, delimiter: &str) -> String {
        if self.eof() {
            return String::new();
        }
        let (end, next) = self.chunk_bounds(self.pos, delimiter);
        let chunk = self.process(&self.data[self.pos..end]);
        self.pos = next;
        chunk
    }

    pub fn peek_line(&self, n: usize) -> String {
        self.peek_chunk(&self.options.linesep, n).unwrap_or_default()
    }

    pub fn read_line(&mut self) -> String {
        let sep = self.options.linesep.clone();
        self.read_chunk(&sep)
    }

    pub fn peek_paragraph(&self, n: usize) -> String {
        self.peek_chunk(&self.paragraph_sep, n).unwrap_or_default()
    }

    /// Like `peek_paragraph`, but `None` once lookahead runs past the end.
    pub fn peek_paragraph_at(&self, n: usize) -> Option<String> {
        self.peek_chunk(&self.paragraph_sep, n)
    }

    pub fn read_paragraph(&mut self) -> String {
        let sep = self.paragraph_sep.clone();
        self.read_chunk(&sep)
    }

    /// Next paragraph with its indentation intact (tabs still expanded).
    /// Column layouts depend on the left margin, so tables read through this.
    pub fn read_paragraph_raw(&mut self) -> String {
        if self.eof() {
            return String::new();
        }
        let (end, next) = self.chunk_bounds(self.pos, &self.paragraph_sep);
        let chunk = self.expand(&self.data[self.pos..end]);
        self.pos = next;
        chunk
    }

    /// Moves to the start of the next `marker`.
    pub fn cue_to(&mut self, marker: &str) -> Result<(), CursorError> {
        match self.data[self.pos..].find(marker) {
            Some(idx) => {
                self.pos += idx;
                Ok(())
            }
            None => Err(CursorError::NotFound {
                marker: marker.to_string(),
                offset: self.pos,
            }),
        }
    }

    /// Moves just past the next `marker`.
    pub fn cue_past(&mut self, marker: &str) -> Result<(), CursorError> {
        self.cue_to(marker)?;
        self.pos += marker.len();
        Ok(())
    }

    /// Reads up to (not including) the next `marker`.
    pub fn read_to(&mut self, marker: &str) -> Result<String, CursorError> {
        let start = self.pos;
        self.cue_to(marker)?;
        Ok(self.process(&self.data[start..self.pos]))
    }

    /// New cursor over the region `extractor` reads from this one.
    pub fn sub_cursor<F>(&mut self, extractor: F) -> Result<TextCursor, CursorError>
    where
        F: FnOnce(&mut TextCursor) -> Result<String, CursorError>,
    {
        let region = extractor(self)?;
        Ok(TextCursor::new(&region, self.options.clone()))
    }

    pub fn chunks(&mut self, delimiter: &str) -> Chunks<'_> {
        Chunks {
            cursor: self,
            delimiter: delimiter.to_string(),
        }
    }

    pub fn paragraphs(&mut self) -> Chunks<'_> {
        let delimiter = self.paragraph_sep.clone();
        Chunks {
            cursor: self,
            delimiter,
        }
    }
}

/// Successive chunks under one delimiter until end-of-input.
pub struct Chunks<'a> {
    cursor: &'a mut TextCursor,
    delimiter: String,
}

impl Iterator for Chunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.cursor.eof() {
            return None;
        }
        Some(self.cursor.read_chunk(&self.delimiter))
    }
}

pub fn expand_tabs(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = width - (column % width);
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}
