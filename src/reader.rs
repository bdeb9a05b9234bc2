//! Source line reader: an indexed, seekable view over the logical lines of a
//! document.
//!
//! Blank lines and comment lines never surface: every operation that moves
//! the cursor steps over them.

use crate::config::EngineConfig;

/// One logical line of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// 1-based line number in the source.
    pub number: usize,
    /// Width of the leading indentation.
    pub level: usize,
    /// Whether the source line ended with a line terminator.
    pub terminated: bool,
}

impl Line {
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

#[derive(Debug, Clone)]
pub struct LineReader {
    lines: Vec<Line>,
    cursor: usize,
    marker: String,
    comment_prefix: String,
}

impl LineReader {
    pub fn new(text: &str, config: &EngineConfig) -> Self {
        let lines = text
            .split_inclusive('\n')
            .enumerate()
            .map(|(idx, raw)| {
                let terminated = raw.ends_with('\n');
                let text = raw
                    .strip_suffix('\n')
                    .unwrap_or(raw)
                    .trim_end_matches('\r')
                    .to_string();
                let level = text.len() - text.trim_start().len();
                Line {
                    text,
                    number: idx + 1,
                    level,
                    terminated,
                }
            })
            .collect();
        Self::from_lines(lines, config)
    }

    /// Wraps already-split lines, e.g. the body of a verbatim block.
    pub fn from_lines(lines: Vec<Line>, config: &EngineConfig) -> Self {
        let mut reader = Self {
            lines,
            cursor: 0,
            marker: config.directive_marker.clone(),
            comment_prefix: config.comment_line_prefix(),
        };
        reader.cursor = reader.skip_from(0);
        reader.trace_current();
        reader
    }

    fn is_skipped(&self, line: &Line) -> bool {
        let text = line.text.trim_start();
        text.is_empty() || text.starts_with(&self.comment_prefix)
    }

    fn skip_from(&self, mut idx: usize) -> usize {
        while idx < self.lines.len() && self.is_skipped(&self.lines[idx]) {
            idx += 1;
        }
        idx
    }

    fn trace_current(&self) {
        if let Some(line) = self.lines.get(self.cursor) {
            tracing::trace!(line = line.number, level = line.level, text = %line.text, "read line");
        }
    }

    pub fn current_line(&self) -> Option<&Line> {
        self.lines.get(self.cursor)
    }

    /// The line after the current one, without moving the cursor.
    pub fn next_line(&self) -> Option<&Line> {
        if self.cursor >= self.lines.len() {
            return None;
        }
        self.lines.get(self.skip_from(self.cursor + 1))
    }

    pub fn advance(&mut self) {
        if self.cursor < self.lines.len() {
            self.cursor = self.skip_from(self.cursor + 1);
            self.trace_current();
        }
    }

    pub fn lines_remaining(&self) -> usize {
        self.lines[self.cursor.min(self.lines.len())..]
            .iter()
            .filter(|line| !self.is_skipped(line))
            .count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.lines.len()
    }

    /// First word of a line: the keyword for directive lines, otherwise the
    /// first whitespace-separated token.
    pub fn marker_word<'l>(&self, line: &'l Line) -> &'l str {
        let text = line.text.trim_start();
        let text = text.strip_prefix(self.marker.as_str()).unwrap_or(text);
        text.split_whitespace().next().unwrap_or("")
    }

    /// The keyword of a directive line, `None` for lines without the marker.
    pub fn directive_word<'l>(&self, line: &'l Line) -> Option<&'l str> {
        let rest = line.text.trim_start().strip_prefix(self.marker.as_str())?;
        rest.split_whitespace()
            .next()
            .filter(|_| !rest.starts_with(char::is_whitespace))
    }

    /// Consumes lines up to, not including, the first line whose marker word
    /// is `until`. That line becomes the current line.
    ///
    /// With `until == None` everything up to end of input is consumed. Returns
    /// `None` when `until` was given but never found; the lines are consumed
    /// either way.
    pub fn read_block(&mut self, until: Option<&str>) -> Option<Vec<Line>> {
        match until {
            Some(keyword) => self.read_until(|r, line| r.marker_word(line) == keyword),
            None => {
                let mut block = Vec::new();
                while let Some(line) = self.current_line() {
                    block.push(line.clone());
                    self.advance();
                }
                Some(block)
            }
        }
    }

    /// Like [`read_block`](Self::read_block), but only a directive line
    /// carrying the marker followed by `keyword` ends the block. A literal
    /// line that merely starts with the same word is part of the block.
    pub fn read_directive_block(&mut self, keyword: &str) -> Option<Vec<Line>> {
        self.read_until(|r, line| r.directive_word(line) == Some(keyword))
    }

    fn read_until(&mut self, is_end: impl Fn(&Self, &Line) -> bool) -> Option<Vec<Line>> {
        let mut block = Vec::new();
        while let Some(line) = self.current_line() {
            if is_end(self, line) {
                return Some(block);
            }
            block.push(line.clone());
            self.advance();
        }
        None
    }
}
