//! Line source for the configuration grammar.

use std::io::{self, BufRead};

/// Yields the meaningful lines of a configuration file: comments (`#` to end of
/// line) removed, surrounding whitespace trimmed, empty lines skipped.
///
/// Lines are read as raw bytes and the comment is cut before decoding, so stray
/// 8-bit bytes in comments are harmless. Invalid UTF-8 in content is replaced with
/// U+FFFD.
pub struct ConfigLines<R> {
    reader: R,
    buf: Vec<u8>,
    number: usize,
}

impl<R: BufRead> ConfigLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            number: 0,
        }
    }

    /// Next non-empty line, or `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }
            self.number += 1;

            let content = String::from_utf8_lossy(strip_comment(&self.buf));
            let content = content.trim();
            if !content.is_empty() {
                return Ok(Some(content.to_string()));
            }
        }
    }

    /// 1-based number of the line last returned.
    pub fn line_number(&self) -> usize {
        self.number
    }
}

fn strip_comment(line: &[u8]) -> &[u8] {
    match line.iter().position(|&b| b == b'#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}
