//! Canonicalizing text builder for generated SQL.
//!
//! Indentation is written only at the start of a line, four spaces per
//! level. `finish` normalizes line endings to LF and trims trailing
//! whitespace, so the same sequence of calls always yields the same text.

use std::fmt;
use std::ops::{Deref, DerefMut};

const INDENT: &str = "    ";

#[derive(Debug)]
pub struct SqlWriter {
    buffer: String,
    indent_level: usize,
    at_line_start: bool,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            at_line_start: true,
        }
    }

    /// Append `text`. Embedded newlines start new lines at the current indent.
    pub fn append(&mut self, text: &str) -> &mut Self {
        for c in text.chars() {
            if c == '\n' || c == '\r' {
                self.buffer.push(c);
                self.at_line_start = true;
                continue;
            }
            if self.at_line_start {
                for _ in 0..self.indent_level {
                    self.buffer.push_str(INDENT);
                }
                self.at_line_start = false;
            }
            self.buffer.push(c);
        }
        self
    }

    pub fn append_line(&mut self, text: &str) -> &mut Self {
        self.append(text);
        self.buffer.push('\n');
        self.at_line_start = true;
        self
    }

    pub fn blank_line(&mut self) -> &mut Self {
        self.append_line("")
    }

    /// Raise the indent one level until the returned scope is dropped.
    pub fn indent(&mut self) -> IndentScope<'_> {
        self.indent_level += 1;
        IndentScope { writer: self }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Canonical text: LF line endings, no trailing whitespace on any line.
    pub fn finish(&self) -> String {
        let normalized = self.buffer.replace("\r\n", "\n").replace('\r', "\n");
        let mut out = String::with_capacity(normalized.len());
        for (i, line) in normalized.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(line.trim_end());
        }
        out
    }
}

impl Default for SqlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SqlWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.finish())
    }
}

/// Guard returned by [`SqlWriter::indent`].
pub struct IndentScope<'a> {
    writer: &'a mut SqlWriter,
}

impl Deref for IndentScope<'_> {
    type Target = SqlWriter;

    fn deref(&self) -> &SqlWriter {
        self.writer
    }
}

impl DerefMut for IndentScope<'_> {
    fn deref_mut(&mut self) -> &mut SqlWriter {
        self.writer
    }
}

impl Drop for IndentScope<'_> {
    fn drop(&mut self) {
        self.writer.indent_level = self.writer.indent_level.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_indent_written_at_line_start_only() {
        let mut writer = SqlWriter::new();
        writer.append_line("CREATE TABLE t (");
        {
            let mut inner = writer.indent();
            inner.append("a ").append("int,");
            inner.append_line("");
            inner.append_line("b int");
        }
        writer.append_line(");");
        assert_eq!(writer.finish(), "CREATE TABLE t (\n    a int,\n    b int\n);\n");
    }

    #[rstest]
    fn test_nested_scopes_restore_level() {
        let mut writer = SqlWriter::new();
        {
            let mut one = writer.indent();
            {
                let mut two = one.indent();
                two.append_line("deep");
            }
            one.append_line("one");
        }
        writer.append_line("zero");
        assert_eq!(writer.finish(), "        deep\n    one\nzero\n");
    }

    #[rstest]
    fn test_line_endings_canonicalized() {
        let mut lf = SqlWriter::new();
        lf.append("a\nb\n");
        let mut crlf = SqlWriter::new();
        crlf.append("a\r\nb\r\n");
        let mut cr = SqlWriter::new();
        cr.append("a\rb\r");
        assert_eq!(lf.finish(), crlf.finish());
        assert_eq!(lf.finish(), cr.finish());
    }

    #[rstest]
    fn test_trailing_whitespace_trimmed() {
        let mut writer = SqlWriter::new();
        writer.append_line("SELECT 1   ");
        {
            let mut inner = writer.indent();
            inner.blank_line();
        }
        assert_eq!(writer.to_string(), "SELECT 1\n\n");
    }

    #[rstest]
    fn test_embedded_newlines_are_indented() {
        let mut writer = SqlWriter::new();
        {
            let mut inner = writer.indent();
            inner.append_line("a\nb");
        }
        assert_eq!(writer.finish(), "    a\n    b\n");
    }
}
