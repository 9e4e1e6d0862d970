//! Line-oriented builder for Mermaid source text.

use crate::MAX_INDENT;

/// Accumulates indented statements, one per line.
#[derive(Debug, Clone)]
pub struct MermaidSource {
    indent_unit: String,
    lines: Vec<String>,
}

impl MermaidSource {
    /// Create an empty source with `indent` spaces per nesting level, capped
    /// at [`MAX_INDENT`].
    #[must_use]
    pub fn new(indent: usize) -> Self {
        Self {
            indent_unit: " ".repeat(indent.min(MAX_INDENT)),
            lines: Vec::new(),
        }
    }

    /// Append `text` at nesting `depth`.
    pub fn line(&mut self, depth: usize, text: impl AsRef<str>) -> &mut Self {
        let mut line = self.indent_unit.repeat(depth);
        line.push_str(text.as_ref());
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join all lines with `\n`. No trailing newline.
    #[must_use]
    pub fn finish(self) -> String {
        self.lines.join("\n")
    }
}
