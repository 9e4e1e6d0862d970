//! Label escaping for quoted Mermaid strings.

/// Mermaid entity standing in for a double quote inside a quoted label.
pub const QUOTE_ENTITY: &str = "#quot;";

/// Inline line break understood inside Mermaid labels.
pub const LINE_BREAK: &str = "<br/>";

/// Escape `text` for use between double quotes in node, subgraph and edge
/// labels. `\r\n`, `\n` and `\r` each become one [`LINE_BREAK`].
#[must_use]
pub fn escape_label(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => result.push_str(QUOTE_ENTITY),
            '\r' => {
                chars.next_if_eq(&'\n');
                result.push_str(LINE_BREAK);
            }
            '\n' => result.push_str(LINE_BREAK),
            _ => result.push(ch),
        }
    }
    result
}
