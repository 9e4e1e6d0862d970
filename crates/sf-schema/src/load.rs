use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;
use sf_core::{ProcessDocument, SwimflowError};
use tracing::debug;

/// Deepest array/object nesting a payload may have, matching `serde_json`'s
/// recursion limit. The JSON5 and YAML fallbacks only see payloads within it.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Read a process document out of arbitrary text.
///
/// Accepts JSON, JSON5, YAML, or a language-model reply that wraps one of
/// those in a fenced code block. The result is not validated.
pub fn load_value(input: &str) -> Result<Value, SwimflowError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SwimflowError::load("Input is empty"));
    }

    if let Ok(value) = parse_json_family(trimmed)
        && value.is_object()
    {
        return Ok(value);
    }

    if let Some(block) = extract_fenced_block(trimmed) {
        debug!(bytes = block.len(), "extracted process document from fenced code block");
        return parse_payload(block)
            .map_err(|error| SwimflowError::load(format!("Fenced code block: {error}")));
    }

    match parse_payload(trimmed) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(SwimflowError::load(
            "No process document found: document root is not an object",
        )),
        Err(error) => Err(SwimflowError::load(format!(
            "No process document found: {error}"
        ))),
    }
}

/// Load and deserialize into the typed model.
///
/// A value that lacks `actors` or `steps`, or whose enumerations hold unknown
/// values, is reported as [`SwimflowError::InvalidDocument`].
pub fn load_document(input: &str) -> Result<ProcessDocument, SwimflowError> {
    let value = load_value(input)?;
    to_document(value)
}

pub(crate) fn to_document(value: Value) -> Result<ProcessDocument, SwimflowError> {
    serde_json::from_value(value).map_err(|error| SwimflowError::invalid_document(error.to_string()))
}

fn parse_json_family(payload: &str) -> Result<Value, String> {
    check_nesting(payload)?;
    serde_json::from_str::<Value>(payload).or_else(|json_error| {
        json5::from_str::<Value>(payload).map_err(|json5_error| {
            format!("JSON parse failed ({json_error}); JSON5 parse failed ({json5_error})")
        })
    })
}

fn parse_payload(payload: &str) -> Result<Value, String> {
    check_nesting(payload)?;
    parse_json_family(payload).or_else(|json_error| {
        serde_yaml::from_str::<Value>(payload)
            .map_err(|yaml_error| format!("{json_error}; YAML parse failed ({yaml_error})"))
    })
}

fn check_nesting(payload: &str) -> Result<(), String> {
    let depth = nesting_depth(payload);
    if depth > MAX_NESTING_DEPTH {
        return Err(format!(
            "document nests {depth} levels deep (limit {MAX_NESTING_DEPTH})"
        ));
    }
    Ok(())
}

/// Deepest `[`/`{` nesting in `payload`, lexed the way JSON5 lexes it:
/// brackets inside strings and comments do not count.
fn nesting_depth(payload: &str) -> usize {
    let mut depth = 0_usize;
    let mut deepest = 0_usize;
    let mut chars = payload.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' => skip_string(&mut chars, ch),
            '/' => match chars.peek() {
                Some('/') => {
                    for next in chars.by_ref() {
                        if next == '\n' {
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut previous = '\0';
                    for next in chars.by_ref() {
                        if previous == '*' && next == '/' {
                            break;
                        }
                        previous = next;
                    }
                }
                _ => {}
            },
            '[' | '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

fn skip_string(chars: &mut Peekable<Chars<'_>>, quote: char) {
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            chars.next();
        } else if ch == quote {
            return;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceTag {
    Json,
    Fallback,
    Foreign,
}

impl FenceTag {
    fn classify(info: &str) -> Self {
        let tag = info.split_whitespace().next().unwrap_or("");
        match tag.to_ascii_lowercase().as_str() {
            "json" | "json5" | "jsonc" => Self::Json,
            "" | "yaml" | "yml" => Self::Fallback,
            _ => Self::Foreign,
        }
    }
}

/// Body of the process-document code block in `text`, if any.
///
/// The first block tagged `json` (or `json5`/`jsonc`) wins; otherwise the
/// first block that is untagged or tagged `yaml`. Blocks in other languages
/// and unterminated blocks are ignored.
#[must_use]
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    let mut fallback = None;
    let mut open: Option<(usize, FenceTag)> = None;
    let mut offset = 0_usize;

    for segment in text.split_inclusive('\n') {
        let line = segment.trim_end_matches(['\r', '\n']).trim();
        let segment_start = offset;
        offset += segment.len();

        match open {
            None => {
                if let Some(info) = line.strip_prefix("```") {
                    open = Some((offset, FenceTag::classify(info)));
                }
            }
            Some((body_start, tag)) => {
                if line.starts_with("```") && line.trim_start_matches('`').is_empty() {
                    let body = text[body_start..segment_start].trim_matches(['\r', '\n']);
                    match tag {
                        FenceTag::Json => return Some(body),
                        FenceTag::Fallback if fallback.is_none() => fallback = Some(body),
                        _ => {}
                    }
                    open = None;
                }
            }
        }
    }

    fallback
}
