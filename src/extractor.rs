//! Recovery of the `{command, reason}` object from free-form model output.
//!
//! Models wrap their JSON in prose or code fences often enough that the
//! response text cannot be parsed directly. Extraction tries the span from
//! the first `{` to the last `}` first. When that span is not a JSON object
//! (two objects, stray braces in prose), a single pass over the text tries
//! each balanced span as it closes and keeps the outermost one that parses.

use serde_json::{Map, Value};
use tracing::debug;

/// A corrected command and the model's explanation. An empty `command` means
/// the model had no confident fix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixSuggestion {
    pub command: String,
    pub reason: String,
}

impl FixSuggestion {
    pub fn has_command(&self) -> bool {
        !self.command.is_empty()
    }
}

/// Extracts a suggestion from raw model output, or `None` when the text
/// holds no JSON object.
pub fn extract_suggestion(raw: &str) -> Option<FixSuggestion> {
    let object = greedy_span(raw)
        .and_then(parse_object)
        .or_else(|| {
            debug!("Greedy span did not parse, scanning balanced spans");
            first_balanced_object(raw)
        })?;

    Some(FixSuggestion {
        command: single_line(string_field(&object, "command")),
        reason: string_field(&object, "reason").trim().to_string(),
    })
}

fn greedy_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Scans once, keeping a stack of open-brace offsets. Braces inside JSON
/// string literals do not count. A span that parses replaces an earlier
/// candidate only when it encloses it, and the scan stops as soon as every
/// open brace is closed and a candidate exists.
fn first_balanced_object(text: &str) -> Option<Map<String, Value>> {
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut found: Option<(usize, Map<String, Value>)> = None;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push(i),
            '}' => {
                let Some(start) = open.pop() else { continue };
                if let Some(object) = parse_object(&text[start..=i]) {
                    if found.as_ref().is_none_or(|(earlier, _)| start < *earlier) {
                        found = Some((start, object));
                    }
                }
                if open.is_empty() && found.is_some() {
                    break;
                }
            }
            _ => {}
        }
    }
    found.map(|(_, object)| object)
}

fn parse_object(span: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Reads a string field; absent or non-string values read as empty.
fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Keeps the first non-empty line so the command can be re-executed as-is.
fn single_line(command: &str) -> String {
    command
        .split(['\n', '\r', '\u{2028}', '\u{2029}', '\u{85}'])
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}
