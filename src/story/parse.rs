//! Pulls a JSON object out of model output that may be wrapped in code fences or prose.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z]*").expect("code fence pattern is valid"));

/// Removes every Markdown code-fence marker (with an optional language tag).
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Byte spans of every balanced top-level `{...}` block, in order of appearance.
/// Braces inside JSON strings are ignored.
fn top_level_objects(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }

    spans
}

/// Parses model output into JSON. Direct parsing is tried first; otherwise the last
/// top-level object that parses wins, then the widest `{...}` span as a final try.
pub fn extract_json_payload(raw: &str) -> Option<Value> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Some(value);
    }

    let from_blocks = top_level_objects(&cleaned)
        .into_iter()
        .rev()
        .find_map(|block| serde_json::from_str::<Value>(block).ok());
    if from_blocks.is_some() {
        return from_blocks;
    }

    let open = cleaned.find('{')?;
    let close = cleaned.rfind('}')?;
    if close <= open {
        return None;
    }
    serde_json::from_str(&cleaned[open..=close]).ok()
}
