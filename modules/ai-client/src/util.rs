use serde::de::DeserializeOwned;

use crate::error::AiError;

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code blocks from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Pull a `T` out of free-form model output.
///
/// Tried in order: the whole trimmed reply, each fenced code block (last
/// first), then the last outermost balanced `{...}` span. The first candidate
/// that deserializes wins.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AiError::Parse("Empty model output".to_string()));
    }

    let mut last_err = match serde_json::from_str::<T>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    for block in fenced_blocks(trimmed).into_iter().rev() {
        match serde_json::from_str::<T>(block) {
            Ok(value) => return Ok(value),
            Err(e) => last_err = e.to_string(),
        }
    }

    if let Some(span) = balanced_object_spans(trimmed).into_iter().next_back() {
        match serde_json::from_str::<T>(span) {
            Ok(value) => return Ok(value),
            Err(e) => last_err = e.to_string(),
        }
    }

    Err(AiError::Parse(format!(
        "No parseable JSON in model output ({last_err}): {}",
        truncate_to_char_boundary(trimmed, 200)
    )))
}

/// Bodies of ``` fenced blocks, with an optional language tag dropped.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
        let Some(close) = after_open[body_start..].find("```") else {
            break;
        };
        blocks.push(after_open[body_start..body_start + close].trim());
        rest = &after_open[body_start + close + 3..];
    }
    blocks
}

/// Top-level `{...}` spans, skipping braces inside JSON strings.
fn balanced_object_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        answer: String,
    }

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "Hello 世界";
        let truncated = truncate_to_char_boundary(text, 8);
        assert!(truncated.len() <= 8);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_truncate_within_bounds() {
        let text = "Hello";
        assert_eq!(truncate_to_char_boundary(text, 100), "Hello");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }

    #[test]
    fn bare_json_parses() {
        let r: Reply = extract_json(r#" {"answer": "SILENT"} "#).unwrap();
        assert_eq!(r.answer, "SILENT");
    }

    #[test]
    fn last_fenced_block_wins() {
        let text = "Draft:\n```json\n{\"answer\": \"OLD\"}\n```\nRevised:\n```json\n{\"answer\": \"NEW\"}\n```";
        let r: Reply = extract_json(text).unwrap();
        assert_eq!(r.answer, "NEW");
    }

    #[test]
    fn falls_back_to_earlier_block_when_last_is_wrong_shape() {
        let text = "```json\n{\"answer\": \"UNIT\"}\n```\n```\nnot json\n```";
        let r: Reply = extract_json(text).unwrap();
        assert_eq!(r.answer, "UNIT");
    }

    #[test]
    fn object_embedded_in_prose_is_found() {
        let text = "Sure! Here you go: {\"answer\": \"BOAT\"} Hope that helps.";
        let r: Reply = extract_json(text).unwrap();
        assert_eq!(r.answer, "BOAT");
    }

    #[test]
    fn braces_inside_strings_do_not_break_the_scan() {
        let text = "Result -> {\"answer\": \"a } tricky { one\"} done";
        let r: Reply = extract_json(text).unwrap();
        assert_eq!(r.answer, "a } tricky { one");
    }

    #[test]
    fn escaped_quotes_inside_strings_are_handled() {
        let text = r#"noise {"answer": "say \"hi\" }"} trailing"#;
        let r: Reply = extract_json(text).unwrap();
        assert_eq!(r.answer, "say \"hi\" }");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = extract_json::<Reply>("I could not solve this one.").unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }

    #[test]
    fn empty_output_is_a_parse_error() {
        let err = extract_json::<Reply>("   ").unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }
}
