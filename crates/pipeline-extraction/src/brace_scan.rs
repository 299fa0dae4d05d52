//! Balanced-brace JSON object extraction.
//!
//! Hand-written rather than regex-based: matching balanced braces through
//! string literals is not a regular language, so `regex` (the teacher's
//! go-to for text scanning elsewhere in this workspace) is reserved for the
//! code-fence detection in [`super::extract`] and this scanner does its own
//! character walk.

/// Find the first balanced `{ ... }` object in `text`, respecting string
/// literals (so a `}` inside a quoted string does not end the object early).
///
/// Returns `None` if no `{` is found, or if the braces never balance.
#[must_use]
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut idx = start;

    while idx < bytes.len() {
        let ch = bytes[idx] as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else {
            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..=idx]);
                    }
                }
                _ => {}
            }
        }
        idx += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_simple_object() {
        assert_eq!(first_balanced_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn tolerates_leading_and_trailing_prose() {
        let text = r#"Sure, here you go: {"a":1} Hope that helps!"#;
        assert_eq!(first_balanced_object(text), Some(r#"{"a":1}"#));
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_depth() {
        let text = r#"{"a": "looks like a } brace", "b": 2}"#;
        assert_eq!(first_balanced_object(text), Some(text));
    }

    #[test]
    fn escaped_quote_does_not_end_string_early() {
        let text = r#"{"a": "she said \"hi } there\""}"#;
        assert_eq!(first_balanced_object(text), Some(text));
    }

    #[test]
    fn nested_objects_balance_correctly() {
        let text = r#"{"a": {"b": 1}, "c": 2}"#;
        assert_eq!(first_balanced_object(text), Some(text));
    }

    #[test]
    fn unbalanced_input_returns_none() {
        assert_eq!(first_balanced_object(r#"{"a": 1"#), None);
    }

    #[test]
    fn no_brace_returns_none() {
        assert_eq!(first_balanced_object("just prose, no object here"), None);
    }
}
