//! Extraction policy: prefer a fenced code block tagged `json` or untagged;
//! otherwise fall back to the first balanced `{...}`.

use regex::Regex;
use std::sync::OnceLock;

use crate::brace_scan::first_balanced_object;

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[ \t]*\r?\n(.*?)```").expect("static fence pattern is valid")
    })
}

/// Extract the first balanced JSON object embedded in free-form model text.
///
/// Returns `None` when no balanced object can be found anywhere in `text`,
/// which is the parser's signal to synthesize the documented fallback.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<String> {
    for capture in fence_pattern().captures_iter(text) {
        let lang = capture.get(1).map(|m| m.as_str()).unwrap_or("");
        if lang.is_empty() || lang.eq_ignore_ascii_case("json") {
            let body = capture.get(2).map(|m| m.as_str()).unwrap_or("");
            if let Some(object) = first_balanced_object(body) {
                return Some(object.to_string());
            }
        }
    }

    first_balanced_object(text).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_json_tagged_fence() {
        let text = "Here:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json_object(text), Some(r#"{"a": 1}"#.to_string()));
    }

    #[test]
    fn accepts_untagged_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(text), Some(r#"{"a": 1}"#.to_string()));
    }

    #[test]
    fn falls_back_to_bare_braces_without_fence() {
        let text = "I think the answer is {\"a\": 1} roughly.";
        assert_eq!(extract_json_object(text), Some(r#"{"a": 1}"#.to_string()));
    }

    #[test]
    fn ignores_non_json_fence_and_falls_back() {
        let text = "```python\nprint('hi')\n```\nbut also {\"a\": 1}";
        assert_eq!(extract_json_object(text), Some(r#"{"a": 1}"#.to_string()));
    }

    #[test]
    fn plain_prose_yields_none() {
        assert_eq!(extract_json_object("I think we should add dark mode."), None);
    }
}
