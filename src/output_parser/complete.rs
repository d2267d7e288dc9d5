//! Completion of truncated JSON.
//!
//! Models that hit a token limit stop mid-document. [`auto_complete_json`]
//! closes whatever was left open so the part that did arrive can still be
//! deserialized.

use serde_json::Value;

use crate::output_parser::extract::strip_think_tags;
use crate::output_parser::scan::open_delimiters;

/// Close a truncated JSON document.
///
/// Steps:
/// - close an unterminated string
/// - drop a dangling comma, a key whose value never arrived, or an orphan
///   key with no colon
/// - append the missing `}` / `]` in nesting order
///
/// Returns the input unchanged (trimmed, thinking removed) if it is already
/// valid, and `None` if it does not start like JSON or completion still
/// fails.
///
/// # Example
///
/// ```
/// use llm_output_parser::output_parser::auto_complete_json;
///
/// let completed = auto_complete_json(r#"{"name": "Alice", "age": 3"#).unwrap();
/// let v: serde_json::Value = serde_json::from_str(&completed).unwrap();
/// assert_eq!(v["name"], "Alice");
/// ```
pub fn auto_complete_json(input: &str) -> Option<String> {
    let stripped = strip_think_tags(input);
    let text = stripped.trim();

    if !text.starts_with('{') && !text.starts_with('[') {
        return None;
    }
    if serde_json::from_str::<Value>(text).is_ok() {
        return Some(text.to_string());
    }

    let (closers, in_string) = open_delimiters(text);
    let mut out = text.to_string();
    if in_string {
        out.push('"');
    }

    let in_object = closers.last() == Some(&'}');
    drop_dangling_tail(&mut out, in_object);
    out.extend(closers.iter().rev());

    serde_json::from_str::<Value>(&out).is_ok().then_some(out)
}

/// Remove trailing fragments that cannot be closed into valid JSON.
fn drop_dangling_tail(out: &mut String, in_object: bool) {
    loop {
        let tail = out.trim_end();

        let cut = if let Some(rest) = tail.strip_suffix(',') {
            Some(rest.len())
        } else if let Some(rest) = tail.strip_suffix(':') {
            // `"key":` with no value: drop the key as well.
            strip_string_suffix(rest.trim_end()).map(str::len)
        } else if in_object {
            // `, "key"` with no colon.
            strip_string_suffix(tail)
                .map(str::trim_end)
                .filter(|rest| rest.ends_with(',') || rest.ends_with('{'))
                .map(str::len)
        } else {
            None
        };

        match cut {
            Some(len) => out.truncate(len),
            None => return,
        }
    }
}

/// If `text` ends with a complete string literal, return what precedes it.
fn strip_string_suffix(text: &str) -> Option<&str> {
    let inner = text.strip_suffix('"')?;
    let mut search = inner;
    loop {
        let pos = search.rfind('"')?;
        let backslashes = search[..pos].chars().rev().take_while(|&c| c == '\\').count();
        if backslashes % 2 == 0 {
            return Some(&text[..pos]);
        }
        search = &search[..pos];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(input: &str) -> Value {
        let text = auto_complete_json(input).expect("completable");
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn closes_unterminated_string() {
        let v = completed(r#"{"msg": "hello wor"#);
        assert_eq!(v["msg"], "hello wor");
    }

    #[test]
    fn closes_nested_containers() {
        let v = completed(r#"{"items": [{"name": "a"}, {"name": "b""#);
        assert_eq!(v["items"][1]["name"], "b");
    }

    #[test]
    fn drops_key_without_value() {
        let v = completed(r#"{"name": "Alice", "age": "#);
        assert_eq!(v, serde_json::json!({"name": "Alice"}));
    }

    #[test]
    fn drops_orphan_key() {
        let v = completed(r#"{"title": "Matrix", "year": 1999, "rating"#);
        assert_eq!(v, serde_json::json!({"title": "Matrix", "year": 1999}));
    }

    #[test]
    fn orphan_key_as_first_member() {
        let v = completed(r#"{"tit"#);
        assert_eq!(v, serde_json::json!({}));
    }

    #[test]
    fn array_strings_are_kept() {
        let v = completed(r#"["a", "b", "c"#);
        assert_eq!(v, serde_json::json!(["a", "b", "c"]));
    }

    #[test]
    fn trailing_comma_in_array() {
        let v = completed("[1, 2, 3, ");
        assert_eq!(v, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn escaped_quote_inside_value() {
        let v = completed(r#"{"q": "say \"hi\"", "n": 1"#);
        assert_eq!(v["q"], "say \"hi\"");
        assert_eq!(v["n"], 1);
    }

    #[test]
    fn thinking_is_stripped_first() {
        let v = completed(r#"<think>hmm</think>{"key": "val"#);
        assert_eq!(v["key"], "val");
    }

    #[test]
    fn valid_input_returned_trimmed() {
        assert_eq!(
            auto_complete_json("  {\"complete\": true}\n").as_deref(),
            Some("{\"complete\": true}")
        );
    }

    #[test]
    fn non_json_is_rejected() {
        assert!(auto_complete_json("just plain text").is_none());
        assert!(auto_complete_json("").is_none());
    }

    #[test]
    fn truncated_literal_cannot_be_completed() {
        assert!(auto_complete_json(r#"{"ok": tru"#).is_none());
    }
}
