//! Shared extraction strategies for LLM output parsing.
//!
//! Every parser calls into these functions for preprocessing (thinking-block
//! removal), fenced code block extraction, and bracket matching.

use crate::config::ParserConfig;

const THINK_TAGS: [(&str, &str); 2] = [("<think>", "</think>"), ("<thinking>", "</thinking>")];

const FENCE: &str = "```";

/// Default preprocessing: strip thinking blocks, then trim.
pub fn preprocess(text: &str) -> String {
    strip_think_tags(text).trim().to_string()
}

/// Preprocessing as selected by `config`.
pub fn preprocess_with(text: &str, config: &ParserConfig) -> String {
    if config.strip_thinking {
        preprocess(text)
    } else {
        text.trim().to_string()
    }
}

/// Strip all `<think>...</think>` and `<thinking>...</thinking>` blocks.
///
/// An opening tag without a closing tag removes everything after it: the
/// model was cut off mid-thought and nothing that follows is an answer.
///
/// # Examples
///
/// ```
/// use llm_output_parser::output_parser::strip_think_tags;
///
/// assert_eq!(strip_think_tags("<think>reasoning</think>result"), "result");
/// assert_eq!(strip_think_tags("<think>no closing tag"), "");
/// assert_eq!(strip_think_tags("<thinking>also works</thinking>done"), "done");
/// ```
pub fn strip_think_tags(text: &str) -> String {
    extract_thinking(text).1
}

/// Split a response into its thinking content and the remaining text.
///
/// Returns `(thinking, rest)`. `thinking` joins the bodies of every block
/// with newlines and is `None` when no non-empty block was found. `rest` is
/// not trimmed.
///
/// ```
/// use llm_output_parser::output_parser::extract::extract_thinking;
///
/// let (thinking, rest) = extract_thinking("<think>hmm</think>42");
/// assert_eq!(thinking.as_deref(), Some("hmm"));
/// assert_eq!(rest, "42");
/// ```
pub fn extract_thinking(text: &str) -> (Option<String>, String) {
    let mut rest = text.to_string();
    let mut thoughts: Vec<String> = Vec::new();

    for (open, close) in THINK_TAGS {
        while let Some(start) = rest.find(open) {
            let body_start = start + open.len();
            match rest[body_start..].find(close) {
                Some(len) => {
                    thoughts.push(rest[body_start..body_start + len].trim().to_string());
                    rest.replace_range(start..body_start + len + close.len(), "");
                }
                None => {
                    thoughts.push(rest[body_start..].trim().to_string());
                    rest.truncate(start);
                }
            }
        }
    }

    thoughts.retain(|t| !t.is_empty());
    let thinking = (!thoughts.is_empty()).then(|| thoughts.join("\n"));
    (thinking, rest)
}

/// A fenced markdown code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// The language hint after the opening fence, if any.
    pub lang: Option<&'a str>,
    /// The trimmed block body.
    pub body: &'a str,
}

/// Iterator over the closed fenced code blocks of a text, in order.
#[derive(Debug, Clone)]
pub struct CodeBlocks<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for CodeBlocks<'a> {
    type Item = CodeBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.text;
        let open = self.pos + text.get(self.pos..)?.find(FENCE)?;
        let header_start = open + FENCE.len();
        let header_len = text[header_start..].find('\n')?;
        let body_start = header_start + header_len + 1;

        let Some(body_len) = text[body_start..].find(FENCE) else {
            self.pos = text.len();
            return None;
        };
        let body_end = body_start + body_len;
        self.pos = body_end + FENCE.len();

        let lang = text[header_start..header_start + header_len].trim();
        Some(CodeBlock {
            lang: (!lang.is_empty()).then_some(lang),
            body: text[body_start..body_end].trim(),
        })
    }
}

/// All closed fenced code blocks in `text`.
pub fn code_blocks(text: &str) -> CodeBlocks<'_> {
    CodeBlocks { text, pos: 0 }
}

/// The first fenced code block, with its language hint.
///
/// # Examples
///
/// ```
/// use llm_output_parser::output_parser::extract::extract_code_block;
///
/// let block = extract_code_block("Here:\n```json\n{\"a\": 1}\n```").unwrap();
/// assert_eq!(block.lang, Some("json"));
/// assert_eq!(block.body, "{\"a\": 1}");
/// ```
pub fn extract_code_block(text: &str) -> Option<CodeBlock<'_>> {
    code_blocks(text).next()
}

/// The body of the first code block tagged with `lang` (case-insensitive).
///
/// ```
/// use llm_output_parser::output_parser::extract::extract_code_block_for;
///
/// let input = "```yaml\na: 1\n```\n```JSON\n[1, 2, 3]\n```";
/// assert_eq!(extract_code_block_for(input, "json"), Some("[1, 2, 3]"));
/// ```
pub fn extract_code_block_for<'a>(text: &'a str, lang: &str) -> Option<&'a str> {
    code_blocks(text)
        .find(|block| block.lang.is_some_and(|l| l.eq_ignore_ascii_case(lang)))
        .map(|block| block.body)
}

/// The last top-level region delimited by `open`/`close`.
///
/// Nesting-aware and ignores delimiters inside double-quoted strings. The
/// last region is preferred because models usually put the answer after
/// any preamble.
///
/// ```
/// use llm_output_parser::output_parser::extract::find_bracketed;
///
/// let input = r#"Result: {"a": [1, 2]}"#;
/// assert_eq!(find_bracketed(input, '{', '}'), Some(r#"{"a": [1, 2]}"#));
/// ```
pub fn find_bracketed(text: &str, open: char, close: char) -> Option<&str> {
    let mut last = None;
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if depth > 0 && in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' && depth > 0 {
            in_string = true;
        } else if ch == open {
            if depth == 0 {
                start = i;
            }
            depth += 1;
        } else if ch == close && depth > 0 {
            depth -= 1;
            if depth == 0 {
                last = Some(&text[start..i + ch.len_utf8()]);
            }
        }
    }

    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn think_block_removed() {
        assert_eq!(strip_think_tags("<think>reasoning</think>result"), "result");
    }

    #[test]
    fn unclosed_think_block_drops_tail() {
        assert_eq!(strip_think_tags("answer first <think>then rambling"), "answer first ");
    }

    #[test]
    fn multiple_and_mixed_blocks() {
        let input = "<think>a</think>mid<thinking>b</thinking>end<think>c</think>";
        assert_eq!(strip_think_tags(input), "midend");
    }

    #[test]
    fn thinking_content_is_collected() {
        let (thinking, rest) = extract_thinking("<think> one </think>x<thinking>two</thinking>");
        assert_eq!(thinking.as_deref(), Some("one\ntwo"));
        assert_eq!(rest, "x");
    }

    #[test]
    fn empty_thinking_is_none() {
        let (thinking, rest) = extract_thinking("<think>  </think>value");
        assert!(thinking.is_none());
        assert_eq!(rest, "value");
    }

    #[test]
    fn preprocess_trims_after_stripping() {
        assert_eq!(preprocess("  <think>stuff</think>  hello world  "), "hello world");
    }

    #[test]
    fn preprocess_with_can_keep_thinking() {
        let config = ParserConfig::default().with_strip_thinking(false);
        assert_eq!(
            preprocess_with(" <think>x</think>y ", &config),
            "<think>x</think>y"
        );
    }

    #[test]
    fn bare_fence_has_no_lang() {
        let block = extract_code_block("```\n[1]\n```").unwrap();
        assert_eq!(block.lang, None);
        assert_eq!(block.body, "[1]");
    }

    #[test]
    fn iterates_all_blocks() {
        let input = "```python\nprint(1)\n```\ntext\n```json\n{}\n```";
        let langs: Vec<_> = code_blocks(input).map(|b| b.lang).collect();
        assert_eq!(langs, vec![Some("python"), Some("json")]);
    }

    #[test]
    fn unclosed_fence_yields_nothing() {
        assert!(extract_code_block("```json\n{\"a\": 1}").is_none());
        assert!(extract_code_block("no fences").is_none());
    }

    #[test]
    fn code_block_for_wrong_lang() {
        assert_eq!(extract_code_block_for("```yaml\nname: test\n```", "json"), None);
    }

    #[test]
    fn bracketed_prefers_last_region() {
        let input = r#"[1, 2] and then ["a", "b"]"#;
        assert_eq!(find_bracketed(input, '[', ']'), Some(r#"["a", "b"]"#));
    }

    #[test]
    fn bracketed_ignores_delimiters_in_strings() {
        let input = r#"note {"text": "a } inside", "n": {"m": 1}} end"#;
        assert_eq!(
            find_bracketed(input, '{', '}'),
            Some(r#"{"text": "a } inside", "n": {"m": 1}}"#)
        );
    }

    #[test]
    fn bracketed_unbalanced_is_none() {
        assert!(find_bracketed(r#"{"a": 1"#, '{', '}').is_none());
        assert!(find_bracketed("no brackets", '{', '}').is_none());
    }

    #[test]
    fn stray_quote_outside_region_is_ignored() {
        let input = r#"He said "here": {"k": "v"}"#;
        assert_eq!(find_bracketed(input, '{', '}'), Some(r#"{"k": "v"}"#));
    }
}
