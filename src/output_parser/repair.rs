//! Deterministic JSON repair for common LLM output errors.
//!
//! A fixed sequence of string-literal-aware passes rewrites the usual
//! mistakes models make when asked for JSON. Nothing here calls a model or
//! uses regular expressions; the result is always checked with `serde_json`.

use serde_json::Value;

use crate::output_parser::scan::{open_delimiters, StringState};

/// Attempt to repair common LLM JSON mistakes.
///
/// Returns the repaired string only when the input was invalid and the
/// repaired text is valid JSON. Returns `None` for input that is already
/// valid or that cannot be fixed.
///
/// Passes, in order:
/// 1. Single-quoted strings become double-quoted
/// 2. `//` and `/* */` comments are removed
/// 3. Python literals `True`, `False`, `None` become `true`, `false`, `null`
/// 4. Bare object keys are quoted
/// 5. Raw newlines, carriage returns and tabs inside strings are escaped
/// 6. Missing closing brackets and braces are appended in nesting order
/// 7. Trailing commas before `}` or `]` are removed
///
/// # Examples
///
/// ```
/// use llm_output_parser::output_parser::try_repair_json;
///
/// let fixed = try_repair_json("{'name': 'Ada', active: True,}").unwrap();
/// assert_eq!(fixed, r#"{"name": "Ada", "active": true}"#);
/// ```
pub fn try_repair_json(broken: &str) -> Option<String> {
    if is_valid_json(broken) {
        return None;
    }

    let passes: [fn(&str) -> String; 7] = [
        convert_single_quotes,
        strip_comments,
        replace_python_literals,
        quote_bare_keys,
        escape_control_chars,
        close_open_delimiters,
        drop_trailing_commas,
    ];

    let repaired = passes
        .iter()
        .fold(broken.trim().to_string(), |text, pass| pass(&text));

    is_valid_json(&repaired).then_some(repaired)
}

fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Previous non-whitespace character before index `i`.
fn prev_significant(chars: &[char], i: usize) -> Option<char> {
    chars[..i].iter().rev().copied().find(|c| !c.is_whitespace())
}

/// Next non-whitespace character after index `i`.
fn next_significant(chars: &[char], i: usize) -> Option<char> {
    chars.get(i + 1..)?.iter().copied().find(|c| !c.is_whitespace())
}

fn convert_single_quotes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut state = StringState::default();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if state.advance(ch) || ch != '\'' {
            out.push(ch);
            i += 1;
            continue;
        }

        let opens_value = matches!(prev_significant(&chars, i), None | Some('{' | '[' | ':' | ','));
        let close = opens_value
            .then(|| find_single_quote_close(&chars, i + 1))
            .flatten();

        match close {
            Some(end) => {
                out.push('"');
                let mut j = i + 1;
                while j < end {
                    match chars[j] {
                        '\\' if chars.get(j + 1) == Some(&'\'') => {
                            out.push('\'');
                            j += 2;
                            continue;
                        }
                        '"' => out.push_str("\\\""),
                        c => out.push(c),
                    }
                    j += 1;
                }
                out.push('"');
                i = end + 1;
            }
            None => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

/// First unescaped `'` at or after `from` that is followed by a structural
/// character (or the end). Apostrophes inside words are skipped.
fn find_single_quote_close(chars: &[char], from: usize) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            '\'' if matches!(next_significant(chars, j), None | Some('}' | ']' | ':' | ',')) => {
                return Some(j)
            }
            _ => j += 1,
        }
    }
    None
}

fn strip_comments(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut state = StringState::default();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if state.advance(ch) {
            out.push(ch);
            i += 1;
            continue;
        }
        match (ch, chars.get(i + 1).copied()) {
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

fn replace_python_literals(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut state = StringState::default();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if state.advance(ch) || !is_word_start(ch) {
            out.push(ch);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && is_word_char(chars[i]) {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();
        out.push_str(match word.as_str() {
            "True" => "true",
            "False" => "false",
            "None" => "null",
            other => other,
        });
    }
    out
}

fn quote_bare_keys(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 8);
    let mut state = StringState::default();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let in_literal = state.advance(ch);
        out.push(ch);
        i += 1;
        if in_literal || !matches!(ch, '{' | ',') {
            continue;
        }

        while i < chars.len() && chars[i].is_whitespace() {
            out.push(chars[i]);
            i += 1;
        }
        if i >= chars.len() || !is_word_start(chars[i]) {
            continue;
        }

        let start = i;
        while i < chars.len() && (is_word_char(chars[i]) || chars[i] == '-') {
            i += 1;
        }
        let key: String = chars[start..i].iter().collect();
        if next_significant(&chars, i - 1) == Some(':') {
            out.push('"');
            out.push_str(&key);
            out.push('"');
        } else {
            out.push_str(&key);
        }
    }
    out
}

fn escape_control_chars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut state = StringState::default();

    for ch in s.chars() {
        let quote = ch == '"';
        if state.advance(ch) && !quote {
            match ch {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c => out.push(c),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn close_open_delimiters(s: &str) -> String {
    let (stack, in_string) = open_delimiters(s);
    if in_string {
        // Unterminated strings are auto-completion's job.
        return s.to_string();
    }
    let mut out = s.to_string();
    out.extend(stack.iter().rev());
    out
}

fn drop_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut state = StringState::default();

    for (i, &ch) in chars.iter().enumerate() {
        if !state.advance(ch)
            && ch == ','
            && matches!(next_significant(&chars, i), Some('}' | ']'))
        {
            continue;
        }
        out.push(ch);
    }
    out
}

fn is_word_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
