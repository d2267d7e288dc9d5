//! String-literal tracking shared by the JSON repair and completion passes.

/// Tracks whether a left-to-right scan is inside a double-quoted string.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StringState {
    in_string: bool,
    escaped: bool,
}

impl StringState {
    /// Advance over `ch`. Returns `true` when `ch` belongs to a string
    /// literal, including its opening and closing quotes.
    pub(crate) fn advance(&mut self, ch: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
            return true;
        }
        if ch == '"' {
            self.in_string = true;
            return true;
        }
        false
    }

    /// Whether the scan currently sits inside an unterminated string.
    pub(crate) fn in_string(&self) -> bool {
        self.in_string
    }
}

/// Closers still owed by `text`, innermost last, plus whether the text ends
/// inside a string. Mismatched closers are ignored.
pub(crate) fn open_delimiters(text: &str) -> (Vec<char>, bool) {
    let mut state = StringState::default();
    let mut stack = Vec::new();
    for ch in text.chars() {
        if state.advance(ch) {
            continue;
        }
        match ch {
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' if stack.last() == Some(&ch) => {
                stack.pop();
            }
            _ => {}
        }
    }
    (stack, state.in_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_and_escapes_are_tracked() {
        let mut state = StringState::default();
        let inside: Vec<bool> = r#"a"b\"c"d"#.chars().map(|c| state.advance(c)).collect();
        assert_eq!(
            inside,
            vec![false, true, true, true, true, true, true, false]
        );
    }

    #[test]
    fn open_delimiters_in_nesting_order() {
        let (stack, in_string) = open_delimiters(r#"{"a": [1, {"b": "}"#);
        assert_eq!(stack, vec!['}', ']', '}']);
        assert!(in_string);
    }

    #[test]
    fn balanced_text_owes_nothing() {
        let (stack, in_string) = open_delimiters(r#"{"a": "[not a bracket"}"#);
        assert!(stack.is_empty());
        assert!(!in_string);
    }
}
