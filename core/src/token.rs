//! Positioned input tokens.

use serde::{Deserialize, Serialize};

/// A single token produced by a tokenizer.
///
/// Tokens are immutable once produced. `start` and `end` are byte offsets
/// into the original raw input line, so errors discovered while parsing a
/// token can point back at the exact spot the user typed it.
///
/// # Examples
///
/// ```
/// use command_grammar_core::Token;
///
/// let token = Token::new("give", 0, 4);
/// assert_eq!(token.text, "give");
/// assert_eq!(token.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token content, with quoting and escapes already resolved.
    pub text: String,
    /// Byte offset of the first raw character belonging to this token.
    pub start: usize,
    /// Byte offset just past the last raw character belonging to this token.
    pub end: usize,
}

impl Token {
    /// Creates a token from its content and raw-input offsets.
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Length of the token content in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the token content is empty.
    ///
    /// Empty tokens appear only as the synthetic trailing token a lenient
    /// tokenizer emits after trailing whitespace, marking the spot where
    /// the next argument would begin.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_fields() {
        let token = Token::new("hello", 2, 7);
        assert_eq!(token.text, "hello");
        assert_eq!(token.start, 2);
        assert_eq!(token.end, 7);
        assert_eq!(token.len(), 5);
        assert!(!token.is_empty());
    }

    #[test]
    fn test_empty_token() {
        let token = Token::new("", 5, 5);
        assert!(token.is_empty());
        assert_eq!(token.to_string(), "");
    }
}
