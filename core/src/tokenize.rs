//! Tokenizer strategies for raw input lines.
//!
//! Three interchangeable strategies turn a raw line into positioned
//! [`Token`]s:
//!
//! - [`RawTokenizer`] — the whole line as a single token.
//! - [`SpaceTokenizer`] — split on literal spaces, collapsing runs.
//! - [`QuotedTokenizer`] — a hand-written scanner supporting single and
//!   double quotes plus backslash escapes.
//!
//! All strategies record exact byte offsets into the original line so
//! parse errors can point back at the user's input.

use thiserror::Error;

use crate::token::Token;

/// Tokenization failures.
///
/// Only the quoted tokenizer can fail, and only in strict mode; leniency
/// converts both cases into best-effort recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A quote was opened but never closed.
    #[error("unterminated {quote} quote starting at column {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
    /// The line ended directly after a backslash.
    #[error("dangling escape at column {offset}")]
    DanglingEscape { offset: usize },
}

impl TokenizeError {
    /// Byte offset into the raw line where the problem begins.
    pub fn offset(&self) -> usize {
        match self {
            TokenizeError::UnterminatedQuote { offset, .. } => *offset,
            TokenizeError::DanglingEscape { offset } => *offset,
        }
    }
}

/// A strategy for splitting a raw line into tokens.
///
/// `lenient` requests best-effort recovery from malformed input (used
/// during completion probing, where a half-typed quote is expected, not
/// exceptional).
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, raw: &str, lenient: bool) -> Result<Vec<Token>, TokenizeError>;
}

/// Produces the entire line as one token, verbatim.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{RawTokenizer, Tokenizer};
///
/// let tokens = RawTokenizer.tokenize("say hello world", false).unwrap();
/// assert_eq!(tokens.len(), 1);
/// assert_eq!(tokens[0].text, "say hello world");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTokenizer;

impl Tokenizer for RawTokenizer {
    fn tokenize(&self, raw: &str, _lenient: bool) -> Result<Vec<Token>, TokenizeError> {
        Ok(vec![Token::new(raw, 0, raw.len())])
    }
}

/// Splits on literal spaces, collapsing consecutive spaces.
///
/// Returns an empty list for empty or all-space input. Quoting is not
/// interpreted.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{SpaceTokenizer, Tokenizer};
///
/// let tokens = SpaceTokenizer.tokenize("a  bc   d", false).unwrap();
/// let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
/// assert_eq!(texts, ["a", "bc", "d"]);
/// assert_eq!(tokens[1].start, 3);
/// assert_eq!(tokens[1].end, 5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceTokenizer;

impl Tokenizer for SpaceTokenizer {
    fn tokenize(&self, raw: &str, _lenient: bool) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();
        let mut start = None;
        for (i, c) in raw.char_indices() {
            if c == ' ' {
                if let Some(s) = start.take() {
                    tokens.push(Token::new(&raw[s..i], s, i));
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            tokens.push(Token::new(&raw[s..], s, raw.len()));
        }
        Ok(tokens)
    }
}

/// Hand-written scanner for quoted arguments.
///
/// Grammar: arguments are separated by whitespace; an argument is either
/// quoted (`"..."` or `'...'`, terminated by the same quote) or a bare
/// word terminated by whitespace. A backslash escapes the following code
/// point literally in both forms; there are no named escapes.
///
/// An unterminated quote is a positioned [`TokenizeError`] unless the call
/// is lenient (or [`force_lenient`](QuotedTokenizer::force_lenient) is
/// set), in which case the rest of the line becomes the token's content.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{QuotedTokenizer, Tokenizer};
///
/// let tk = QuotedTokenizer::new();
/// let tokens = tk.tokenize(r#"give "iron sword" 'to' bob\ jr"#, false).unwrap();
/// let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
/// assert_eq!(texts, ["give", "iron sword", "to", "bob jr"]);
///
/// // Strict mode rejects an open quote; lenient mode recovers.
/// assert!(tk.tokenize("say \"unfinished", false).is_err());
/// let tokens = tk.tokenize("say \"unfinished", true).unwrap();
/// assert_eq!(tokens[1].text, "unfinished");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QuotedTokenizer {
    /// Treat every call as lenient, regardless of the `lenient` argument.
    pub force_lenient: bool,
    /// Skip trailing whitespace after the final token. When disabled, a
    /// trailing space produces a trailing empty token, which completion
    /// logic reads as "the next argument starts here".
    pub trim_trailing_space: bool,
}

impl Default for QuotedTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotedTokenizer {
    /// Strict tokenizer that trims trailing whitespace.
    pub fn new() -> Self {
        Self {
            force_lenient: false,
            trim_trailing_space: true,
        }
    }

    /// Configuration used for completion probing: always lenient, and a
    /// trailing space is kept visible as an empty token.
    pub fn for_completion() -> Self {
        Self {
            force_lenient: true,
            trim_trailing_space: false,
        }
    }
}

impl Tokenizer for QuotedTokenizer {
    fn tokenize(&self, raw: &str, lenient: bool) -> Result<Vec<Token>, TokenizeError> {
        let lenient = lenient || self.force_lenient;
        let chars: Vec<(usize, char)> = raw.char_indices().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        loop {
            while i < chars.len() && chars[i].1.is_whitespace() {
                i += 1;
            }
            if i >= chars.len() {
                break;
            }

            let start = chars[i].0;
            let mut text = String::new();
            let first = chars[i].1;

            if first == '"' || first == '\'' {
                let quote = first;
                i += 1;
                let mut closed = false;
                while i < chars.len() {
                    let c = chars[i].1;
                    i += 1;
                    if c == quote {
                        closed = true;
                        break;
                    }
                    if c == '\\' {
                        if i < chars.len() {
                            text.push(chars[i].1);
                            i += 1;
                        } else if lenient {
                            text.push('\\');
                        } else {
                            return Err(TokenizeError::DanglingEscape {
                                offset: chars[i - 1].0,
                            });
                        }
                    } else {
                        text.push(c);
                    }
                }
                if !closed && !lenient {
                    return Err(TokenizeError::UnterminatedQuote {
                        quote,
                        offset: start,
                    });
                }
            } else {
                while i < chars.len() && !chars[i].1.is_whitespace() {
                    let c = chars[i].1;
                    i += 1;
                    if c == '\\' {
                        if i < chars.len() {
                            text.push(chars[i].1);
                            i += 1;
                        } else if lenient {
                            text.push('\\');
                        } else {
                            return Err(TokenizeError::DanglingEscape {
                                offset: chars[i - 1].0,
                            });
                        }
                    } else {
                        text.push(c);
                    }
                }
            }

            let end = chars.get(i).map_or(raw.len(), |(o, _)| *o);
            tokens.push(Token::new(text, start, end));
        }

        if !self.trim_trailing_space && raw.ends_with(char::is_whitespace) {
            tokens.push(Token::new("", raw.len(), raw.len()));
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn test_raw_tokenizer_single_token() {
        let tokens = RawTokenizer.tokenize("a b c", false).unwrap();
        assert_eq!(tokens, vec![Token::new("a b c", 0, 5)]);
    }

    #[test]
    fn test_space_tokenizer_collapses_runs() {
        let tokens = SpaceTokenizer.tokenize("  one   two ", false).unwrap();
        assert_eq!(texts(&tokens), ["one", "two"]);
        assert_eq!(tokens[0].start, 2);
        assert_eq!(tokens[0].end, 5);
        assert_eq!(tokens[1].start, 8);
        assert_eq!(tokens[1].end, 11);
    }

    #[test]
    fn test_space_tokenizer_blank_input() {
        assert!(SpaceTokenizer.tokenize("", false).unwrap().is_empty());
        assert!(SpaceTokenizer.tokenize("    ", false).unwrap().is_empty());
    }

    #[test]
    fn test_quoted_basic_words() {
        let tokens = QuotedTokenizer::new().tokenize("give bob sword", false).unwrap();
        assert_eq!(texts(&tokens), ["give", "bob", "sword"]);
        assert_eq!(tokens[2].start, 9);
        assert_eq!(tokens[2].end, 14);
    }

    #[test]
    fn test_quoted_strings_and_escapes() {
        let tk = QuotedTokenizer::new();
        let tokens = tk.tokenize(r#"say "hello there" 'it''s' a\ b"#, false).unwrap();
        assert_eq!(texts(&tokens), ["say", "hello there", "it", "s", "a b"]);
    }

    #[test]
    fn test_quoted_escape_inside_quotes() {
        let tokens = QuotedTokenizer::new()
            .tokenize(r#""a \"quoted\" word""#, false)
            .unwrap();
        assert_eq!(texts(&tokens), [r#"a "quoted" word"#]);
    }

    #[test]
    fn test_quoted_token_offsets_include_quotes() {
        let tokens = QuotedTokenizer::new().tokenize(r#"x "a b" y"#, false).unwrap();
        assert_eq!(tokens[1].start, 2);
        assert_eq!(tokens[1].end, 7);
    }

    #[test]
    fn test_unterminated_quote_strict() {
        let err = QuotedTokenizer::new()
            .tokenize("say \"oops", false)
            .unwrap_err();
        assert_eq!(
            err,
            TokenizeError::UnterminatedQuote {
                quote: '"',
                offset: 4
            }
        );
    }

    #[test]
    fn test_unterminated_quote_lenient_takes_rest() {
        let tokens = QuotedTokenizer::new().tokenize("say \"oops more", true).unwrap();
        assert_eq!(texts(&tokens), ["say", "oops more"]);
    }

    #[test]
    fn test_force_lenient_overrides_strict_call() {
        let tk = QuotedTokenizer {
            force_lenient: true,
            trim_trailing_space: true,
        };
        assert!(tk.tokenize("'open", false).is_ok());
    }

    #[test]
    fn test_dangling_escape() {
        let err = QuotedTokenizer::new().tokenize("abc\\", false).unwrap_err();
        assert_eq!(err, TokenizeError::DanglingEscape { offset: 3 });
        let tokens = QuotedTokenizer::new().tokenize("abc\\", true).unwrap();
        assert_eq!(texts(&tokens), ["abc\\"]);
    }

    #[test]
    fn test_trailing_space_empty_token() {
        let tk = QuotedTokenizer::for_completion();
        let tokens = tk.tokenize("give bob ", false).unwrap();
        assert_eq!(texts(&tokens), ["give", "bob", ""]);
        assert_eq!(tokens[2].start, 9);
        assert_eq!(tokens[2].end, 9);

        // The default configuration trims instead.
        let tokens = QuotedTokenizer::new().tokenize("give bob ", false).unwrap();
        assert_eq!(texts(&tokens), ["give", "bob"]);
    }

    #[test]
    fn test_rejoin_round_trip_preserves_values() {
        let tk = QuotedTokenizer::new();
        let original = r#"one "two three" fo\ ur 'five'"#;
        let first = tk.tokenize(original, false).unwrap();
        let rejoined = first
            .iter()
            .map(|t| {
                if t.text.contains(' ') {
                    format!("\"{}\"", t.text)
                } else {
                    t.text.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        let second = tk.tokenize(&rejoined, false).unwrap();
        assert_eq!(texts(&first), texts(&second));
    }
}
