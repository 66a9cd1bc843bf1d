//! Fixed keyword matching.

use command_grammar_core::{ArgValue, ArgsCursor, ParseContext, ParseError};

use super::matches_prefix;

/// Matches a fixed sequence of expected tokens, case-insensitively.
///
/// On success the element binds its fixed associated value (when one is
/// configured), never the matched text.
///
/// # Examples
///
/// ```
/// use command_grammar_engine::Literal;
///
/// let lit = Literal::new(&["region", "flag"]);
/// assert_eq!(lit.usage(), "region flag");
/// ```
#[derive(Debug, Clone)]
pub struct Literal {
    expected: Vec<String>,
    binding: Option<(String, ArgValue)>,
}

impl Literal {
    /// Matches the given token sequence.
    pub fn new(words: &[&str]) -> Self {
        Self {
            expected: words.iter().map(|w| w.to_string()).collect(),
            binding: None,
        }
    }

    /// Matches a single keyword.
    pub fn word(word: &str) -> Self {
        Self::new(&[word])
    }

    /// Binds `value` under `key` when the keywords match.
    pub fn with_value(mut self, key: &str, value: ArgValue) -> Self {
        self.binding = Some((key.to_string(), value));
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.binding.as_ref().map(|(k, _)| k.as_str())
    }

    pub(super) fn parse(
        &self,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        for expected in &self.expected {
            let offset = cursor.offset();
            let token = cursor
                .next()
                .map_err(|_| ParseError::new(cursor.raw(), offset, format!("expected {expected}")))?;
            if !token.text.eq_ignore_ascii_case(expected) {
                return Err(ParseError::new(
                    cursor.raw(),
                    token.start,
                    format!("expected {expected}, found {}", token.text),
                ));
            }
        }
        if let Some((key, value)) = &self.binding {
            ctx.put_one(key.clone(), value.clone());
        }
        Ok(())
    }

    pub(super) fn complete(&self, cursor: &mut ArgsCursor) -> Vec<String> {
        let mut out = Vec::new();
        for expected in &self.expected {
            if !cursor.has_next() {
                return out;
            }
            if cursor.remaining().len() == 1 {
                let partial = cursor.peek().map(|t| t.text.clone()).unwrap_or_default();
                if matches_prefix(expected, &partial) {
                    out.push(expected.clone());
                }
                return out;
            }
            match cursor.next() {
                Ok(token) if token.text.eq_ignore_ascii_case(expected) => {}
                _ => return out,
            }
        }
        out
    }

    pub fn usage(&self) -> String {
        self.expected.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::testutil::{completion_cursor, cursor};

    #[test]
    fn test_parse_matches_case_insensitively() {
        let lit = Literal::new(&["Set", "flag"]);
        let mut c = cursor("set FLAG");
        let mut ctx = ParseContext::new();
        lit.parse(&mut c, &mut ctx).unwrap();
        assert!(!c.has_next());
    }

    #[test]
    fn test_parse_reports_failing_word() {
        let lit = Literal::new(&["set", "flag"]);
        let mut c = cursor("set blag");
        let mut ctx = ParseContext::new();
        let err = lit.parse(&mut c, &mut ctx).unwrap_err();
        assert_eq!(err.offset(), 4);
        assert!(err.message().contains("expected flag"));
    }

    #[test]
    fn test_parse_exhausted_reports_expected_word() {
        let lit = Literal::new(&["set", "flag"]);
        let mut c = cursor("set");
        let mut ctx = ParseContext::new();
        let err = lit.parse(&mut c, &mut ctx).unwrap_err();
        assert!(err.message().contains("expected flag"));
        assert_eq!(err.offset(), 3);
    }

    #[test]
    fn test_binds_fixed_value_not_matched_text() {
        let lit = Literal::word("ON").with_value("state", ArgValue::Bool(true));
        let mut c = cursor("on");
        let mut ctx = ParseContext::new();
        lit.parse(&mut c, &mut ctx).unwrap();
        assert_eq!(ctx.require_single("state").unwrap(), &ArgValue::Bool(true));
    }

    #[test]
    fn test_complete_offers_next_expected_word() {
        let lit = Literal::new(&["region", "flag"]);

        let mut c = completion_cursor("reg");
        assert_eq!(lit.complete(&mut c), vec!["region"]);

        let mut c = completion_cursor("region ");
        assert_eq!(lit.complete(&mut c), vec!["flag"]);

        let mut c = completion_cursor("nothing ");
        assert!(lit.complete(&mut c).is_empty());
    }
}
