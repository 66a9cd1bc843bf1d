//! Candidate-set matching with prefix patterns.

use command_grammar_core::{ArgValue, ArgsCursor, ParseContext, ParseError};
use regex::RegexBuilder;

use super::matches_prefix;

/// Supplies the candidate key set at parse time.
pub type CandidateSupplier = dyn Fn() -> Vec<String> + Send + Sync;

/// Maps a matched candidate key to its stored value.
pub type CandidateMapper = dyn Fn(&str) -> Option<ArgValue> + Send + Sync;

/// Reads exactly one token and matches it against a candidate set.
///
/// An exact case-insensitive match always wins, and is checked before any
/// pattern interpretation so that a candidate whose name looks like a
/// pattern cannot be shadowed. Otherwise the token is compiled as a
/// case-insensitive anchored starts-with pattern and *every* matching
/// candidate's value is stored, so prefix-style input may resolve to
/// several values under the same key. A token matching no candidate is a
/// positioned error.
pub struct Choice {
    key: String,
    candidates: Box<CandidateSupplier>,
    map: Box<CandidateMapper>,
}

impl Choice {
    /// A choice over a dynamic candidate set.
    pub fn new(
        key: &str,
        candidates: impl Fn() -> Vec<String> + Send + Sync + 'static,
        map: impl Fn(&str) -> Option<ArgValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.to_string(),
            candidates: Box::new(candidates),
            map: Box::new(map),
        }
    }

    /// A choice over a fixed `name → value` table.
    pub fn of(key: &str, pairs: &[(&str, ArgValue)]) -> Self {
        let table: Vec<(String, ArgValue)> = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        let names: Vec<String> = table.iter().map(|(name, _)| name.clone()).collect();
        let lookup = table;
        Self::new(
            key,
            move || names.clone(),
            move |name| {
                lookup
                    .iter()
                    .find(|(candidate, _)| candidate == name)
                    .map(|(_, value)| value.clone())
            },
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(super) fn parse(
        &self,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        let offset = cursor.offset();
        let token = cursor.next().map_err(|_| {
            ParseError::new(cursor.raw(), offset, format!("missing argument <{}>", self.key))
        })?;
        let candidates = (self.candidates)();

        if let Some(exact) = candidates
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(&token.text))
        {
            if let Some(value) = (self.map)(exact) {
                ctx.put_one(self.key.clone(), value);
                return Ok(());
            }
        }

        let matched: Vec<&String> =
            match RegexBuilder::new(&format!("^(?:{})", token.text))
                .case_insensitive(true)
                .build()
            {
                Ok(pattern) => candidates
                    .iter()
                    .filter(|candidate| pattern.is_match(candidate))
                    .collect(),
                // A token that is not a valid pattern degrades to plain
                // prefix matching.
                Err(_) => candidates
                    .iter()
                    .filter(|candidate| matches_prefix(candidate, &token.text))
                    .collect(),
            };

        let mut stored = 0;
        for candidate in matched {
            if let Some(value) = (self.map)(candidate) {
                ctx.put_one(self.key.clone(), value);
                stored += 1;
            }
        }
        if stored == 0 {
            return Err(ParseError::new(
                cursor.raw(),
                token.start,
                format!(
                    "{} does not match any of: {}",
                    token.text,
                    candidates.join(", ")
                ),
            ));
        }
        Ok(())
    }

    pub(super) fn complete(&self, cursor: &mut ArgsCursor) -> Vec<String> {
        if cursor.remaining().len() != 1 {
            return Vec::new();
        }
        let partial = cursor.peek().map(|t| t.text.clone()).unwrap_or_default();
        (self.candidates)()
            .into_iter()
            .filter(|candidate| matches_prefix(candidate, &partial))
            .collect()
    }

    pub(super) fn usage(&self) -> String {
        (self.candidates)().join("|")
    }
}

impl std::fmt::Debug for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Choice").field("key", &self.key).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::testutil::{completion_cursor, cursor};

    fn gamemodes() -> Choice {
        Choice::of(
            "mode",
            &[
                ("survival", ArgValue::Int(0)),
                ("creative", ArgValue::Int(1)),
                ("spectator", ArgValue::Int(3)),
            ],
        )
    }

    #[test]
    fn test_exact_match_wins() {
        let choice = gamemodes();
        let mut c = cursor("CREATIVE");
        let mut ctx = ParseContext::new();
        choice.parse(&mut c, &mut ctx).unwrap();
        assert_eq!(ctx.require_single("mode").unwrap(), &ArgValue::Int(1));
    }

    #[test]
    fn test_prefix_match_returns_all_candidates() {
        let choice = gamemodes();
        let mut c = cursor("s");
        let mut ctx = ParseContext::new();
        choice.parse(&mut c, &mut ctx).unwrap();
        // "s" prefix-matches both survival and spectator.
        assert_eq!(ctx.get_all("mode"), [ArgValue::Int(0), ArgValue::Int(3)]);
    }

    #[test]
    fn test_unique_prefix_resolves_single() {
        let choice = gamemodes();
        let mut c = cursor("cre");
        let mut ctx = ParseContext::new();
        choice.parse(&mut c, &mut ctx).unwrap();
        assert_eq!(ctx.require_single("mode").unwrap(), &ArgValue::Int(1));
    }

    #[test]
    fn test_no_match_is_positioned_error() {
        let choice = gamemodes();
        let mut c = cursor("mode hardcore");
        c.next().unwrap();
        let mut ctx = ParseContext::new();
        let err = choice.parse(&mut c, &mut ctx).unwrap_err();
        assert_eq!(err.offset(), 5);
        assert!(err.message().contains("hardcore"));
        assert!(err.message().contains("survival"));
    }

    #[test]
    fn test_exact_beats_pattern_interpretation() {
        // The literal candidate "s.*" would also be a valid pattern; an
        // exact match must win before any pattern semantics apply.
        let choice = Choice::of(
            "raw",
            &[("s.*", ArgValue::Int(9)), ("survival", ArgValue::Int(0))],
        );
        let mut c = cursor("s.*");
        let mut ctx = ParseContext::new();
        choice.parse(&mut c, &mut ctx).unwrap();
        assert_eq!(ctx.require_single("raw").unwrap(), &ArgValue::Int(9));
    }

    #[test]
    fn test_complete_filters_by_prefix() {
        let choice = gamemodes();
        let mut c = completion_cursor("s");
        assert_eq!(choice.complete(&mut c), vec!["survival", "spectator"]);
        let mut c = completion_cursor("x");
        assert!(choice.complete(&mut c).is_empty());
    }

    #[test]
    fn test_usage_lists_candidates() {
        assert_eq!(gamemodes().usage(), "survival|creative|spectator");
    }
}
