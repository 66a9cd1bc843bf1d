//! Repetition combinators.

use command_grammar_core::{ArgsCursor, CommandSource, ParseContext, ParseError};

use super::Element;

/// Parses the child exactly N times, sequentially. No partial-success
/// recovery: the first failing repetition propagates.
#[derive(Debug)]
pub struct Repeated {
    inner: Box<Element>,
    count: usize,
}

impl Repeated {
    pub fn new(inner: impl Into<Element>, count: usize) -> Self {
        Self {
            inner: Box::new(inner.into()),
            count,
        }
    }

    pub(super) fn parse(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        for _ in 0..self.count {
            self.inner.parse(source, cursor, ctx)?;
        }
        Ok(())
    }

    pub(super) fn complete(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Vec<String> {
        let mut out = Vec::new();
        for _ in 0..self.count {
            let cursor_snap = cursor.snapshot();
            let ctx_snap = ctx.snapshot();
            out.extend(self.inner.complete(source, cursor, ctx));
            cursor.restore(&cursor_snap, true);
            ctx.restore(&ctx_snap);

            match self.inner.parse(source, cursor, ctx) {
                Ok(()) if cursor.has_next() => {}
                _ => break,
            }
        }
        out
    }

    pub(super) fn usage(&self) -> String {
        format!("{} (x{})", self.inner.usage(), self.count)
    }
}

/// Parses the child repeatedly until the cursor is exhausted.
#[derive(Debug)]
pub struct AllRemaining {
    inner: Box<Element>,
}

impl AllRemaining {
    pub fn new(inner: impl Into<Element>) -> Self {
        Self {
            inner: Box::new(inner.into()),
        }
    }

    pub(super) fn parse(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        while cursor.has_next() {
            let before = cursor.consumed();
            self.inner.parse(source, cursor, ctx)?;
            // A child that consumes nothing would never drain the cursor.
            if cursor.consumed() == before {
                break;
            }
        }
        Ok(())
    }

    pub(super) fn complete(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Vec<String> {
        let mut out = Vec::new();
        while cursor.has_next() {
            let cursor_snap = cursor.snapshot();
            let ctx_snap = ctx.snapshot();
            out.extend(self.inner.complete(source, cursor, ctx));
            cursor.restore(&cursor_snap, true);
            ctx.restore(&ctx_snap);

            let before = cursor.consumed();
            match self.inner.parse(source, cursor, ctx) {
                Ok(()) if cursor.has_next() && cursor.consumed() > before => {}
                _ => break,
            }
        }
        out
    }

    pub(super) fn usage(&self) -> String {
        format!("{}...", self.inner.usage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::testutil::{completion_cursor, cursor, Console};
    use crate::element::{Choice, ValueArg};
    use command_grammar_core::ArgValue;

    #[test]
    fn test_repeated_exact_count() {
        let rep = Repeated::new(ValueArg::int("coords"), 3);
        let mut c = cursor("10 64 -30");
        let mut ctx = ParseContext::new();
        rep.parse(&Console, &mut c, &mut ctx).unwrap();
        let coords: Vec<i64> = ctx
            .get_all("coords")
            .iter()
            .filter_map(ArgValue::as_int)
            .collect();
        assert_eq!(coords, [10, 64, -30]);
    }

    #[test]
    fn test_repeated_too_few_fails() {
        let rep = Repeated::new(ValueArg::int("coords"), 3);
        let mut c = cursor("10 64");
        let mut ctx = ParseContext::new();
        assert!(rep.parse(&Console, &mut c, &mut ctx).is_err());
    }

    #[test]
    fn test_all_remaining_drains_cursor() {
        let all = AllRemaining::new(ValueArg::string("words"));
        let mut c = cursor("lots of words here");
        let mut ctx = ParseContext::new();
        all.parse(&Console, &mut c, &mut ctx).unwrap();
        assert_eq!(ctx.get_all("words").len(), 4);
        assert!(!c.has_next());
    }

    #[test]
    fn test_all_remaining_accepts_empty() {
        let all = AllRemaining::new(ValueArg::string("words"));
        let mut c = cursor("");
        let mut ctx = ParseContext::new();
        all.parse(&Console, &mut c, &mut ctx).unwrap();
        assert!(!ctx.contains("words"));
    }

    #[test]
    fn test_all_remaining_completion_offers_candidates_each_round() {
        let colors = || vec!["red".to_string(), "green".to_string(), "blue".to_string()];
        let all = AllRemaining::new(Choice::new(
            "colors",
            colors,
            |name| Some(ArgValue::Str(name.to_string())),
        ));
        let mut c = completion_cursor("red gr");
        let mut ctx = ParseContext::new();
        assert_eq!(all.complete(&Console, &mut c, &mut ctx), vec!["green"]);
    }
}
