//! Optional elements, in strong and weak flavors.

use command_grammar_core::{ArgValue, ArgsCursor, CommandSource, ParseContext, ParseError};

use super::Element;

/// An element that may be absent.
///
/// With no input left, an optional binds its default value (when both a
/// key and a default are configured) and succeeds without consuming.
///
/// The two flavors differ in how a child *failure* is handled when input
/// remains, and both are deliberate, distinct behaviors:
///
/// - **weak** — always swallows the failure and rewinds.
/// - **strong** — swallows the failure only when more input remains after
///   the failure point ("there's more to parse, so this wasn't meant for
///   us"). Note that this heuristic is order-sensitive: a genuine mistake
///   in the optional argument is silently skipped whenever unrelated
///   trailing tokens follow it. Faithful to the original behavior.
#[derive(Debug)]
pub struct Optional {
    inner: Box<Element>,
    key: Option<String>,
    default: Option<ArgValue>,
    weak: bool,
}

impl Optional {
    /// Strong optional: child failures propagate at end-of-input.
    pub fn strong(inner: impl Into<Element>) -> Self {
        Self {
            inner: Box::new(inner.into()),
            key: None,
            default: None,
            weak: false,
        }
    }

    /// Weak optional: child failures are always swallowed.
    pub fn weak(inner: impl Into<Element>) -> Self {
        Self {
            inner: Box::new(inner.into()),
            key: None,
            default: None,
            weak: true,
        }
    }

    /// Binds `value` under `key` when the optional is skipped for lack of
    /// input.
    pub fn with_default(mut self, key: &str, value: ArgValue) -> Self {
        self.key = Some(key.to_string());
        self.default = Some(value);
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub(super) fn parse(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        if !cursor.has_next() {
            if let (Some(key), Some(default)) = (&self.key, &self.default) {
                ctx.put_one(key.clone(), default.clone());
            }
            return Ok(());
        }

        let cursor_snap = cursor.snapshot();
        let ctx_snap = ctx.snapshot();
        match self.inner.parse(source, cursor, ctx) {
            Ok(()) => Ok(()),
            Err(err) => {
                if self.weak || cursor.has_next() {
                    cursor.restore(&cursor_snap, true);
                    ctx.restore(&ctx_snap);
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    pub(super) fn complete(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Vec<String> {
        self.inner.complete(source, cursor, ctx)
    }

    pub(super) fn usage(&self) -> String {
        format!("[{}]", self.inner.usage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::testutil::{cursor, Console};
    use crate::element::ValueArg;

    #[test]
    fn test_no_input_binds_default() {
        let opt = Optional::strong(ValueArg::int("amount")).with_default("amount", ArgValue::Int(1));
        let mut c = cursor("");
        let mut ctx = ParseContext::new();
        opt.parse(&Console, &mut c, &mut ctx).unwrap();
        assert_eq!(ctx.require_single("amount").unwrap(), &ArgValue::Int(1));
    }

    #[test]
    fn test_no_input_without_default_binds_nothing() {
        let opt = Optional::strong(ValueArg::int("amount"));
        let mut c = cursor("");
        let mut ctx = ParseContext::new();
        opt.parse(&Console, &mut c, &mut ctx).unwrap();
        assert!(!ctx.contains("amount"));
    }

    #[test]
    fn test_weak_never_raises_never_advances() {
        let opt = Optional::weak(ValueArg::int("amount"));
        let mut c = cursor("definitely not a number");
        let mut ctx = ParseContext::new();
        opt.parse(&Console, &mut c, &mut ctx).unwrap();
        assert_eq!(c.consumed(), 0);
        assert!(!ctx.contains("amount"));
    }

    #[test]
    fn test_strong_propagates_at_end_of_input() {
        let opt = Optional::strong(ValueArg::int("amount"));
        let mut c = cursor("five");
        let mut ctx = ParseContext::new();
        assert!(opt.parse(&Console, &mut c, &mut ctx).is_err());
    }

    #[test]
    fn test_strong_swallows_when_more_input_follows() {
        let opt = Optional::strong(ValueArg::int("amount"));
        let mut c = cursor("five more");
        let mut ctx = ParseContext::new();
        opt.parse(&Console, &mut c, &mut ctx).unwrap();
        assert_eq!(c.consumed(), 0);
    }

    #[test]
    fn test_matching_input_is_consumed() {
        let opt = Optional::strong(ValueArg::int("amount"));
        let mut c = cursor("42");
        let mut ctx = ParseContext::new();
        opt.parse(&Console, &mut c, &mut ctx).unwrap();
        assert_eq!(ctx.require_single("amount").unwrap(), &ArgValue::Int(42));
    }

    #[test]
    fn test_usage_brackets_inner() {
        let opt = Optional::strong(ValueArg::int("amount"));
        assert_eq!(opt.usage(), "[<amount>]");
    }
}
