//! Ordered alternation.

use command_grammar_core::{ArgsCursor, CommandSource, ParseContext, ParseError};

use super::Element;

/// Tries each child in order from a shared snapshot; the first child that
/// parses wins and its cursor/context effects are committed. When every
/// child fails, the *last* observed error is re-raised. List order is
/// significant and determines precedence when several children could
/// match.
#[derive(Debug)]
pub struct FirstMatching {
    children: Vec<Element>,
}

impl FirstMatching {
    pub fn new(children: Vec<Element>) -> Self {
        Self { children }
    }

    pub(super) fn parse(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        let cursor_snap = cursor.snapshot();
        let ctx_snap = ctx.snapshot();
        let mut last_err = None;

        for child in &self.children {
            cursor.restore(&cursor_snap, true);
            ctx.restore(&ctx_snap);
            match child.parse(source, cursor, ctx) {
                Ok(()) => return Ok(()),
                Err(err) => last_err = Some(err),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ParseError::new(cursor.raw(), cursor.offset(), "no matching alternative")
        }))
    }

    pub(super) fn complete(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Vec<String> {
        let cursor_snap = cursor.snapshot();
        let ctx_snap = ctx.snapshot();
        let mut out = Vec::new();

        for child in &self.children {
            cursor.restore(&cursor_snap, true);
            ctx.restore(&ctx_snap);
            out.extend(child.complete(source, cursor, ctx));
        }
        cursor.restore(&cursor_snap, true);
        ctx.restore(&ctx_snap);
        out
    }

    pub(super) fn usage(&self) -> String {
        let parts: Vec<String> = self.children.iter().map(Element::usage).collect();
        parts.join("|")
    }
}
