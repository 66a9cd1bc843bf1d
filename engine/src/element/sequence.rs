//! Ordered child composition.

use command_grammar_core::{ArgsCursor, CommandSource, ParseContext, ParseError};

use super::Element;

/// Parses its children in order. A failure in child *i* propagates
/// immediately; there is no sequence-level recovery.
#[derive(Debug)]
pub struct Sequence {
    children: Vec<Element>,
}

impl Sequence {
    pub fn new(children: Vec<Element>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(super) fn parse(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        for child in &self.children {
            child.parse(source, cursor, ctx)?;
        }
        Ok(())
    }

    /// Completion simulates parsing each prior child to reach the cursor
    /// state the next child would see, swallowing per-child parse errors:
    /// the child that fails (or that consumes the final partial token) is
    /// the one whose candidates apply.
    pub(super) fn complete(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Vec<String> {
        let mut out = Vec::new();
        for child in &self.children {
            let cursor_snap = cursor.snapshot();
            let ctx_snap = ctx.snapshot();
            out.extend(child.complete(source, cursor, ctx));
            cursor.restore(&cursor_snap, true);
            ctx.restore(&ctx_snap);

            match child.parse(source, cursor, ctx) {
                Ok(()) if cursor.has_next() => {}
                _ => break,
            }
        }
        out
    }

    pub(super) fn usage(&self) -> String {
        let parts: Vec<String> = self
            .children
            .iter()
            .map(Element::usage)
            .filter(|u| !u.is_empty())
            .collect();
        parts.join(" ")
    }
}
