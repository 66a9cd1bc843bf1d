//! The grammar element tree.
//!
//! A command's argument grammar is a tree of [`Element`] variants built
//! once when the command is defined and reused across parses. Every
//! element supports three operations against a cursor/context pair:
//!
//! - `parse` — consume zero or more tokens and populate the context, or
//!   fail with a positioned [`ParseError`]. Callers snapshot before
//!   calling when they need to backtrack.
//! - `complete` — produce candidate next tokens for a partially consumed
//!   cursor. Parse errors hit while probing are swallowed and converted
//!   into offering that branch's candidates.
//! - `usage` — render a human usage fragment (`<name>`, `[optional]`,
//!   `a|b|c`, `--flag <arg>`).
//!
//! The variant set is closed: adding an element kind extends the enum and
//! every `match` below, so the compiler enforces that parse, completion,
//! and usage stay in step.

mod choice;
mod first;
mod flags;
mod literal;
mod optional;
mod repeat;
mod sequence;
mod subcommand;
mod value;

pub use choice::Choice;
pub use first::FirstMatching;
pub use flags::{Flags, FlagSpec, UnknownFlagPolicy};
pub use literal::Literal;
pub use optional::Optional;
pub use repeat::{AllRemaining, Repeated};
pub use sequence::Sequence;
pub use subcommand::SubCommand;
pub use value::ValueArg;

use command_grammar_core::{ArgsCursor, CommandSource, ParseContext, ParseError};

/// One node of a command's argument grammar.
#[derive(Debug)]
pub enum Element {
    /// A fixed keyword sequence, matched case-insensitively.
    Literal(Literal),
    /// A leaf that parses one token into a value.
    Value(ValueArg),
    /// Children parsed in order; the first failure propagates.
    Sequence(Sequence),
    /// An element that may be absent.
    Optional(Optional),
    /// The child parsed exactly N times.
    Repeated(Repeated),
    /// The child parsed until the cursor is exhausted.
    AllRemaining(AllRemaining),
    /// Ordered alternation: the first child that parses wins.
    FirstMatching(FirstMatching),
    /// One token matched against a candidate set, exact-first then
    /// prefix-pattern.
    Choice(Choice),
    /// `-x`/`--flag` tokens interleaved with a positional grammar.
    Flags(Flags),
    /// A nested command hierarchy folded into the grammar.
    SubCommand(SubCommand),
}

impl Element {
    /// Parses tokens from `cursor` into `ctx`.
    pub fn parse(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        match self {
            Element::Literal(e) => e.parse(cursor, ctx),
            Element::Value(e) => e.parse(cursor, ctx),
            Element::Sequence(e) => e.parse(source, cursor, ctx),
            Element::Optional(e) => e.parse(source, cursor, ctx),
            Element::Repeated(e) => e.parse(source, cursor, ctx),
            Element::AllRemaining(e) => e.parse(source, cursor, ctx),
            Element::FirstMatching(e) => e.parse(source, cursor, ctx),
            Element::Choice(e) => e.parse(cursor, ctx),
            Element::Flags(e) => e.parse(source, cursor, ctx),
            Element::SubCommand(e) => e.parse(source, cursor, ctx),
        }
    }

    /// Completion candidates for the partially consumed `cursor`.
    pub fn complete(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Vec<String> {
        match self {
            Element::Literal(e) => e.complete(cursor),
            Element::Value(e) => e.complete(cursor),
            Element::Sequence(e) => e.complete(source, cursor, ctx),
            Element::Optional(e) => e.complete(source, cursor, ctx),
            Element::Repeated(e) => e.complete(source, cursor, ctx),
            Element::AllRemaining(e) => e.complete(source, cursor, ctx),
            Element::FirstMatching(e) => e.complete(source, cursor, ctx),
            Element::Choice(e) => e.complete(cursor),
            Element::Flags(e) => e.complete(source, cursor, ctx),
            Element::SubCommand(e) => e.complete(source, cursor, ctx),
        }
    }

    /// Usage fragment for this element.
    pub fn usage(&self) -> String {
        match self {
            Element::Literal(e) => e.usage(),
            Element::Value(e) => e.usage(),
            Element::Sequence(e) => e.usage(),
            Element::Optional(e) => e.usage(),
            Element::Repeated(e) => e.usage(),
            Element::AllRemaining(e) => e.usage(),
            Element::FirstMatching(e) => e.usage(),
            Element::Choice(e) => e.usage(),
            Element::Flags(e) => e.usage(),
            Element::SubCommand(e) => e.usage(),
        }
    }

    /// The binding key results are stored under, when this element binds
    /// one. Structural elements return `None`.
    pub fn key(&self) -> Option<&str> {
        match self {
            Element::Literal(e) => e.key(),
            Element::Value(e) => Some(e.key()),
            Element::Sequence(_) => None,
            Element::Optional(e) => e.key(),
            Element::Repeated(_) => None,
            Element::AllRemaining(_) => None,
            Element::FirstMatching(_) => None,
            Element::Choice(e) => Some(e.key()),
            Element::Flags(_) => None,
            Element::SubCommand(e) => Some(e.key()),
        }
    }
}

macro_rules! element_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for Element {
            fn from(e: $ty) -> Self {
                Element::$variant(e)
            }
        })*
    };
}

element_from! {
    Literal => Literal,
    Value => ValueArg,
    Sequence => Sequence,
    Optional => Optional,
    Repeated => Repeated,
    AllRemaining => AllRemaining,
    FirstMatching => FirstMatching,
    Choice => Choice,
    Flags => Flags,
    SubCommand => SubCommand,
}

/// Case-insensitive starts-with filter shared by completion paths.
pub(crate) fn matches_prefix(candidate: &str, partial: &str) -> bool {
    let mut chars = candidate.chars();
    partial
        .chars()
        .all(|p| chars.next().is_some_and(|c| c.eq_ignore_ascii_case(&p)))
}

#[cfg(test)]
pub(crate) mod testutil {
    use command_grammar_core::{ArgsCursor, CommandSource, QuotedTokenizer, Tokenizer};

    /// Source that swallows messages; element tests don't inspect output.
    pub struct Console;

    impl CommandSource for Console {
        fn send_message(&self, _text: &str) {}
    }

    /// Cursor over a strictly tokenized line.
    pub fn cursor(line: &str) -> ArgsCursor {
        let tokens = QuotedTokenizer::new().tokenize(line, false).unwrap();
        ArgsCursor::new(line, tokens)
    }

    /// Cursor tokenized the way completion probing does it: lenient, with
    /// a trailing space kept visible as an empty token.
    pub fn completion_cursor(line: &str) -> ArgsCursor {
        let tokens = QuotedTokenizer::for_completion().tokenize(line, true).unwrap();
        ArgsCursor::new(line, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_prefix_is_case_insensitive() {
        assert!(matches_prefix("Teleport", "tele"));
        assert!(matches_prefix("teleport", "TELE"));
        assert!(matches_prefix("tp", ""));
        assert!(!matches_prefix("tp", "tpa"));
        assert!(!matches_prefix("warp", "tp"));
    }
}
