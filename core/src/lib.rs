//! Core data model for the command grammar engine.
//!
//! This crate defines the foundational types the grammar and dispatch
//! layers are built on:
//!
//! - [`Token`] — a positioned slice of the raw input line.
//! - [`Tokenizer`] implementations ([`RawTokenizer`], [`SpaceTokenizer`],
//!   [`QuotedTokenizer`]) — strategies for producing tokens.
//! - [`ArgsCursor`] — sequential, backtrackable access to a token list
//!   with snapshot/restore.
//! - [`ParseContext`] — the multi-valued parsed-argument store, also with
//!   snapshot/restore.
//! - [`CommandHandler`] / [`CommandMapping`] / [`CommandSource`] — the
//!   contract between a dispatcher and the commands registered in it.
//! - Error types: [`TokenizeError`], [`ParseError`] (positioned, with
//!   `^`-pointer rendering), [`DispatchError`], [`RegisterError`].
//!
//! # Example
//!
//! ```
//! use command_grammar_core::{ArgsCursor, ParseContext, ArgValue, QuotedTokenizer, Tokenizer};
//!
//! let tokens = QuotedTokenizer::new().tokenize("give \"iron sword\" 5", false).unwrap();
//! let mut cursor = ArgsCursor::new("give \"iron sword\" 5", tokens);
//!
//! let mut ctx = ParseContext::new();
//! cursor.next().unwrap(); // "give"
//! ctx.put_one("item", ArgValue::Str(cursor.next().unwrap().text));
//! ctx.put_one("amount", ArgValue::Int(cursor.next().unwrap().text.parse().unwrap()));
//!
//! assert_eq!(ctx.require_single("item").unwrap().as_str(), Some("iron sword"));
//! assert_eq!(ctx.require_single("amount").unwrap().as_int(), Some(5));
//! ```

mod context;
mod cursor;
mod error;
mod handler;
mod token;
mod tokenize;

pub use context::{ArgValue, ContextError, ContextSnapshot, ParseContext};
pub use cursor::{ArgsCursor, CursorSnapshot, Exhausted};
pub use error::{DispatchError, ParseError, RegisterError};
pub use handler::{CommandHandler, CommandMapping, CommandSource, ExecutionResult};
pub use token::Token;
pub use tokenize::{QuotedTokenizer, RawTokenizer, SpaceTokenizer, TokenizeError, Tokenizer};
