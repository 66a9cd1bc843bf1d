//! Grammar element tree, flags sub-grammar, and alias dispatch.
//!
//! This crate turns the primitives of `command-grammar-core` into a
//! composable command engine:
//!
//! - [`Element`] — the closed set of grammar element variants
//!   ([`Literal`], [`ValueArg`], [`Sequence`], [`Optional`], [`Repeated`],
//!   [`AllRemaining`], [`FirstMatching`], [`Choice`], [`Flags`],
//!   [`SubCommand`]), each supporting parse, completion, and usage
//!   rendering.
//! - [`CommandSpec`] — a command defined by a root element plus an
//!   [`Executor`], satisfying the `CommandHandler` contract.
//! - [`Dispatcher`] — the alias registry with normalization,
//!   cross-owner disambiguation, and the outer execution entry point
//!   that renders failures as messages.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use command_grammar_core::{ArgValue, CommandSource, DispatchError, ExecutionResult, ParseContext};
//! use command_grammar_engine::{CommandSpec, Dispatcher, Optional, Sequence, ValueArg};
//!
//! struct Console;
//! impl CommandSource for Console {
//!     fn send_message(&self, text: &str) {
//!         println!("{text}");
//!     }
//! }
//!
//! let dispatcher = Dispatcher::new();
//! let greet = CommandSpec::new(
//!     Sequence::new(vec![
//!         ValueArg::string("name").into(),
//!         Optional::strong(ValueArg::int("times"))
//!             .with_default("times", ArgValue::Int(1))
//!             .into(),
//!     ]),
//!     |_source: &dyn CommandSource, ctx: &ParseContext| {
//!         let times = ctx
//!             .require_single("times")
//!             .map_err(|e| DispatchError::Execution(e.to_string()))?;
//!         assert_eq!(times.as_int(), Some(3));
//!         Ok(ExecutionResult::success())
//!     },
//! )
//! .with_description("Greets a player");
//! dispatcher
//!     .register("demo", Arc::new(greet), &["greet", "hello"], None)
//!     .unwrap();
//!
//! let result = dispatcher.process(&Console, "greet bob 3").unwrap();
//! assert!(result.is_success());
//! assert_eq!(dispatcher.suggest(&Console, "gr"), vec!["greet"]);
//! ```

mod command;
mod dispatch;
mod element;

pub use command::{CommandSpec, Executor};
pub use dispatch::{Disambiguator, Dispatcher};
pub use element::{
    AllRemaining, Choice, Element, FirstMatching, FlagSpec, Flags, Literal, Optional, Repeated,
    Sequence, SubCommand, UnknownFlagPolicy, ValueArg,
};
