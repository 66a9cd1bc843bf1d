//! The command-handler contract and its supporting records.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::ParseContext;
use crate::cursor::ArgsCursor;
use crate::error::{DispatchError, ParseError};

/// Anything capable of issuing commands and receiving text back.
///
/// Implementations are an I/O concern of the embedding application; the
/// engine only sends messages and asks permission questions.
pub trait CommandSource: Send + Sync {
    /// Delivers a message line to the source.
    fn send_message(&self, text: &str);

    /// Whether the source holds the given permission node. Defaults to
    /// permissive, which suits consoles and tests.
    fn has_permission(&self, _node: &str) -> bool {
        true
    }

    /// Display name used in diagnostics.
    fn name(&self) -> &str {
        "console"
    }
}

/// Execution counters returned by a command invocation.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ExecutionResult;
///
/// let mut total = ExecutionResult::default();
/// total.absorb(ExecutionResult::success());
/// total.absorb(ExecutionResult::failure());
/// assert_eq!(total.processed, 2);
/// assert_eq!(total.succeeded, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Invocations processed.
    pub processed: u64,
    /// Invocations that succeeded.
    pub succeeded: u64,
}

impl ExecutionResult {
    /// One processed, one succeeded.
    pub fn success() -> Self {
        Self {
            processed: 1,
            succeeded: 1,
        }
    }

    /// One processed, none succeeded.
    pub fn failure() -> Self {
        Self {
            processed: 1,
            succeeded: 0,
        }
    }

    /// Whether every processed invocation succeeded.
    pub fn is_success(&self) -> bool {
        self.processed == self.succeeded
    }

    /// Adds another result's counters into this one.
    pub fn absorb(&mut self, other: ExecutionResult) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
    }
}

/// The capability set every registered command satisfies.
///
/// `process` and `suggest` operate on the argument line *after* the alias
/// has been split off. The remaining methods are introspection. A
/// dispatcher itself satisfies this contract, which is what enables
/// arbitrary nesting depth.
///
/// The two `Option`-returning hooks expose grammar-backed parsing to the
/// sub-command element: handlers built from an element tree return
/// `Some`, letting a parent grammar delegate full parsing and deferred
/// execution; opaque string handlers keep the `None` defaults and are
/// handed the unparsed remainder at execution time instead.
pub trait CommandHandler: Send + Sync {
    /// Parses and executes the argument line.
    fn process(
        &self,
        source: &dyn CommandSource,
        args: &str,
    ) -> Result<ExecutionResult, DispatchError>;

    /// Completion candidates for a partially-typed argument line.
    fn suggest(&self, _source: &dyn CommandSource, _args: &str) -> Vec<String> {
        Vec::new()
    }

    /// One-line description for command listings.
    fn short_description(&self) -> Option<&str> {
        None
    }

    /// Multi-line help text.
    fn help(&self) -> Option<&str> {
        None
    }

    /// Usage fragment describing the expected arguments.
    fn usage(&self) -> String {
        String::new()
    }

    /// Grammar-level parse hook: populate `ctx` from `cursor`. `None`
    /// means this handler has no grammar to delegate to.
    fn parse_args(
        &self,
        _source: &dyn CommandSource,
        _cursor: &mut ArgsCursor,
        _ctx: &mut ParseContext,
    ) -> Option<Result<(), ParseError>> {
        None
    }

    /// Grammar-level execution hook: run against an already-populated
    /// context. `None` means this handler must be invoked through
    /// [`process`](CommandHandler::process).
    fn execute_parsed(
        &self,
        _source: &dyn CommandSource,
        _ctx: &ParseContext,
    ) -> Option<Result<ExecutionResult, DispatchError>> {
        None
    }
}

/// An immutable registration record tying aliases to a handler.
///
/// The alias set holds the normalized bare aliases; the registry
/// additionally indexes each one under `owner:alias`.
#[derive(Clone)]
pub struct CommandMapping {
    owner: String,
    primary_alias: String,
    aliases: BTreeSet<String>,
    handler: Arc<dyn CommandHandler>,
}

impl CommandMapping {
    /// Creates a mapping. `primary` must be contained in `aliases`.
    pub fn new(
        owner: impl Into<String>,
        primary: impl Into<String>,
        aliases: BTreeSet<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        let primary = primary.into();
        debug_assert!(aliases.contains(&primary));
        Self {
            owner: owner.into(),
            primary_alias: primary,
            aliases,
            handler,
        }
    }

    /// The owner key this mapping was registered under.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The first-listed, preferred alias.
    pub fn primary_alias(&self) -> &str {
        &self.primary_alias
    }

    /// All normalized bare aliases, primary included.
    pub fn aliases(&self) -> &BTreeSet<String> {
        &self.aliases
    }

    /// The registered handler.
    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }
}

impl std::fmt::Debug for CommandMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandMapping")
            .field("owner", &self.owner)
            .field("primary_alias", &self.primary_alias)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}
