//! Command hierarchies as grammar elements.

use std::sync::Arc;

use command_grammar_core::{
    ArgValue, ArgsCursor, CommandHandler, CommandMapping, CommandSource, DispatchError,
    ExecutionResult, ParseContext, ParseError, RegisterError,
};

use super::Element;
use crate::command::Executor;
use crate::dispatch::Dispatcher;

/// A grammar element wrapping a nested [`Dispatcher`], so "this command
/// has sub-commands" is expressed by composing it into a parent's element
/// tree.
///
/// Parsing consumes one token as the child alias and delegates the rest
/// of the parse to the resolved child, recording the resolved mapping in
/// the context under this element's key; the matching executor (obtained
/// from [`executor`](SubCommand::executor)) finds the mapping there and
/// routes execution to it. A fallback executor/element pair covers the
/// no-arguments and unknown-alias cases.
///
/// The element owns its nested dispatcher; the only reference back from
/// a parse result to the hierarchy is the mapping value stored in the
/// [`ParseContext`].
pub struct SubCommand {
    key: String,
    dispatcher: Dispatcher,
    fallback_executor: Option<Arc<dyn Executor>>,
    fallback_element: Option<Box<Element>>,
    fallback_on_child_failure: bool,
}

impl SubCommand {
    /// A sub-command element storing its resolved mapping under `key`.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            dispatcher: Dispatcher::new(),
            fallback_executor: None,
            fallback_element: None,
            fallback_on_child_failure: false,
        }
    }

    /// Executor to run when no child alias was given (and, combined with
    /// [`fallback_element`](SubCommand::fallback_element), when an
    /// unknown alias is to be treated as ordinary arguments).
    pub fn fallback(mut self, executor: impl Executor + 'static) -> Self {
        self.fallback_executor = Some(Arc::new(executor));
        self
    }

    /// Grammar for the fallback arguments.
    pub fn fallback_element(mut self, element: impl Into<Element>) -> Self {
        self.fallback_element = Some(Box::new(element.into()));
        self
    }

    /// Also fall back when a recognized child alias fails to parse,
    /// swallowing the child's error.
    pub fn fallback_on_child_failure(mut self) -> Self {
        self.fallback_on_child_failure = true;
        self
    }

    /// Registers a child command in the nested dispatcher.
    pub fn register(
        &self,
        owner: &str,
        handler: Arc<dyn CommandHandler>,
        aliases: &[&str],
        filter: Option<&dyn Fn(Vec<String>) -> Vec<String>>,
    ) -> Result<Arc<CommandMapping>, RegisterError> {
        self.dispatcher.register(owner, handler, aliases, filter)
    }

    /// The nested dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// An executor routing to whatever mapping this element recorded
    /// during the parse. Obtain it *before* moving the element into a
    /// grammar tree:
    ///
    /// ```
    /// use command_grammar_engine::{CommandSpec, SubCommand};
    ///
    /// let sub = SubCommand::new("action");
    /// let executor = sub.executor();
    /// let spec = CommandSpec::new(sub, executor);
    /// # let _ = spec;
    /// ```
    pub fn executor(
        &self,
    ) -> impl Fn(&dyn CommandSource, &ParseContext) -> Result<ExecutionResult, DispatchError>
    + Send
    + Sync
    + 'static
    + use<> {
        let key = self.key.clone();
        let fallback = self.fallback_executor.clone();
        move |source, ctx| route(source, ctx, &key, fallback.as_deref())
    }

    /// Executes against a context this element populated.
    pub fn execute(
        &self,
        source: &dyn CommandSource,
        ctx: &ParseContext,
    ) -> Result<ExecutionResult, DispatchError> {
        route(source, ctx, &self.key, self.fallback_executor.as_deref())
    }

    fn line_key(&self) -> String {
        format!("{}:line", self.key)
    }

    pub(super) fn parse(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        if !cursor.has_next() {
            if self.fallback_executor.is_some() {
                if let Some(element) = &self.fallback_element {
                    element.parse(source, cursor, ctx)?;
                }
                // No mapping recorded: execution will use the fallback.
                return Ok(());
            }
            return Err(ParseError::new(
                cursor.raw(),
                cursor.offset(),
                "missing subcommand",
            )
            .with_usage(self.usage()));
        }

        let cursor_snap = cursor.snapshot();
        let ctx_snap = ctx.snapshot();
        let offset = cursor.offset();
        let token = cursor
            .next()
            .map_err(|_| ParseError::new(cursor.raw(), offset, "missing subcommand"))?;

        match self.dispatcher.get(&token.text, Some(source)) {
            Some(mapping) => {
                let parsed = match mapping.handler().parse_args(source, cursor, ctx) {
                    Some(result) => result,
                    None => {
                        // An opaque string handler: keep the unparsed
                        // remainder for execution time and accept.
                        let rest = cursor.remaining_raw().to_string();
                        while cursor.next().is_ok() {}
                        ctx.put_one(self.line_key(), ArgValue::Str(rest));
                        Ok(())
                    }
                };
                match parsed {
                    Ok(()) => {
                        ctx.put_one(self.key.clone(), ArgValue::Mapping(mapping));
                        Ok(())
                    }
                    Err(err) => match &self.fallback_element {
                        Some(element) if self.fallback_on_child_failure => {
                            cursor.restore(&cursor_snap, true);
                            ctx.restore(&ctx_snap);
                            element.parse(source, cursor, ctx)
                        }
                        _ => Err(err.prefix_usage(&token.text)),
                    },
                }
            }
            None => match &self.fallback_element {
                Some(element) => {
                    cursor.restore(&cursor_snap, true);
                    ctx.restore(&ctx_snap);
                    element.parse(source, cursor, ctx)
                }
                None => Err(ParseError::new(
                    cursor.raw(),
                    token.start,
                    format!("{} is not a valid subcommand", token.text),
                )
                .with_usage(self.usage())),
            },
        }
    }

    pub(super) fn complete(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Vec<String> {
        let rest = cursor.remaining_raw().to_string();
        let mut out = self.dispatcher.suggest(source, &rest);
        if let Some(element) = &self.fallback_element {
            out.extend(element.complete(source, cursor, ctx));
        }
        out
    }

    pub(super) fn usage(&self) -> String {
        match &self.fallback_element {
            Some(element) => {
                let fallback = element.usage();
                if fallback.is_empty() {
                    "<subcommand>".to_string()
                } else {
                    format!("<subcommand>|{fallback}")
                }
            }
            None => "<subcommand>".to_string(),
        }
    }
}

fn route(
    source: &dyn CommandSource,
    ctx: &ParseContext,
    key: &str,
    fallback: Option<&dyn Executor>,
) -> Result<ExecutionResult, DispatchError> {
    match ctx.get_single(key) {
        Some(ArgValue::Mapping(mapping)) => {
            match mapping.handler().execute_parsed(source, ctx) {
                Some(result) => result,
                None => {
                    let line_key = format!("{key}:line");
                    let rest = ctx
                        .get_single(&line_key)
                        .and_then(ArgValue::as_str)
                        .unwrap_or("");
                    mapping.handler().process(source, rest)
                }
            }
        }
        _ => match fallback {
            Some(executor) => executor.execute(source, ctx),
            None => Err(DispatchError::Execution(
                "no subcommand was parsed".to_string(),
            )),
        },
    }
}

impl std::fmt::Debug for SubCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubCommand")
            .field("key", &self.key)
            .field("dispatcher", &self.dispatcher)
            .field("fallback_on_child_failure", &self.fallback_on_child_failure)
            .finish_non_exhaustive()
    }
}
