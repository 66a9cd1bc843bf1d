//! Commands built from a grammar element tree.

use std::sync::Arc;

use command_grammar_core::{
    ArgsCursor, CommandHandler, CommandSource, DispatchError, ExecutionResult, ParseContext,
    ParseError, QuotedTokenizer, Token, Tokenizer,
};

use crate::element::Element;

/// Executes a command against an already-parsed argument context.
///
/// Implemented for any matching closure, so most commands are defined
/// inline; the sub-command element implements it too, which is how
/// routing folds into the grammar.
pub trait Executor: Send + Sync {
    fn execute(
        &self,
        source: &dyn CommandSource,
        ctx: &ParseContext,
    ) -> Result<ExecutionResult, DispatchError>;
}

impl<F> Executor for F
where
    F: Fn(&dyn CommandSource, &ParseContext) -> Result<ExecutionResult, DispatchError>
        + Send
        + Sync,
{
    fn execute(
        &self,
        source: &dyn CommandSource,
        ctx: &ParseContext,
    ) -> Result<ExecutionResult, DispatchError> {
        self(source, ctx)
    }
}

/// A command defined by a grammar element tree plus an executor.
///
/// Processing an argument line means: permission check, strict quoted
/// tokenization, a full parse of the element tree (leftover tokens are an
/// error), then the executor against the populated context. Suggestion
/// requests run the same grammar in completion mode over a lenient
/// tokenization instead.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{CommandSource, DispatchError, ExecutionResult, ParseContext};
/// use command_grammar_engine::{CommandSpec, Element, Sequence, ValueArg};
///
/// let spec = CommandSpec::new(
///     Sequence::new(vec![
///         ValueArg::string("player").into(),
///         ValueArg::int("amount").into(),
///     ]),
///     |_source: &dyn CommandSource, ctx: &ParseContext| {
///         let player = ctx.require_single("player").map_err(|e| DispatchError::Execution(e.to_string()))?;
///         assert_eq!(player.as_str(), Some("bob"));
///         Ok(ExecutionResult::success())
///     },
/// );
/// assert_eq!(spec.render_usage(), "<player> <amount>");
/// ```
pub struct CommandSpec {
    element: Element,
    executor: Arc<dyn Executor>,
    description: Option<String>,
    help: Option<String>,
    permission: Option<String>,
}

impl CommandSpec {
    /// A command from a root element and an executor.
    pub fn new(element: impl Into<Element>, executor: impl Executor + 'static) -> Self {
        Self {
            element: element.into(),
            executor: Arc::new(executor),
            description: None,
            help: None,
            permission: None,
        }
    }

    /// Sets the one-line description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the multi-line help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Requires a permission node; sources lacking it are refused before
    /// any parsing happens.
    pub fn with_permission(mut self, node: &str) -> Self {
        self.permission = Some(node.to_string());
        self
    }

    /// The root element of the grammar.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Renders the usage string from the element tree.
    pub fn render_usage(&self) -> String {
        self.element.usage()
    }

    /// Tokenizes and parses an argument line, returning the populated
    /// context without executing. Useful for inspection tools and tests.
    pub fn parse_line(
        &self,
        source: &dyn CommandSource,
        args: &str,
    ) -> Result<ParseContext, ParseError> {
        let tokens = QuotedTokenizer::new()
            .tokenize(args, false)
            .map_err(|e| ParseError::from_tokenize(args, e))?;
        let mut cursor = ArgsCursor::new(args, tokens);
        let mut ctx = ParseContext::new();
        self.element
            .parse(source, &mut cursor, &mut ctx)
            .map_err(|e| e.ensure_usage(self.element.usage()))?;
        if cursor.has_next() {
            return Err(ParseError::new(
                args,
                cursor.offset(),
                format!("too many arguments: {}", cursor.remaining_raw()),
            )
            .ensure_usage(self.element.usage()));
        }
        Ok(ctx)
    }
}

impl CommandHandler for CommandSpec {
    fn process(
        &self,
        source: &dyn CommandSource,
        args: &str,
    ) -> Result<ExecutionResult, DispatchError> {
        if let Some(node) = &self.permission {
            if !source.has_permission(node) {
                return Err(DispatchError::PermissionDenied);
            }
        }
        let ctx = self.parse_line(source, args)?;
        self.executor.execute(source, &ctx)
    }

    fn suggest(&self, source: &dyn CommandSource, args: &str) -> Vec<String> {
        if let Some(node) = &self.permission {
            if !source.has_permission(node) {
                return Vec::new();
            }
        }
        let Ok(mut tokens) = QuotedTokenizer::for_completion().tokenize(args, true) else {
            return Vec::new();
        };
        if tokens.is_empty() {
            // An empty remainder means the alias was followed by a space:
            // completion targets the (empty) first argument.
            tokens.push(Token::new("", args.len(), args.len()));
        }
        let mut cursor = ArgsCursor::new(args, tokens);
        let mut ctx = ParseContext::new();
        let mut out: Vec<String> = Vec::new();
        for candidate in self.element.complete(source, &mut cursor, &mut ctx) {
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
        out
    }

    fn short_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    fn usage(&self) -> String {
        self.element.usage()
    }

    fn parse_args(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Option<Result<(), ParseError>> {
        Some(
            self.element
                .parse(source, cursor, ctx)
                .map_err(|e| e.ensure_usage(self.element.usage())),
        )
    }

    fn execute_parsed(
        &self,
        source: &dyn CommandSource,
        ctx: &ParseContext,
    ) -> Option<Result<ExecutionResult, DispatchError>> {
        Some(self.executor.execute(source, ctx))
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("element", &self.element)
            .field("description", &self.description)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Literal, Optional, Sequence, ValueArg};
    use command_grammar_core::ArgValue;
    use std::sync::Mutex;

    struct Recorder {
        messages: Mutex<Vec<String>>,
        permitted: bool,
    }

    impl Recorder {
        fn new(permitted: bool) -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
                permitted,
            }
        }
    }

    impl CommandSource for Recorder {
        fn send_message(&self, text: &str) {
            self.messages.lock().unwrap().push(text.to_string());
        }

        fn has_permission(&self, _node: &str) -> bool {
            self.permitted
        }
    }

    fn spec() -> CommandSpec {
        CommandSpec::new(
            Sequence::new(vec![
                Literal::word("give").into(),
                ValueArg::string("player").into(),
                Optional::strong(ValueArg::int("amount"))
                    .with_default("amount", ArgValue::Int(1))
                    .into(),
            ]),
            |_source: &dyn CommandSource, ctx: &ParseContext| {
                let amount = ctx
                    .require_single("amount")
                    .map_err(|e| DispatchError::Execution(e.to_string()))?;
                if amount.as_int() == Some(0) {
                    return Err(DispatchError::Execution("zero amount".into()));
                }
                Ok(ExecutionResult::success())
            },
        )
        .with_description("Gives an item")
        .with_permission("demo.give")
    }

    #[test]
    fn test_process_runs_executor() {
        let source = Recorder::new(true);
        let result = spec().process(&source, "give bob 5").unwrap();
        assert!(result.is_success());
    }

    #[test]
    fn test_process_applies_default() {
        let source = Recorder::new(true);
        let ctx = spec().parse_line(&source, "give bob").unwrap();
        assert_eq!(ctx.require_single("amount").unwrap(), &ArgValue::Int(1));
    }

    #[test]
    fn test_permission_checked_before_parsing() {
        let source = Recorder::new(false);
        let err = spec().process(&source, "not even valid").unwrap_err();
        assert_eq!(err, DispatchError::PermissionDenied);
    }

    #[test]
    fn test_leftover_tokens_are_an_error() {
        let source = Recorder::new(true);
        let err = spec().process(&source, "give bob 5 extra").unwrap_err();
        let DispatchError::Parse(parse) = err else {
            panic!("expected parse error");
        };
        assert!(parse.message().contains("too many arguments"));
        assert_eq!(parse.usage(), Some("give <player> [<amount>]"));
    }

    #[test]
    fn test_executor_failure_propagates() {
        let source = Recorder::new(true);
        let err = spec().process(&source, "give bob 0").unwrap_err();
        assert!(matches!(err, DispatchError::Execution(_)));
    }

    #[test]
    fn test_suggest_empty_args_offers_first_element() {
        let source = Recorder::new(true);
        assert_eq!(spec().suggest(&source, ""), vec!["give"]);
    }

    #[test]
    fn test_suggest_denied_source_sees_nothing() {
        let source = Recorder::new(false);
        assert!(spec().suggest(&source, "").is_empty());
    }
}
