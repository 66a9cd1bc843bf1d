//! Single-value leaf elements.

use command_grammar_core::{ArgValue, ArgsCursor, ParseContext, ParseError, Token};

use super::matches_prefix;

/// Converts one token into an [`ArgValue`], or explains why it can't.
pub type ValueParser = dyn Fn(&Token) -> Result<ArgValue, String> + Send + Sync;

/// Supplies completion candidates for a partially-typed value.
pub type SuggestionSupplier = dyn Fn(&str) -> Vec<String> + Send + Sync;

/// A leaf element that consumes exactly one token and stores the parsed
/// value under its binding key.
///
/// # Examples
///
/// ```
/// use command_grammar_engine::ValueArg;
///
/// let amount = ValueArg::int("amount");
/// assert_eq!(amount.usage(), "<amount>");
/// ```
pub struct ValueArg {
    key: String,
    placeholder: String,
    parser: Box<ValueParser>,
    suggestions: Option<Box<SuggestionSupplier>>,
}

impl ValueArg {
    /// A leaf with a custom token parser.
    pub fn custom(
        key: &str,
        parser: impl Fn(&Token) -> Result<ArgValue, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.to_string(),
            placeholder: key.to_string(),
            parser: Box::new(parser),
            suggestions: None,
        }
    }

    /// Accepts any token as a string value.
    pub fn string(key: &str) -> Self {
        Self::custom(key, |token| Ok(ArgValue::Str(token.text.clone())))
    }

    /// Accepts a whole number.
    pub fn int(key: &str) -> Self {
        Self::custom(key, |token| {
            token
                .text
                .parse::<i64>()
                .map(ArgValue::Int)
                .map_err(|_| format!("not a whole number: {}", token.text))
        })
    }

    /// Accepts a decimal number.
    pub fn float(key: &str) -> Self {
        Self::custom(key, |token| {
            token
                .text
                .parse::<f64>()
                .map(ArgValue::Float)
                .map_err(|_| format!("not a number: {}", token.text))
        })
    }

    /// Accepts `true`/`false`/`yes`/`no`, case-insensitively.
    pub fn boolean(key: &str) -> Self {
        let mut leaf = Self::custom(key, |token| {
            match token.text.to_ascii_lowercase().as_str() {
                "true" | "yes" => Ok(ArgValue::Bool(true)),
                "false" | "no" => Ok(ArgValue::Bool(false)),
                _ => Err(format!("not a yes/no value: {}", token.text)),
            }
        });
        leaf.suggestions = Some(Box::new(|_| {
            vec!["true".into(), "false".into(), "yes".into(), "no".into()]
        }));
        leaf
    }

    /// Overrides the `<placeholder>` shown in usage strings (defaults to
    /// the binding key).
    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    /// Attaches a completion candidate supplier.
    pub fn with_suggestions(
        mut self,
        supplier: impl Fn(&str) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.suggestions = Some(Box::new(supplier));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(super) fn parse(
        &self,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        let offset = cursor.offset();
        let token = cursor.next().map_err(|_| {
            ParseError::new(
                cursor.raw(),
                offset,
                format!("missing argument <{}>", self.placeholder),
            )
        })?;
        let value =
            (self.parser)(&token).map_err(|msg| ParseError::new(cursor.raw(), token.start, msg))?;
        ctx.put_one(self.key.clone(), value);
        Ok(())
    }

    pub(super) fn complete(&self, cursor: &mut ArgsCursor) -> Vec<String> {
        if cursor.remaining().len() != 1 {
            return Vec::new();
        }
        let partial = cursor.peek().map(|t| t.text.clone()).unwrap_or_default();
        match &self.suggestions {
            Some(supplier) => supplier(&partial)
                .into_iter()
                .filter(|candidate| matches_prefix(candidate, &partial))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn usage(&self) -> String {
        format!("<{}>", self.placeholder)
    }
}

impl std::fmt::Debug for ValueArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueArg")
            .field("key", &self.key)
            .field("placeholder", &self.placeholder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::testutil::{completion_cursor, cursor};

    #[test]
    fn test_string_leaf_stores_token_text() {
        let leaf = ValueArg::string("target");
        let mut c = cursor("\"bob the builder\"");
        let mut ctx = ParseContext::new();
        leaf.parse(&mut c, &mut ctx).unwrap();
        assert_eq!(
            ctx.require_single("target").unwrap().as_str(),
            Some("bob the builder")
        );
    }

    #[test]
    fn test_int_leaf_rejects_garbage_with_position() {
        let leaf = ValueArg::int("amount");
        let mut c = cursor("give five");
        c.next().unwrap();
        let mut ctx = ParseContext::new();
        let err = leaf.parse(&mut c, &mut ctx).unwrap_err();
        assert_eq!(err.offset(), 5);
        assert!(err.message().contains("five"));
    }

    #[test]
    fn test_missing_token_mentions_placeholder() {
        let leaf = ValueArg::string("player").with_placeholder("name");
        let mut c = cursor("");
        let mut ctx = ParseContext::new();
        let err = leaf.parse(&mut c, &mut ctx).unwrap_err();
        assert!(err.message().contains("<name>"));
    }

    #[test]
    fn test_boolean_leaf() {
        let leaf = ValueArg::boolean("silent");
        let mut ctx = ParseContext::new();
        leaf.parse(&mut cursor("YES"), &mut ctx).unwrap();
        assert_eq!(ctx.require_single("silent").unwrap(), &ArgValue::Bool(true));
    }

    #[test]
    fn test_complete_filters_supplier_candidates() {
        let leaf = ValueArg::string("world")
            .with_suggestions(|_| vec!["overworld".into(), "nether".into(), "end".into()]);

        let mut c = completion_cursor("ov");
        assert_eq!(leaf.complete(&mut c), vec!["overworld"]);

        let mut c = completion_cursor("");
        assert!(leaf.complete(&mut c).is_empty());
    }

    #[test]
    fn test_complete_without_supplier_is_silent() {
        let leaf = ValueArg::string("anything");
        let mut c = completion_cursor("par");
        assert!(leaf.complete(&mut c).is_empty());
    }
}
