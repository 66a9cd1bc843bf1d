//! Error types shared across the grammar engine.

use thiserror::Error;

use crate::tokenize::TokenizeError;

/// Width of the annotation window rendered by
/// [`ParseError::annotated_position`].
const ANNOTATION_WINDOW: usize = 80;

/// A positioned parse failure.
///
/// Carries the raw input line, the byte offset the failing element had
/// reached, a message, and optionally a pre-rendered usage string that the
/// dispatcher turns into a `Usage: /<alias> ...` line.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ParseError;
///
/// let err = ParseError::new("give bob swrod", 9, "unknown item: swrod");
/// let annotated = err.annotated_position();
/// assert_eq!(annotated, "give bob swrod\n         ^");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    line: String,
    offset: usize,
    message: String,
    usage: Option<String>,
}

impl ParseError {
    /// Creates a parse error at a byte offset into `line`.
    pub fn new(line: impl Into<String>, offset: usize, message: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            offset,
            message: message.into(),
            usage: None,
        }
    }

    /// Builds an equivalent parse error from a tokenizer failure.
    pub fn from_tokenize(line: impl Into<String>, err: TokenizeError) -> Self {
        Self::new(line, err.offset(), err.to_string())
    }

    /// Attaches a usage string, replacing any existing one.
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Attaches a usage string only when none is present yet.
    pub fn ensure_usage(mut self, usage: impl Into<String>) -> Self {
        if self.usage.is_none() {
            self.usage = Some(usage.into());
        }
        self
    }

    /// Prefixes a word (a sub-command alias) onto the attached usage
    /// string, so nested command usage composes across levels.
    pub fn prefix_usage(mut self, prefix: &str) -> Self {
        self.usage = Some(match self.usage.take() {
            Some(usage) if !usage.is_empty() => format!("{prefix} {usage}"),
            _ => prefix.to_string(),
        });
        self
    }

    /// The raw input line being parsed.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Byte offset into the line where the failure was detected.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The attached usage string, if any.
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    /// Renders the input line with a `^` pointer under the failure offset.
    ///
    /// Long lines are elided to a window around the offset, marked with
    /// `…` on the truncated side(s).
    pub fn annotated_position(&self) -> String {
        let chars: Vec<char> = self.line.chars().collect();
        let col = self.line[..self.offset.min(self.line.len())].chars().count();

        let (start, end) = if chars.len() <= ANNOTATION_WINDOW {
            (0, chars.len())
        } else {
            let start = col
                .saturating_sub(ANNOTATION_WINDOW / 2)
                .min(chars.len() - ANNOTATION_WINDOW);
            (start, start + ANNOTATION_WINDOW)
        };

        let mut snippet = String::new();
        if start > 0 {
            snippet.push('…');
        }
        snippet.extend(&chars[start..end]);
        if end < chars.len() {
            snippet.push('…');
        }

        let caret = col - start + usize::from(start > 0);
        format!("{snippet}\n{}^", " ".repeat(caret))
    }
}

/// Errors surfaced by command lookup and execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No mapping is registered under the given alias.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// The source lacks the permission the command demands.
    #[error("permission denied")]
    PermissionDenied,
    /// The argument line did not match the command's grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The handler itself failed while executing. This indicates a handler
    /// bug, not a usage error, and is reported as an internal error.
    #[error("command execution failed: {0}")]
    Execution(String),
}

/// Errors reported synchronously at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// The owner already holds a mapping under this alias.
    #[error("owner {owner} already has a command registered as {alias}")]
    DuplicateAlias { owner: String, alias: String },
    /// Normalization and filtering left nothing to register.
    #[error("no aliases left to register")]
    NoAliases,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotated_position_short_line() {
        let err = ParseError::new("tp bob", 3, "no such player");
        assert_eq!(err.annotated_position(), "tp bob\n   ^");
    }

    #[test]
    fn test_annotated_position_offset_at_end() {
        let err = ParseError::new("tp", 2, "missing argument");
        assert_eq!(err.annotated_position(), "tp\n  ^");
    }

    #[test]
    fn test_annotated_position_long_line_windows_around_offset() {
        let line: String = (0..120).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let err = ParseError::new(line.clone(), 50, "bad value");
        let annotated = err.annotated_position();
        let mut lines = annotated.lines();
        let snippet = lines.next().unwrap();
        let pointer = lines.next().unwrap();

        // Window starts at char 10, prefixed and suffixed with ellipses.
        assert!(snippet.starts_with('…'));
        assert!(snippet.ends_with('…'));
        assert_eq!(snippet.chars().count(), 82);

        // The caret lands under the char at offset 50: column 41 of the
        // snippet (50 - 10 window start + 1 ellipsis).
        assert_eq!(pointer.len(), 42);
        let expected = line.chars().nth(50).unwrap();
        assert_eq!(snippet.chars().nth(41), Some(expected));
    }

    #[test]
    fn test_annotated_position_long_line_offset_near_start() {
        let line = "x".repeat(200);
        let err = ParseError::new(line, 5, "bad");
        let snippet = err.annotated_position();
        let first = snippet.lines().next().unwrap();
        assert!(!first.starts_with('…'));
        assert!(first.ends_with('…'));
        assert!(snippet.lines().nth(1).unwrap().ends_with('^'));
    }

    #[test]
    fn test_usage_composition() {
        let err = ParseError::new("region define", 13, "missing name")
            .with_usage("<name>")
            .prefix_usage("define")
            .prefix_usage("region");
        assert_eq!(err.usage(), Some("region define <name>"));
    }

    #[test]
    fn test_ensure_usage_keeps_existing() {
        let err = ParseError::new("x", 0, "m").with_usage("<a>").ensure_usage("<b>");
        assert_eq!(err.usage(), Some("<a>"));
    }

    #[test]
    fn test_from_tokenize() {
        let tok_err = TokenizeError::UnterminatedQuote {
            quote: '"',
            offset: 4,
        };
        let err = ParseError::from_tokenize("say \"oops", tok_err);
        assert_eq!(err.offset(), 4);
        assert!(err.message().contains("unterminated"));
    }
}
