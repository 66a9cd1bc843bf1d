//! Sequential, backtrackable access to a token list.

use thiserror::Error;

use crate::token::Token;

/// Raised by [`ArgsCursor::next`] and [`ArgsCursor::peek`] when no token
/// remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no further arguments")]
pub struct Exhausted;

/// An immutable capture of cursor position and token list.
///
/// Restoring a snapshot always resets the position; the token list is only
/// restored on request, so an element whose side-effecting token removal
/// must survive a backtrack can rewind the position alone.
#[derive(Debug, Clone)]
pub struct CursorSnapshot {
    consumed: usize,
    tokens: Vec<Token>,
}

impl CursorSnapshot {
    /// Number of tokens that had been consumed when the snapshot was taken.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

/// A cursor over the token list produced from one raw input line.
///
/// The cursor starts *before* the first token. [`next`](ArgsCursor::next)
/// advances and returns the token it moved onto; [`peek`](ArgsCursor::peek)
/// looks at that token without advancing. The token list is mutable:
/// [`insert`](ArgsCursor::insert) splices a synthetic token in (used when a
/// flag's value is embedded as `--flag=value`) and
/// [`remove_range`](ArgsCursor::remove_range) deletes tokens consumed
/// between two snapshots (used to strip recognized flags from the stream).
///
/// # Examples
///
/// ```
/// use command_grammar_core::{ArgsCursor, QuotedTokenizer, Tokenizer};
///
/// let tokens = QuotedTokenizer::new().tokenize("a b c", false).unwrap();
/// let mut cursor = ArgsCursor::new("a b c", tokens);
///
/// assert_eq!(cursor.peek().unwrap().text, "a");
/// assert_eq!(cursor.next().unwrap().text, "a");
///
/// let snap = cursor.snapshot();
/// assert_eq!(cursor.next().unwrap().text, "b");
/// cursor.restore(&snap, false);
/// assert_eq!(cursor.next().unwrap().text, "b");
/// ```
#[derive(Debug, Clone)]
pub struct ArgsCursor {
    raw: String,
    tokens: Vec<Token>,
    consumed: usize,
}

impl ArgsCursor {
    /// Creates a cursor positioned before the first token.
    pub fn new(raw: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            raw: raw.into(),
            tokens,
            consumed: 0,
        }
    }

    /// The raw input line the tokens were produced from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the raw line ends in whitespace. Completion logic uses this
    /// to distinguish "start a new argument" from "still typing this one".
    pub fn raw_ends_with_space(&self) -> bool {
        self.raw.ends_with(char::is_whitespace)
    }

    /// Total number of tokens currently in the list.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the token list is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens already consumed.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// The unconsumed tail of the token list.
    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.consumed..]
    }

    /// Whether another token is available.
    pub fn has_next(&self) -> bool {
        self.consumed < self.tokens.len()
    }

    /// The next token, without advancing.
    pub fn peek(&self) -> Result<&Token, Exhausted> {
        self.tokens.get(self.consumed).ok_or(Exhausted)
    }

    /// Consumes and returns the next token.
    pub fn next(&mut self) -> Result<Token, Exhausted> {
        let token = self.tokens.get(self.consumed).ok_or(Exhausted)?.clone();
        self.consumed += 1;
        Ok(token)
    }

    /// Byte offset into the raw line where the next token begins, or the
    /// end of the line when no token remains. Parse errors report this.
    pub fn offset(&self) -> usize {
        self.tokens
            .get(self.consumed)
            .map_or(self.raw.len(), |t| t.start)
    }

    /// The unconsumed portion of the raw line, starting at
    /// [`offset`](ArgsCursor::offset).
    pub fn remaining_raw(&self) -> &str {
        &self.raw[self.offset().min(self.raw.len())..]
    }

    /// Splices a synthetic token in immediately after the current position,
    /// so it is the next token returned by [`next`](ArgsCursor::next).
    pub fn insert(&mut self, token: Token) {
        self.tokens.insert(self.consumed, token);
    }

    /// Deletes the tokens consumed between two snapshots (`from` earlier,
    /// `to` later), keeping the cursor on the same logical token: the
    /// position shifts left by the number of removed tokens when they lie
    /// at or before it, and pins to just before the removed range when it
    /// pointed inside the range.
    pub fn remove_range(&mut self, from: &CursorSnapshot, to: &CursorSnapshot) {
        let a = from.consumed.min(self.tokens.len());
        let b = to.consumed.min(self.tokens.len());
        if b <= a {
            return;
        }
        self.tokens.drain(a..b);
        if self.consumed >= b {
            self.consumed -= b - a;
        } else if self.consumed > a {
            self.consumed = a;
        }
    }

    /// Captures the current position and token list.
    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            consumed: self.consumed,
            tokens: self.tokens.clone(),
        }
    }

    /// Resets the position to a snapshot's; with `restore_tokens`, the
    /// token list is restored as well (a pure "give up and rewind"),
    /// otherwise mutations made since the snapshot survive.
    pub fn restore(&mut self, snapshot: &CursorSnapshot, restore_tokens: bool) {
        if restore_tokens {
            self.tokens = snapshot.tokens.clone();
        }
        self.consumed = snapshot.consumed.min(self.tokens.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(texts: &[&str]) -> ArgsCursor {
        let mut tokens = Vec::new();
        let mut offset = 0;
        for t in texts {
            tokens.push(Token::new(*t, offset, offset + t.len()));
            offset += t.len() + 1;
        }
        let raw = texts.join(" ");
        ArgsCursor::new(raw, tokens)
    }

    #[test]
    fn test_next_and_peek() {
        let mut c = cursor(&["a", "b"]);
        assert!(c.has_next());
        assert_eq!(c.peek().unwrap().text, "a");
        assert_eq!(c.next().unwrap().text, "a");
        assert_eq!(c.next().unwrap().text, "b");
        assert!(!c.has_next());
        assert_eq!(c.next(), Err(Exhausted));
        assert_eq!(c.peek(), Err(Exhausted));
    }

    #[test]
    fn test_offset_tracks_next_token() {
        let mut c = cursor(&["ab", "cd"]);
        assert_eq!(c.offset(), 0);
        c.next().unwrap();
        assert_eq!(c.offset(), 3);
        c.next().unwrap();
        assert_eq!(c.offset(), 5);
    }

    #[test]
    fn test_insert_after_current_position() {
        let mut c = cursor(&["--mode", "rest"]);
        c.next().unwrap();
        c.insert(Token::new("fast", 7, 11));
        assert_eq!(c.next().unwrap().text, "fast");
        assert_eq!(c.next().unwrap().text, "rest");
    }

    #[test]
    fn test_restore_position_only_keeps_mutations() {
        let mut c = cursor(&["a", "b", "c"]);
        let snap = c.snapshot();
        c.next().unwrap();
        c.insert(Token::new("x", 0, 0));
        c.restore(&snap, false);
        assert_eq!(c.len(), 4);
        assert_eq!(c.next().unwrap().text, "a");

        c.restore(&snap, true);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_remove_range_shifts_position_left() {
        // Tokens consumed at positions [2, 3] removed while the cursor
        // index is 5: the index must land on 3.
        let mut c = cursor(&["t0", "t1", "t2", "t3", "t4", "t5"]);
        c.next().unwrap();
        c.next().unwrap();
        let from = c.snapshot();
        c.next().unwrap();
        c.next().unwrap();
        let to = c.snapshot();
        c.next().unwrap();
        c.next().unwrap();
        assert_eq!(c.consumed(), 6);

        c.remove_range(&from, &to);
        assert_eq!(c.len(), 4);
        assert_eq!(c.consumed(), 4);
        assert!(!c.has_next());
    }

    #[test]
    fn test_remove_range_pins_inside_range() {
        let mut c = cursor(&["t0", "t1", "t2", "t3"]);
        let from = c.snapshot();
        c.next().unwrap();
        c.next().unwrap();
        c.next().unwrap();
        let to = c.snapshot();
        // Rewind into the middle of the soon-to-be-removed range.
        c.restore(&from, false);
        c.next().unwrap();
        c.remove_range(&from, &to);
        assert_eq!(c.consumed(), 0);
        assert_eq!(c.peek().unwrap().text, "t3");
    }

    #[test]
    fn test_remaining_raw() {
        let mut c = cursor(&["give", "bob"]);
        c.next().unwrap();
        assert_eq!(c.remaining_raw(), "bob");
        c.next().unwrap();
        assert_eq!(c.remaining_raw(), "");
    }
}
