//! The parsed-argument store populated during a parse.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::handler::CommandMapping;

/// A value stored in the [`ParseContext`].
///
/// The grammar's leaf elements produce one of these closed variants.
/// `Mapping` carries the command mapping a sub-command element resolved
/// during the parse, so the executor can route to it afterwards.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Mapping(Arc<CommandMapping>),
}

impl ArgValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(f) => Some(*f),
            ArgValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Arc<CommandMapping>> {
        match self {
            ArgValue::Mapping(m) => Some(m),
            _ => None,
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgValue::Bool(a), ArgValue::Bool(b)) => a == b,
            (ArgValue::Int(a), ArgValue::Int(b)) => a == b,
            (ArgValue::Float(a), ArgValue::Float(b)) => a == b,
            (ArgValue::Str(a), ArgValue::Str(b)) => a == b,
            (ArgValue::Mapping(a), ArgValue::Mapping(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Int(i) => write!(f, "{i}"),
            ArgValue::Float(v) => write!(f, "{v}"),
            ArgValue::Str(s) => f.write_str(s),
            ArgValue::Mapping(m) => f.write_str(m.primary_alias()),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

/// Failures of [`ParseContext::require_single`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// No value was stored under the key.
    #[error("missing required argument: {0}")]
    NotFound(String),
    /// More than one value was stored under the key.
    #[error("argument {0} has multiple values")]
    TooMany(String),
}

/// A capture of the context mapping for backtracking.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    values: HashMap<String, Vec<ArgValue>>,
}

/// Accumulates multi-valued parse results keyed by element binding key.
///
/// Each key holds an ordered list of zero or more values; repeated and
/// prefix-matching elements store several values under one key.
///
/// Snapshots are shallow copies: restoring one rewinds which keys hold
/// which values, but a value shared through an [`Arc`] (a resolved command
/// mapping) is the same object in every snapshot that saw it. That is a
/// deliberate tradeoff, not a bug: backtracking only needs to undo the
/// *mapping*, never the values themselves.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{ArgValue, ParseContext};
///
/// let mut ctx = ParseContext::new();
/// ctx.put_one("target", ArgValue::Str("bob".into()));
/// ctx.put_one("target", ArgValue::Str("alice".into()));
///
/// assert_eq!(ctx.get_all("target").len(), 2);
/// assert!(ctx.get_single("target").is_none()); // not exactly one
/// assert!(ctx.require_single("target").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    values: HashMap<String, Vec<ArgValue>>,
}

impl ParseContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `key`, preserving insertion order.
    pub fn put_one(&mut self, key: impl Into<String>, value: ArgValue) {
        self.values.entry(key.into()).or_default().push(value);
    }

    /// All values stored under `key`, oldest first. Empty when absent.
    pub fn get_all(&self, key: &str) -> &[ArgValue] {
        self.values.get(key).map_or(&[], Vec::as_slice)
    }

    /// The single value under `key`, or `None` unless exactly one is
    /// stored.
    pub fn get_single(&self, key: &str) -> Option<&ArgValue> {
        match self.get_all(key) {
            [one] => Some(one),
            _ => None,
        }
    }

    /// The single value under `key`, failing with
    /// [`ContextError::NotFound`] for zero values and
    /// [`ContextError::TooMany`] for several.
    pub fn require_single(&self, key: &str) -> Result<&ArgValue, ContextError> {
        match self.get_all(key) {
            [] => Err(ContextError::NotFound(key.to_string())),
            [one] => Ok(one),
            _ => Err(ContextError::TooMany(key.to_string())),
        }
    }

    /// Whether at least one value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        !self.get_all(key).is_empty()
    }

    /// Iterates over all keys and their value lists, in no particular
    /// key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ArgValue])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Captures the current mapping. O(size of the context).
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            values: self.values.clone(),
        }
    }

    /// Restores a previously captured mapping.
    pub fn restore(&mut self, snapshot: &ContextSnapshot) {
        self.values = snapshot.values.clone();
    }
}
