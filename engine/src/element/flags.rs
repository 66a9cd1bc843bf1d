//! The `-x`/`--flag` sub-grammar.

use command_grammar_core::{
    ArgValue, ArgsCursor, CommandSource, CursorSnapshot, ParseContext, ParseError, Token,
};
use tracing::debug;

use super::{matches_prefix, Element};

/// What to do with a flag token no spec claims.
///
/// Configured independently for short and long flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFlagPolicy {
    /// Fail the parse.
    #[default]
    Error,
    /// Record boolean-true under the flag's literal name.
    AcceptNonValue,
    /// Consume the following token as the flag's value.
    AcceptValue,
    /// Leave the token untouched for the positional grammar. Only valid
    /// at the start of a short cluster; an unknown character mid-cluster
    /// is still an error.
    Ignore,
}

/// One recognized flag: a binding key, its spellings, and an optional
/// value element.
pub struct FlagSpec {
    key: String,
    short: Option<char>,
    long: Option<String>,
    value: Option<Box<Element>>,
}

impl FlagSpec {
    /// A boolean flag, spelled `--key`, recording `true` when present.
    pub fn switch(key: &str) -> Self {
        Self {
            key: key.to_string(),
            short: None,
            long: Some(key.to_ascii_lowercase()),
            value: None,
        }
    }

    /// A value-bearing flag, spelled `--key`, whose value tokens are
    /// parsed by `element` (which stores under its own binding key).
    pub fn valued(key: &str, element: impl Into<Element>) -> Self {
        Self {
            key: key.to_string(),
            short: None,
            long: Some(key.to_ascii_lowercase()),
            value: Some(Box::new(element.into())),
        }
    }

    /// Adds a short spelling.
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Replaces the long spelling, or removes it when `None`.
    pub fn with_long(mut self, long: Option<&str>) -> Self {
        self.long = long.map(|l| l.to_ascii_lowercase());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn render(&self) -> String {
        let mut spellings = Vec::new();
        if let Some(short) = self.short {
            spellings.push(format!("-{short}"));
        }
        if let Some(long) = &self.long {
            spellings.push(format!("--{long}"));
        }
        let mut rendered = spellings.join("|");
        if let Some(value) = &self.value {
            rendered.push(' ');
            rendered.push_str(&value.usage());
        }
        rendered
    }
}

impl std::fmt::Debug for FlagSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagSpec")
            .field("key", &self.key)
            .field("short", &self.short)
            .field("long", &self.long)
            .finish_non_exhaustive()
    }
}

/// Scans for flag tokens interleaved with a positional grammar.
///
/// Any token starting with `-` is a flag candidate: `--name` is a long
/// flag (`--name=value` embeds its value), `-abc` is a cluster of short
/// flags processed character by character. Recognized flags parse their
/// value tokens and are then excised from the stream, so the wrapped
/// positional element never sees them. With `anchored`, the first
/// non-flag token ends flag recognition; otherwise scanning continues
/// through the remainder.
#[derive(Debug)]
pub struct Flags {
    specs: Vec<FlagSpec>,
    unknown_short: UnknownFlagPolicy,
    unknown_long: UnknownFlagPolicy,
    anchored: bool,
    groups: Vec<Vec<String>>,
    positional: Box<Element>,
}

impl Flags {
    /// Flags wrapped around the given positional grammar.
    pub fn new(positional: impl Into<Element>) -> Self {
        Self {
            specs: Vec::new(),
            unknown_short: UnknownFlagPolicy::default(),
            unknown_long: UnknownFlagPolicy::default(),
            anchored: false,
            groups: Vec::new(),
            positional: Box::new(positional.into()),
        }
    }

    pub fn flag(mut self, spec: FlagSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Restricts flag recognition to the contiguous run at the current
    /// cursor position.
    pub fn anchored(mut self) -> Self {
        self.anchored = true;
        self
    }

    pub fn unknown_short(mut self, policy: UnknownFlagPolicy) -> Self {
        self.unknown_short = policy;
        self
    }

    pub fn unknown_long(mut self, policy: UnknownFlagPolicy) -> Self {
        self.unknown_long = policy;
        self
    }

    /// Renders the given flags (by key) together in one usage group.
    pub fn group(mut self, keys: &[&str]) -> Self {
        self.groups.push(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    fn find_long(&self, name: &str) -> Option<&FlagSpec> {
        self.specs
            .iter()
            .find(|spec| spec.long.as_deref() == Some(name))
    }

    fn find_short(&self, short: char) -> Option<&FlagSpec> {
        self.specs.iter().find(|spec| spec.short == Some(short))
    }

    fn parse_flag(
        &self,
        spec: &FlagSpec,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        match &spec.value {
            Some(element) => element.parse(source, cursor, ctx),
            None => {
                ctx.put_one(spec.key.clone(), ArgValue::Bool(true));
                Ok(())
            }
        }
    }

    fn excise(&self, cursor: &mut ArgsCursor, from: &CursorSnapshot) {
        let to = cursor.snapshot();
        debug!(
            removed = to.consumed() - from.consumed(),
            "stripping recognized flag tokens"
        );
        cursor.remove_range(from, &to);
    }

    pub(super) fn parse(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Result<(), ParseError> {
        let entry = cursor.snapshot();

        while cursor.has_next() {
            let token = cursor.peek().map_err(|_| unreachable_exhausted(cursor))?.clone();
            let text = token.text.as_str();

            if let Some(body) = text.strip_prefix("--").filter(|b| !b.is_empty()) {
                let before = cursor.snapshot();
                let _ = cursor.next();
                let (name, embedded) = match body.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (body, None),
                };
                let lname = name.to_ascii_lowercase();

                match self.find_long(&lname) {
                    Some(spec) => {
                        if let Some(value) = embedded {
                            if spec.value.is_none() {
                                return Err(ParseError::new(
                                    cursor.raw(),
                                    token.start,
                                    format!("flag --{name} does not take a value"),
                                ));
                            }
                            let value_start = (token.start + 2 + name.len() + 1).min(token.end);
                            cursor.insert(Token::new(value, value_start, token.end));
                        }
                        self.parse_flag(spec, source, cursor, ctx)?;
                        self.excise(cursor, &before);
                    }
                    None => match self.unknown_long {
                        UnknownFlagPolicy::Error => {
                            return Err(ParseError::new(
                                cursor.raw(),
                                token.start,
                                format!("unknown flag --{name}"),
                            ));
                        }
                        UnknownFlagPolicy::AcceptNonValue => {
                            ctx.put_one(lname, ArgValue::Bool(true));
                            self.excise(cursor, &before);
                        }
                        UnknownFlagPolicy::AcceptValue => {
                            match embedded {
                                Some(value) => ctx.put_one(lname, ArgValue::Str(value.to_string())),
                                None => {
                                    let offset = cursor.offset();
                                    let value = cursor.next().map_err(|_| {
                                        ParseError::new(
                                            cursor.raw(),
                                            offset,
                                            format!("flag --{name} requires a value"),
                                        )
                                    })?;
                                    ctx.put_one(lname, ArgValue::Str(value.text));
                                }
                            }
                            self.excise(cursor, &before);
                        }
                        UnknownFlagPolicy::Ignore => {
                            cursor.restore(&before, true);
                            if self.anchored {
                                break;
                            }
                            let _ = cursor.next();
                        }
                    },
                }
            } else if text.len() > 1 && text.starts_with('-') {
                let before = cursor.snapshot();
                let _ = cursor.next();
                let cluster: Vec<char> = text[1..].chars().collect();
                let mut left_for_positional = false;

                for (position, &short) in cluster.iter().enumerate() {
                    match self.find_short(short) {
                        Some(spec) => self.parse_flag(spec, source, cursor, ctx)?,
                        None => match self.unknown_short {
                            UnknownFlagPolicy::Error => {
                                return Err(ParseError::new(
                                    cursor.raw(),
                                    token.start,
                                    format!("unknown flag -{short}"),
                                ));
                            }
                            UnknownFlagPolicy::AcceptNonValue => {
                                ctx.put_one(short.to_string(), ArgValue::Bool(true));
                            }
                            UnknownFlagPolicy::AcceptValue => {
                                let offset = cursor.offset();
                                let value = cursor.next().map_err(|_| {
                                    ParseError::new(
                                        cursor.raw(),
                                        offset,
                                        format!("flag -{short} requires a value"),
                                    )
                                })?;
                                ctx.put_one(short.to_string(), ArgValue::Str(value.text));
                            }
                            UnknownFlagPolicy::Ignore => {
                                if position == 0 {
                                    cursor.restore(&before, true);
                                    left_for_positional = true;
                                    break;
                                }
                                return Err(ParseError::new(
                                    cursor.raw(),
                                    token.start,
                                    format!("unknown flag -{short}"),
                                ));
                            }
                        },
                    }
                }

                if left_for_positional {
                    if self.anchored {
                        break;
                    }
                    let _ = cursor.next();
                } else {
                    self.excise(cursor, &before);
                }
            } else {
                if self.anchored {
                    break;
                }
                let _ = cursor.next();
            }
        }

        cursor.restore(&entry, false);
        self.positional.parse(source, cursor, ctx)
    }

    fn flag_name_completions(&self, partial: &str) -> Vec<String> {
        let mut out = Vec::new();
        for spec in &self.specs {
            if let Some(long) = &spec.long {
                let name = format!("--{long}");
                if matches_prefix(&name, partial) {
                    out.push(name);
                }
            }
            if let Some(short) = spec.short {
                let name = format!("-{short}");
                if matches_prefix(&name, partial) {
                    out.push(name);
                }
            }
        }
        out
    }

    /// Completion mirrors the parse scan: fully-typed recognized flags
    /// are stripped, the partial token gets flag-name candidates when it
    /// looks like a flag, a partial sitting in a value-flag's value slot
    /// gets that value element's candidates, and the positional grammar
    /// completes over the de-flagged remainder. With the cursor exhausted
    /// (no trailing space produced a partial token), flags offer nothing,
    /// so a half-typed value is never swallowed as a flag name.
    pub(super) fn complete(
        &self,
        source: &dyn CommandSource,
        cursor: &mut ArgsCursor,
        ctx: &mut ParseContext,
    ) -> Vec<String> {
        if !cursor.has_next() {
            return Vec::new();
        }

        let entry = cursor.snapshot();
        let mut out = Vec::new();

        while cursor.has_next() {
            if cursor.remaining().len() == 1 {
                let partial = cursor.peek().map(|t| t.text.clone()).unwrap_or_default();
                if partial.is_empty() || partial.starts_with('-') {
                    out.extend(self.flag_name_completions(&partial));
                }
                break;
            }

            let token = match cursor.peek() {
                Ok(token) => token.clone(),
                Err(_) => break,
            };
            let text = token.text.as_str();

            if let Some(body) = text.strip_prefix("--").filter(|b| !b.is_empty()) {
                let before = cursor.snapshot();
                let _ = cursor.next();
                let name = body.split_once('=').map_or(body, |(name, _)| name);

                match self.find_long(&name.to_ascii_lowercase()) {
                    Some(spec) => match &spec.value {
                        Some(element) if !body.contains('=') => {
                            if cursor.remaining().len() == 1 {
                                // The partial token is this flag's value.
                                out.extend(element.complete(source, cursor, ctx));
                                return out;
                            }
                            if element.parse(source, cursor, ctx).is_ok() {
                                self.excise(cursor, &before);
                            } else {
                                cursor.restore(&before, true);
                                let _ = cursor.next();
                            }
                        }
                        _ => self.excise(cursor, &before),
                    },
                    None => {
                        cursor.restore(&before, true);
                        let _ = cursor.next();
                    }
                }
            } else if text.len() > 1 && text.starts_with('-') {
                let before = cursor.snapshot();
                let _ = cursor.next();
                let mut failed = false;
                for short in text[1..].chars() {
                    match self.find_short(short) {
                        Some(spec) => {
                            if let Some(element) = &spec.value {
                                if cursor.remaining().len() == 1 {
                                    out.extend(element.complete(source, cursor, ctx));
                                    return out;
                                }
                                if element.parse(source, cursor, ctx).is_err() {
                                    failed = true;
                                    break;
                                }
                            }
                        }
                        None => {
                            failed = true;
                            break;
                        }
                    }
                }
                if failed {
                    cursor.restore(&before, true);
                    let _ = cursor.next();
                } else {
                    self.excise(cursor, &before);
                }
            } else {
                if self.anchored {
                    break;
                }
                let _ = cursor.next();
            }
        }

        cursor.restore(&entry, false);
        out.extend(self.positional.complete(source, cursor, ctx));
        out
    }

    pub(super) fn usage(&self) -> String {
        let mut rendered_keys: Vec<&str> = Vec::new();
        let mut parts = Vec::new();

        for group in &self.groups {
            let members: Vec<String> = group
                .iter()
                .filter_map(|key| self.specs.iter().find(|spec| spec.key == *key))
                .map(FlagSpec::render)
                .collect();
            if !members.is_empty() {
                rendered_keys.extend(group.iter().map(String::as_str));
                parts.push(format!("[{}]", members.join(" | ")));
            }
        }
        for spec in &self.specs {
            if !rendered_keys.contains(&spec.key.as_str()) {
                parts.push(format!("[{}]", spec.render()));
            }
        }

        let positional = self.positional.usage();
        if !positional.is_empty() {
            parts.push(positional);
        }
        parts.join(" ")
    }
}

// has_next() was checked; peek cannot fail here.
fn unreachable_exhausted(cursor: &ArgsCursor) -> ParseError {
    ParseError::new(cursor.raw(), cursor.offset(), "cursor exhausted")
}
