//! Alias registration, lookup, and command routing.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use command_grammar_core::{
    CommandHandler, CommandMapping, CommandSource, DispatchError, ExecutionResult, RegisterError,
};
use tracing::{debug, error, warn};

/// Policy selecting one mapping when an alias is registered ambiguously.
pub type Disambiguator =
    dyn Fn(Option<&dyn CommandSource>, &str, &[Arc<CommandMapping>]) -> Arc<CommandMapping>
        + Send
        + Sync;

#[derive(Default)]
struct Registry {
    /// Lower-cased alias (bare and `owner:alias`) → mappings. One alias
    /// may map to several mappings when owners collide.
    aliases: HashMap<String, Vec<Arc<CommandMapping>>>,
    /// Owner key → every mapping that owner registered.
    owners: HashMap<String, Vec<Arc<CommandMapping>>>,
}

/// The alias registry and command router.
///
/// Registration and removal serialize on an internal lock, so concurrent
/// owners cannot corrupt the alias bookkeeping; lookups take the shared
/// side of the same lock. A dispatcher itself implements
/// [`CommandHandler`], so dispatchers nest to arbitrary depth.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use command_grammar_core::{CommandSource, ExecutionResult, ParseContext};
/// use command_grammar_engine::{CommandSpec, Dispatcher, ValueArg};
///
/// let dispatcher = Dispatcher::new();
/// let spec = CommandSpec::new(
///     ValueArg::string("target"),
///     |_source: &dyn CommandSource, ctx: &ParseContext| {
///         assert!(ctx.require_single("target").is_ok());
///         Ok(ExecutionResult::success())
///     },
/// );
/// dispatcher
///     .register("core", Arc::new(spec), &["poke"], None)
///     .unwrap();
///
/// let mapping = dispatcher.get("poke", None).unwrap();
/// assert_eq!(mapping.primary_alias(), "poke");
/// assert_eq!(mapping.owner(), "core");
/// ```
pub struct Dispatcher {
    registry: RwLock<Registry>,
    disambiguator: Box<Disambiguator>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// A dispatcher with the default disambiguator: prefer the candidate
    /// whose primary alias equals the looked-up alias case-insensitively,
    /// else the first candidate in registration order.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            disambiguator: Box::new(
                |_source: Option<&dyn CommandSource>,
                 alias: &str,
                 candidates: &[Arc<CommandMapping>]| {
                    candidates
                        .iter()
                        .find(|mapping| mapping.primary_alias().eq_ignore_ascii_case(alias))
                        .unwrap_or(&candidates[0])
                        .clone()
                },
            ),
        }
    }

    /// Replaces the disambiguation policy.
    pub fn with_disambiguator(
        mut self,
        disambiguator: impl Fn(Option<&dyn CommandSource>, &str, &[Arc<CommandMapping>]) -> Arc<CommandMapping>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.disambiguator = Box::new(disambiguator);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        // A poisoned lock only means another thread panicked mid-update
        // of plain maps; the data itself stays usable.
        self.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `handler` under the given aliases for `owner`.
    ///
    /// Aliases are normalized first: lower-cased, embedded spaces
    /// stripped (both logged as warnings), duplicates and empties
    /// dropped. An alias the owner already holds fails the whole
    /// registration. The optional `filter` sees the normalized list and
    /// may return the subset to actually register; an empty result fails
    /// with [`RegisterError::NoAliases`].
    ///
    /// Every surviving alias is indexed twice: bare, and namespaced as
    /// `owner:alias`, which always resolves unambiguously.
    pub fn register(
        &self,
        owner: &str,
        handler: Arc<dyn CommandHandler>,
        aliases: &[&str],
        filter: Option<&dyn Fn(Vec<String>) -> Vec<String>>,
    ) -> Result<Arc<CommandMapping>, RegisterError> {
        let mut registry = self.write();

        let mut normalized: Vec<String> = Vec::new();
        for alias in aliases {
            let mut cleaned = alias.to_lowercase();
            if cleaned != **alias {
                warn!(alias = %alias, "alias lower-cased during registration");
            }
            if cleaned.contains(' ') {
                warn!(alias = %alias, "embedded spaces stripped from alias");
                cleaned.retain(|c| c != ' ');
            }
            if !cleaned.is_empty() && !normalized.contains(&cleaned) {
                normalized.push(cleaned);
            }
        }

        if let Some(existing) = registry.owners.get(owner) {
            for alias in &normalized {
                if existing.iter().any(|m| m.aliases().contains(alias)) {
                    return Err(RegisterError::DuplicateAlias {
                        owner: owner.to_string(),
                        alias: alias.clone(),
                    });
                }
            }
        }

        if let Some(filter) = filter {
            let kept = filter(normalized.clone());
            normalized.retain(|alias| kept.contains(alias));
        }
        if normalized.is_empty() {
            return Err(RegisterError::NoAliases);
        }

        let primary = normalized[0].clone();
        let mapping = Arc::new(CommandMapping::new(
            owner,
            primary,
            normalized.iter().cloned().collect(),
            handler,
        ));

        for alias in &normalized {
            registry
                .aliases
                .entry(alias.clone())
                .or_default()
                .push(mapping.clone());
            registry
                .aliases
                .entry(format!("{owner}:{alias}"))
                .or_default()
                .push(mapping.clone());
        }
        registry
            .owners
            .entry(owner.to_string())
            .or_default()
            .push(mapping.clone());

        debug!(
            owner = owner,
            primary = %mapping.primary_alias(),
            aliases = normalized.len(),
            "registered command mapping"
        );
        Ok(mapping)
    }

    /// Removes one mapping from every alias it is indexed under. Returns
    /// whether anything was removed.
    pub fn remove(&self, mapping: &Arc<CommandMapping>) -> bool {
        let mut registry = self.write();
        let mut removed = false;
        registry.aliases.retain(|_, mappings| {
            let before = mappings.len();
            mappings.retain(|m| !Arc::ptr_eq(m, mapping));
            removed |= mappings.len() != before;
            !mappings.is_empty()
        });
        let now_empty = registry
            .owners
            .get_mut(mapping.owner())
            .map(|owned| {
                owned.retain(|m| !Arc::ptr_eq(m, mapping));
                owned.is_empty()
            })
            .unwrap_or(false);
        if now_empty {
            registry.owners.remove(mapping.owner());
        }
        removed
    }

    /// Removes every mapping an owner registered. Returns how many were
    /// removed.
    pub fn remove_owner(&self, owner: &str) -> usize {
        let mut registry = self.write();
        let mappings = registry.owners.remove(owner).unwrap_or_default();
        for mapping in &mappings {
            registry.aliases.retain(|_, list| {
                list.retain(|m| !Arc::ptr_eq(m, mapping));
                !list.is_empty()
            });
        }
        mappings.len()
    }

    /// Resolves an alias to a mapping, invoking the disambiguator when
    /// several mappings share it.
    pub fn get(
        &self,
        alias: &str,
        source: Option<&dyn CommandSource>,
    ) -> Option<Arc<CommandMapping>> {
        let registry = self.read();
        let candidates = registry.aliases.get(&alias.to_lowercase())?;
        match candidates.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            many => Some((self.disambiguator)(source, alias, many)),
        }
    }

    /// Every registered alias key, bare and namespaced, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let registry = self.read();
        let mut out: Vec<String> = registry.aliases.keys().cloned().collect();
        out.sort();
        out
    }

    /// The mappings an owner has registered.
    pub fn owner_mappings(&self, owner: &str) -> Vec<Arc<CommandMapping>> {
        self.read().owners.get(owner).cloned().unwrap_or_default()
    }

    /// `(primary alias, short description)` for every registered mapping,
    /// sorted by alias.
    pub fn describe(&self) -> Vec<(String, Option<String>)> {
        let registry = self.read();
        let mut seen: Vec<*const CommandMapping> = Vec::new();
        let mut out = Vec::new();
        for mappings in registry.owners.values() {
            for mapping in mappings {
                let ptr = Arc::as_ptr(mapping);
                if !seen.contains(&ptr) {
                    seen.push(ptr);
                    out.push((
                        mapping.primary_alias().to_string(),
                        mapping.handler().short_description().map(str::to_string),
                    ));
                }
            }
        }
        out.sort();
        out
    }

    /// The usage string of the command registered under `alias`.
    pub fn usage_of(&self, alias: &str) -> Option<String> {
        self.get(alias, None).map(|m| m.handler().usage())
    }

    /// The help text of the command registered under `alias`.
    pub fn help_of(&self, alias: &str) -> Option<String> {
        self.get(alias, None)
            .and_then(|m| m.handler().help().map(str::to_string))
    }

    /// Resolves the first token of `line` and delegates the rest to the
    /// resolved handler.
    pub fn process(
        &self,
        source: &dyn CommandSource,
        line: &str,
    ) -> Result<ExecutionResult, DispatchError> {
        let line = line.trim_start();
        let (first, rest) = split_first(line);
        if first.is_empty() {
            return Err(DispatchError::UnknownCommand(String::new()));
        }
        let mapping = self
            .get(first, Some(source))
            .ok_or_else(|| DispatchError::UnknownCommand(first.to_string()))?;
        debug!(alias = first, owner = mapping.owner(), "dispatching command");
        mapping.handler().process(source, rest)
    }

    /// Completion candidates for a partially-typed line: alias
    /// completions while the first token is still being typed, the
    /// resolved handler's suggestions afterwards.
    pub fn suggest(&self, source: &dyn CommandSource, line: &str) -> Vec<String> {
        let line = line.trim_start();
        if !line.contains(' ') {
            let prefix = line.to_lowercase();
            let registry = self.read();
            let mut out: Vec<String> = registry
                .aliases
                .keys()
                .filter(|alias| alias.starts_with(&prefix))
                .cloned()
                .collect();
            out.sort();
            return out;
        }
        let (first, rest) = split_first(line);
        match self.get(first, Some(source)) {
            Some(mapping) => mapping.handler().suggest(source, rest),
            None => Vec::new(),
        }
    }

    /// The outer execution entry point: runs
    /// [`process`](Dispatcher::process) and renders every failure as
    /// messages to the source instead of returning an error. Handler
    /// panics are contained here, logged, and reported as internal
    /// errors; they never propagate to the caller.
    pub fn dispatch(&self, source: &dyn CommandSource, line: &str) -> ExecutionResult {
        let alias = split_first(line.trim_start()).0.to_string();
        match catch_unwind(AssertUnwindSafe(|| self.process(source, line))) {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                self.report(source, &alias, err);
                ExecutionResult::failure()
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(command = %alias, detail = %detail, "command handler panicked");
                source.send_message("An internal error occurred while executing this command.");
                ExecutionResult::failure()
            }
        }
    }

    fn report(&self, source: &dyn CommandSource, alias: &str, err: DispatchError) {
        match err {
            DispatchError::UnknownCommand(name) => {
                if name.is_empty() {
                    source.send_message("Unknown command.");
                } else {
                    source.send_message(&format!("Unknown command: {name}"));
                }
            }
            DispatchError::PermissionDenied => {
                source.send_message("You do not have permission to use this command.");
            }
            DispatchError::Parse(parse) => {
                source.send_message(parse.message());
                for line in parse.annotated_position().lines() {
                    source.send_message(line);
                }
                if let Some(usage) = parse.usage() {
                    source.send_message(&format!("Usage: /{alias} {usage}"));
                }
            }
            DispatchError::Execution(detail) => {
                error!(command = alias, detail = %detail, "command execution failed");
                source.send_message(&format!(
                    "An internal error occurred while executing this command: {detail}"
                ));
            }
        }
    }
}

impl CommandHandler for Dispatcher {
    fn process(
        &self,
        source: &dyn CommandSource,
        args: &str,
    ) -> Result<ExecutionResult, DispatchError> {
        Dispatcher::process(self, source, args)
    }

    fn suggest(&self, source: &dyn CommandSource, args: &str) -> Vec<String> {
        Dispatcher::suggest(self, source, args)
    }

    fn usage(&self) -> String {
        "<subcommand>".to_string()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.read();
        f.debug_struct("Dispatcher")
            .field("aliases", &registry.aliases.len())
            .field("owners", &registry.owners.len())
            .finish_non_exhaustive()
    }
}

fn split_first(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((first, rest)) => (first, rest),
        None => (line, ""),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
