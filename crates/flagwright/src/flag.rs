//! Flag definitions.
//!
//! A [`Flag`] is built with a fluent builder and handed to
//! [`Parser::register`](crate::Parser::register). Registration resolves its
//! [`FlagKind`], compiles its accepted-value patterns and validates its
//! short name and capacity.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::bind::{Bindable, BindTarget, Bound};
use crate::command::PATH_SEPARATOR;
use crate::error::ConfigError;

/// Value transform applied before or after accepted-value checking.
pub type Filter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// What kind of value a flag takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// Takes exactly one value.
    #[default]
    Single,
    /// Takes one value holding a delimited list.
    Chained,
    /// Boolean; `true` when present, optionally followed by a boolean value.
    Standalone,
    /// Takes a filesystem path; the file's content becomes the value.
    File,
}

impl FlagKind {
    /// Whether a flag of this kind needs a value token.
    pub fn takes_value(self) -> bool {
        !matches!(self, FlagKind::Standalone)
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagKind::Single => write!(f, "single"),
            FlagKind::Chained => write!(f, "chained"),
            FlagKind::Standalone => write!(f, "standalone"),
            FlagKind::File => write!(f, "file"),
        }
    }
}

/// Path-qualified flag key.
///
/// An empty path means the flag is global. Keys render as `name` for global
/// flags and `path::name` for scoped ones, and parse back from the same form:
///
/// ```
/// use flagwright::FlagKey;
///
/// let key = FlagKey::from("user create::force");
/// assert_eq!(key.path(), "user create");
/// assert_eq!(key.name(), "force");
/// assert_eq!(key.to_string(), "user create::force");
/// assert!(FlagKey::from("debug").is_global());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FlagKey {
    path: String,
    name: String,
}

impl FlagKey {
    /// Key of a global flag.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            name: name.into(),
        }
    }

    /// Key of a flag scoped to a command path.
    pub fn scoped(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: normalize_path(&path.into()),
            name: name.into(),
        }
    }

    /// The command path, empty for globals.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The flag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the key addresses a global flag.
    pub fn is_global(&self) -> bool {
        self.path.is_empty()
    }

    /// Key of indexed slot `index` of this flag (`name.index`).
    pub fn slot(&self, index: usize) -> Self {
        Self {
            path: self.path.clone(),
            name: format!("{}.{}", self.name, index),
        }
    }

    /// For a slot key (`name.N`), the base key and the index.
    pub fn split_slot(&self) -> Option<(Self, usize)> {
        let (base, index) = self.name.rsplit_once('.')?;
        let index = index.parse().ok()?;
        Some((
            Self {
                path: self.path.clone(),
                name: base.to_string(),
            },
            index,
        ))
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}::{}", self.path, self.name)
        }
    }
}

impl From<&str> for FlagKey {
    fn from(s: &str) -> Self {
        match s.rsplit_once("::") {
            Some((path, name)) => FlagKey::scoped(path, name),
            None => FlagKey::global(s),
        }
    }
}

impl From<String> for FlagKey {
    fn from(s: String) -> Self {
        FlagKey::from(s.as_str())
    }
}

impl From<&FlagKey> for FlagKey {
    fn from(k: &FlagKey) -> Self {
        k.clone()
    }
}

impl From<(&str, &str)> for FlagKey {
    fn from((path, name): (&str, &str)) -> Self {
        FlagKey::scoped(path, name)
    }
}

/// Collapse runs of whitespace so `"user  create"` and `"user create"` agree.
pub(crate) fn normalize_path(path: &str) -> String {
    path.split_whitespace()
        .collect::<Vec<_>>()
        .join(&PATH_SEPARATOR.to_string())
}

/// An accepted-value pattern with its human-readable description.
#[derive(Debug, Clone)]
pub struct AcceptedValue {
    regex: Regex,
    description: String,
}

impl AcceptedValue {
    /// Compile a pattern.
    pub fn new(pattern: &str, description: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            description: description.into(),
        })
    }

    /// Whether the value matches.
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The pattern source.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// The human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A flag definition.
///
/// # Example
///
/// ```
/// use flagwright::{Flag, FlagKind};
///
/// let level = Flag::new("level")
///     .short('l')
///     .description("Log level")
///     .default("info")
///     .accept("^(debug|info|warn|error)$", "one of debug, info, warn, error");
///
/// assert_eq!(level.kind(), FlagKind::Single);
/// assert_eq!(level.default_value(), Some("info"));
/// ```
#[derive(Clone)]
pub struct Flag {
    name: String,
    path: String,
    kind: Option<FlagKind>,
    short: Option<String>,
    description: String,
    required: bool,
    default: Option<String>,
    accepted: Vec<AcceptedValue>,
    pending_patterns: Vec<(String, String)>,
    dependencies: IndexMap<FlagKey, Vec<String>>,
    secure: Option<String>,
    pre_filter: Option<Filter>,
    post_filter: Option<Filter>,
    capacity: i64,
    env: Option<String>,
    binding: Option<Arc<dyn BindTarget>>,
}

impl Flag {
    /// Start a flag definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: String::new(),
            kind: None,
            short: None,
            description: String::new(),
            required: false,
            default: None,
            accepted: Vec::new(),
            pending_patterns: Vec::new(),
            dependencies: IndexMap::new(),
            secure: None,
            pre_filter: None,
            post_filter: None,
            capacity: 0,
            env: None,
            binding: None,
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    /// Scope the flag to a command path (`"user create"`).
    pub fn scope(mut self, path: impl Into<String>) -> Self {
        self.path = normalize_path(&path.into());
        self
    }

    /// Set the kind explicitly.
    pub fn with_kind(mut self, kind: FlagKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Shorthand for `with_kind(FlagKind::Single)`.
    pub fn single(self) -> Self {
        self.with_kind(FlagKind::Single)
    }

    /// Shorthand for `with_kind(FlagKind::Chained)`.
    pub fn chained(self) -> Self {
        self.with_kind(FlagKind::Chained)
    }

    /// Shorthand for `with_kind(FlagKind::Standalone)`.
    pub fn standalone(self) -> Self {
        self.with_kind(FlagKind::Standalone)
    }

    /// Shorthand for `with_kind(FlagKind::File)`.
    pub fn file(self) -> Self {
        self.with_kind(FlagKind::File)
    }

    /// Set the short name (`'v'` or `"v"`).
    pub fn short(mut self, short: impl Into<String>) -> Self {
        self.short = Some(short.into());
        self
    }

    /// Set the description shown by help and completion collaborators.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the flag as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a default value. Ignored for `Standalone` flags.
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Add an accepted-value pattern. The value must match at least one.
    ///
    /// The pattern is compiled at registration; an invalid pattern fails
    /// registration with [`ConfigError::InvalidPattern`].
    pub fn accept(mut self, pattern: impl Into<String>, description: impl Into<String>) -> Self {
        self.pending_patterns
            .push((pattern.into(), description.into()));
        self
    }

    /// Add an already compiled accepted-value pattern.
    pub fn accept_value(mut self, accepted: AcceptedValue) -> Self {
        self.accepted.push(accepted);
        self
    }

    /// Require a companion flag whose value is one of `values`
    /// (case-insensitive). An empty set only requires presence.
    pub fn depends_on<I, S>(mut self, companion: impl Into<FlagKey>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.insert(
            companion.into(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Require a companion flag to be present, with any value.
    pub fn requires(self, companion: impl Into<FlagKey>) -> Self {
        self.depends_on(companion, Vec::<String>::new())
    }

    /// Mark the flag secure; its value is resolved after a successful parse
    /// using `prompt`.
    pub fn secure(mut self, prompt: impl Into<String>) -> Self {
        self.secure = Some(prompt.into());
        self
    }

    /// Transform applied before accepted-value checking.
    pub fn pre_filter(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.pre_filter = Some(Arc::new(f));
        self
    }

    /// Transform applied after accepted-value checking.
    pub fn post_filter(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.post_filter = Some(Arc::new(f));
        self
    }

    /// Number of indexed slots (`--name.0` .. `--name.N-1`).
    pub fn capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Environment variable the flag's value may come from.
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    /// Bind the flag to a destination handle.
    pub fn bind<T: Bindable>(mut self, target: &Bound<T>) -> Self {
        self.binding = Some(Arc::new(target.clone()));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The flag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The command path the flag is scoped to (empty for globals).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path-qualified key.
    pub fn key(&self) -> FlagKey {
        FlagKey {
            path: self.path.clone(),
            name: self.name.clone(),
        }
    }

    /// The kind. Before registration, falls back to the binding's natural kind
    /// and then to `Single`.
    pub fn kind(&self) -> FlagKind {
        self.kind
            .or_else(|| self.binding.as_ref().map(|b| b.natural_kind()))
            .unwrap_or_default()
    }

    /// The short name.
    pub fn short_name(&self) -> Option<&str> {
        self.short.as_deref()
    }

    /// The description.
    pub fn description_text(&self) -> &str {
        &self.description
    }

    /// Whether the flag is required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The effective default. Always `None` for `Standalone` flags.
    pub fn default_value(&self) -> Option<&str> {
        if self.kind() == FlagKind::Standalone {
            None
        } else {
            self.default.as_deref()
        }
    }

    /// Compiled accepted-value patterns.
    pub fn accepted(&self) -> &[AcceptedValue] {
        &self.accepted
    }

    /// Whether a value passes the accepted-value guard.
    pub fn accepts(&self, value: &str) -> bool {
        self.accepted.is_empty() || self.accepted.iter().any(|a| a.matches(value))
    }

    /// Dependency map: companion flag to allowed values.
    pub fn dependencies(&self) -> &IndexMap<FlagKey, Vec<String>> {
        &self.dependencies
    }

    /// Whether the flag is secure.
    pub fn is_secure(&self) -> bool {
        self.secure.is_some()
    }

    /// Prompt used to resolve a secure flag.
    pub fn secure_prompt(&self) -> Option<&str> {
        self.secure.as_deref()
    }

    /// The configured slot capacity (0 when not indexed).
    pub fn slot_capacity(&self) -> i64 {
        self.capacity
    }

    /// Explicit environment variable name.
    pub fn env_var(&self) -> Option<&str> {
        self.env.as_deref()
    }

    /// The bound destination.
    pub fn binding(&self) -> Option<&Arc<dyn BindTarget>> {
        self.binding.as_ref()
    }

    pub(crate) fn pre(&self) -> Option<&Filter> {
        self.pre_filter.as_ref()
    }

    pub(crate) fn post(&self) -> Option<&Filter> {
        self.post_filter.as_ref()
    }

    // ========================================================================
    // Registration support
    // ========================================================================

    /// Resolve the kind and compile patterns. Called once at registration.
    pub(crate) fn prepare(&mut self) -> Result<(), ConfigError> {
        if self.capacity < 0 {
            return Err(ConfigError::InvalidCapacity {
                flag: self.key().to_string(),
                capacity: self.capacity,
            });
        }

        self.kind = Some(self.kind());

        let key = self.key().to_string();
        for (pattern, description) in std::mem::take(&mut self.pending_patterns) {
            let accepted = AcceptedValue::new(&pattern, description).map_err(|source| {
                ConfigError::InvalidPattern {
                    flag: key.clone(),
                    source,
                }
            })?;
            self.accepted.push(accepted);
        }

        if self.capacity > 0 {
            if let Some(binding) = &self.binding {
                binding
                    .reserve_slots(self.capacity as usize)
                    .map_err(|reason| ConfigError::Binding { flag: key, reason })?;
            }
        }

        Ok(())
    }

    pub(crate) fn clear_accepted(&mut self) {
        self.accepted.clear();
        self.pending_patterns.clear();
    }

    pub(crate) fn clear_filters(&mut self) {
        self.pre_filter = None;
        self.post_filter = None;
    }

    pub(crate) fn set_path(&mut self, path: &str) {
        self.path = normalize_path(path);
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("key", &self.key().to_string())
            .field("kind", &self.kind())
            .field("short", &self.short)
            .field("required", &self.required)
            .field("default", &self.default_value())
            .field("accepted", &self.accepted.len())
            .field("dependencies", &self.dependencies)
            .field("secure", &self.is_secure())
            .field("capacity", &self.capacity)
            .field("bound", &self.binding.as_ref().map(|b| b.type_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips_through_display() {
        let key = FlagKey::scoped("user  create", "force");
        assert_eq!(key.path(), "user create");
        assert_eq!(FlagKey::from(key.to_string()), key);
    }

    #[test]
    fn slot_keys() {
        let key = FlagKey::global("server");
        let slot = key.slot(2);
        assert_eq!(slot.name(), "server.2");
        assert_eq!(slot.split_slot(), Some((key, 2)));
        assert_eq!(FlagKey::global("a.b").split_slot(), None);
    }

    #[test]
    fn kind_defaults_to_single() {
        assert_eq!(Flag::new("x").kind(), FlagKind::Single);
    }

    #[test]
    fn kind_follows_binding() {
        let verbose = Bound::new(false);
        assert_eq!(
            Flag::new("verbose").bind(&verbose).kind(),
            FlagKind::Standalone
        );
        assert_eq!(
            Flag::new("verbose").bind(&verbose).single().kind(),
            FlagKind::Single
        );
    }

    #[test]
    fn explicit_kind_overrides_binding() {
        let verbose = Bound::new(false);
        let flag = Flag::new("verbose").bind(&verbose).with_kind(FlagKind::Chained);
        assert_eq!(flag.kind(), FlagKind::Chained);
        assert_eq!(Flag::new("config").file().kind(), FlagKind::File);
    }

    #[test]
    fn standalone_ignores_default() {
        let flag = Flag::new("debug").standalone().default("false");
        assert_eq!(flag.default_value(), None);
    }

    #[test]
    fn prepare_compiles_patterns() {
        let mut flag = Flag::new("level").accept("^(info|debug)$", "info or debug");
        flag.prepare().unwrap();
        assert!(flag.accepts("info"));
        assert!(!flag.accepts("loud"));
        assert_eq!(flag.accepted()[0].description(), "info or debug");
    }

    #[test]
    fn prepare_rejects_bad_pattern() {
        let mut flag = Flag::new("level").accept("(", "broken");
        assert!(matches!(
            flag.prepare(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn prepare_rejects_negative_capacity() {
        let mut flag = Flag::new("server").capacity(-1);
        assert!(matches!(
            flag.prepare(),
            Err(ConfigError::InvalidCapacity { capacity: -1, .. })
        ));
    }

    #[test]
    fn capacity_requires_slot_binding() {
        let name = Bound::new(String::new());
        let mut flag = Flag::new("server").capacity(2).bind(&name);
        assert!(matches!(flag.prepare(), Err(ConfigError::Binding { .. })));
    }

    #[test]
    fn no_patterns_accepts_everything() {
        assert!(Flag::new("x").accepts("anything"));
    }
}
