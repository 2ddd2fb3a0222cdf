//! The parser: grammar, settings and the parse entry points.
//!
//! A [`Parser`] owns the long-lived grammar (flag registry and command
//! tree) and one mutable parse session. Grammar is declared up front with
//! [`register`](Parser::register) and [`command`](Parser::command); then any
//! of the parse entry points consume a token vector.
//!
//! # Example
//!
//! ```
//! use flagwright::{Flag, Parser};
//!
//! let mut parser = Parser::builder().posix(true).build();
//! parser.register(Flag::new("debug").short('d').standalone()).unwrap();
//! parser.register(Flag::new("level").short('l')).unwrap();
//!
//! assert!(parser.parse(["-dl", "info"]));
//! assert_eq!(parser.get_bool("debug"), Ok(true));
//! assert_eq!(parser.value("level").as_deref(), Some("info"));
//! ```

mod engine;
mod query;
pub(crate) mod resolve;

use std::fmt;
use std::sync::Arc;

use flagwright_input::{EnvReader, PromptSecret, RealEnv, SecretSource};

use crate::bind::BindTarget;
use crate::command::{string_to_path, Command, CommandContext, CommandTree};
use crate::depends;
use crate::error::{ConfigError, ParseError};
use crate::flag::{Flag, FlagKey};
use crate::registry::FlagRegistry;
use crate::secure::{self, SecureInputs};
use crate::session::Session;
use crate::settings::Settings;
use crate::tokens::TokenStream;
use crate::value::{comma_delimiter, split_chain, Delimiter};

use engine::Engine;
use resolve::finalize;

/// Builder for [`Parser`].
///
/// ```
/// use flagwright::{MockEnv, Parser};
///
/// let parser = Parser::builder()
///     .posix(true)
///     .max_depth(4)
///     .env_prefix("APP")
///     .env_reader(MockEnv::new().with_var("APP_VERBOSE", "true"))
///     .chain_delimiter(|c| c == ';')
///     .build();
///
/// assert!(parser.settings().posix);
/// assert_eq!(parser.settings().max_depth, 4);
/// ```
pub struct ParserBuilder {
    settings: Settings,
    env: Option<Arc<dyn EnvReader>>,
    secrets: Option<Box<dyn SecretSource>>,
    delimiter: Delimiter,
}

impl ParserBuilder {
    fn new() -> Self {
        Self {
            settings: Settings::default(),
            env: None,
            secrets: None,
            delimiter: comma_delimiter(),
        }
    }

    /// Enable POSIX short-flag grouping (`-abc`).
    pub fn posix(mut self, enabled: bool) -> Self {
        self.settings.posix = enabled;
        self
    }

    /// Characters that introduce flags. An empty set keeps the default `-`.
    pub fn prefixes(mut self, prefixes: impl IntoIterator<Item = char>) -> Self {
        let prefixes: Vec<char> = prefixes.into_iter().collect();
        if !prefixes.is_empty() {
            self.settings.prefixes = prefixes;
        }
        self
    }

    /// Maximum command-tree depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.settings.max_depth = depth;
        self
    }

    /// Maximum dependency recursion depth.
    pub fn dependency_depth(mut self, depth: usize) -> Self {
        self.settings.dependency_depth = depth;
        self
    }

    /// Run command callbacks as soon as their command is complete.
    pub fn eager_callbacks(mut self, eager: bool) -> Self {
        self.settings.eager_callbacks = eager;
        self
    }

    /// Derive an environment variable name (`PREFIX_PATH_NAME`) for every
    /// flag without an explicit one.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.env_prefix = Some(prefix.into());
        self
    }

    /// Where environment variables are read from.
    pub fn env_reader<R: EnvReader + 'static>(mut self, reader: R) -> Self {
        self.env = Some(Arc::new(reader));
        self
    }

    /// Where secure flag values come from. Defaults to a terminal prompt.
    pub fn secret_source<S: SecretSource + 'static>(mut self, source: S) -> Self {
        self.secrets = Some(Box::new(source));
        self
    }

    /// Which characters separate the items of `Chained` values.
    pub fn chain_delimiter<F>(mut self, f: F) -> Self
    where
        F: Fn(char) -> bool + Send + Sync + 'static,
    {
        self.delimiter = Arc::new(f);
        self
    }

    pub fn build(self) -> Parser {
        Parser {
            settings: self.settings,
            registry: FlagRegistry::new(),
            tree: CommandTree::new(),
            env: self.env.unwrap_or_else(|| Arc::new(RealEnv)),
            secrets: self
                .secrets
                .unwrap_or_else(|| Box::new(PromptSecret::new())),
            delimiter: self.delimiter,
            session: Session::default(),
        }
    }
}

/// Flag and command parser.
///
/// One parse may be in flight at a time. Resolved values, errors,
/// recognized commands and positionals accumulate across parses until
/// [`clear`](Parser::clear) is called.
pub struct Parser {
    settings: Settings,
    registry: FlagRegistry,
    tree: CommandTree,
    env: Arc<dyn EnvReader>,
    secrets: Box<dyn SecretSource>,
    delimiter: Delimiter,
    session: Session,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// A parser with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    // ========================================================================
    // Grammar
    // ========================================================================

    /// Register a flag. Its scope is whatever [`Flag::scope`] set.
    pub fn register(&mut self, flag: Flag) -> Result<(), ConfigError> {
        self.registry.register(flag, self.settings.posix).map(|_| ())
    }

    /// Register a flag scoped to a command path.
    pub fn register_scoped(&mut self, path: &str, mut flag: Flag) -> Result<(), ConfigError> {
        flag.set_path(path);
        self.register(flag)
    }

    /// Register a top-level command and its subtree.
    pub fn command(&mut self, command: Command) -> Result<(), ConfigError> {
        self.tree.register(command, self.settings.max_depth)
    }

    /// Register a command subtree under an existing path.
    pub fn command_under(&mut self, parent: &str, command: Command) -> Result<(), ConfigError> {
        self.tree
            .register_under(parent, command, self.settings.max_depth)
    }

    /// Replace a registered flag, keeping its position.
    pub fn redefine(&mut self, flag: Flag) -> Result<(), ConfigError> {
        self.registry.redefine(flag, self.settings.posix).map(|_| ())
    }

    /// Remove a flag from the grammar.
    pub fn remove_flag(&mut self, key: impl Into<FlagKey>) -> Result<Flag, ConfigError> {
        let key = key.into();
        self.registry
            .remove(&key)
            .ok_or_else(|| ConfigError::UnknownFlag {
                key: key.to_string(),
            })
    }

    /// Look up a flag by long name under `path`, falling back to globals.
    pub fn lookup(&self, name: &str, path: &str) -> Option<&Flag> {
        self.registry.lookup(name, path)
    }

    /// Look up a flag by short name under `path`, falling back to globals.
    pub fn lookup_short(&self, short: &str, path: &str) -> Option<&Flag> {
        self.registry.lookup_short(short, path)
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse a token vector. Returns `true` when no hard error was recorded.
    ///
    /// Parsing does not stop at the first error. After a failed parse the
    /// option map still holds every value that was resolved successfully;
    /// values that failed a check are never stored.
    pub fn parse<I, S>(&mut self, args: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(TokenStream::new(args), Vec::new())
    }

    /// Parse a raw command line, split with shell quoting rules.
    pub fn parse_str(&mut self, line: &str) -> bool {
        match shell_words::split(line) {
            Ok(args) => self.parse(args),
            Err(e) => {
                self.session.begin();
                self.session.error(ParseError::Tokenize {
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Parse with defaults for flags the input leaves out.
    ///
    /// Keys that name no registered flag are ignored.
    pub fn parse_with_defaults<I, S, D, K, V>(&mut self, args: I, defaults: D) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        D: IntoIterator<Item = (K, V)>,
        K: Into<FlagKey>,
        V: Into<String>,
    {
        let defaults = defaults
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.run(TokenStream::new(args), defaults)
    }

    /// Parse the process arguments, minus the program name.
    pub fn parse_env(&mut self) -> bool {
        self.parse(std::env::args().skip(1))
    }

    fn run(&mut self, stream: TokenStream, defaults: Vec<(FlagKey, String)>) -> bool {
        self.session.begin();
        tracing::debug!(tokens = stream.len(), "parse started");

        Engine::new(
            &self.settings,
            &self.registry,
            &self.tree,
            self.env.as_ref(),
            &self.delimiter,
            &mut self.session,
            stream,
        )
        .run();

        self.apply_defaults(defaults);
        self.check_required();

        self.session.warnings = depends::validate(
            &self.registry,
            &self.session.options,
            self.settings.dependency_depth,
        );

        if self.session.errors.is_empty() {
            self.resolve_secure();
        } else {
            self.session.secure = Default::default();
        }
        if self.session.errors.is_empty() {
            self.assign_bound_defaults();
        }

        let ok = self.session.errors.is_empty();
        tracing::debug!(
            ok,
            errors = self.session.errors.len(),
            warnings = self.session.warnings.len(),
            "parse finished"
        );
        ok
    }

    fn apply_defaults(&mut self, defaults: Vec<(FlagKey, String)>) {
        for (key, value) in defaults {
            let Some(flag) = self.registry.get(&key) else {
                tracing::warn!(flag = %key, "default given for unknown flag");
                continue;
            };
            if flag.is_secure() {
                if !self.session.secure.contains(&key) {
                    self.session.secure.seed(key, value);
                }
                continue;
            }
            if self.session.options.contains_key(&key) {
                continue;
            }
            match finalize(flag, &key.to_string(), None, &value, &self.delimiter) {
                Ok(resolved) => {
                    if let Some(path) = resolved.file_path {
                        self.session.file_paths.insert(key.clone(), path);
                    }
                    self.session.store(key, resolved.value);
                }
                Err(err) => self.session.error(err),
            }
        }
    }

    /// Whether flags scoped to `path` are in play for this parse.
    fn scope_active(&self, path: &str) -> bool {
        scope_active(&self.session, path)
    }

    fn check_required(&mut self) {
        let mut missing = Vec::new();
        for flag in self.registry.flags() {
            if !flag.is_required() || flag.is_secure() || !self.scope_active(flag.path()) {
                continue;
            }
            let key = flag.key();
            let present = self.session.options.contains_key(&key)
                || (0..flag.slot_capacity().max(0) as usize)
                    .any(|i| self.session.options.contains_key(&key.slot(i)));
            if !present && flag.default_value().is_none() {
                missing.push(key);
            }
        }
        for key in missing {
            self.session.error(ParseError::MissingRequired {
                flag: key.to_string(),
            });
        }
    }

    fn resolve_secure(&mut self) {
        let candidates = std::mem::take(&mut self.session.secure);
        let session = &self.session;
        let (resolved, errors) = secure::process(
            &self.registry,
            candidates,
            |path| scope_active(session, path),
            SecureInputs {
                secrets: self.secrets.as_ref(),
                env_prefix: self.settings.env_prefix.as_deref(),
                delimiter: &self.delimiter,
            },
        );

        for (key, value) in resolved.values {
            if let Some(path) = value.file_path {
                self.session.file_paths.insert(key.clone(), path);
            }
            self.session.secure_keys.insert(key.clone());
            self.session.store(key, value.value);
        }
        for err in errors {
            self.session.error(err);
        }
    }

    fn assign_bound_defaults(&mut self) {
        let mut failures = Vec::new();
        for flag in self.registry.flags() {
            let (Some(binding), Some(default)) = (flag.binding(), flag.default_value()) else {
                continue;
            };
            if self.session.options.contains_key(&flag.key()) {
                continue;
            }
            let split = |s: &str| split_chain(s, self.delimiter.as_ref());
            if let Err(reason) = BindTarget::assign(binding.as_ref(), default, &split) {
                failures.push(ParseError::InvalidValue {
                    flag: flag.key().to_string(),
                    value: default.to_string(),
                    reason,
                });
            }
        }
        for err in failures {
            self.session.error(err);
        }
    }
}

fn scope_active(session: &Session, path: &str) -> bool {
    path.is_empty()
        || session.commands.iter().any(|c| {
            c == path
                || c.strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with(crate::command::PATH_SEPARATOR))
        })
}

/// Snapshot handed to a command callback.
pub(crate) fn command_context(session: &Session, path: &str) -> CommandContext {
    CommandContext {
        command_path: string_to_path(path),
        options: session.options.clone(),
        positionals: session
            .positionals
            .iter()
            .map(|p| p.value().to_string())
            .collect(),
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("settings", &self.settings)
            .field("flags", &self.registry.len())
            .field("commands", &self.tree.len())
            .field("secrets", &self.secrets.name())
            .field("session", &self.session)
            .finish()
    }
}
