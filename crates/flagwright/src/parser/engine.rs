//! The token-walking pass.
//!
//! The engine walks the [`TokenStream`] once. Each token is either a flag
//! (starts with a prefix character), the `--` terminator, or a plain token
//! that is tried as a command and otherwise kept as a positional.
//!
//! Scoped flags resolve against the context stack: the command paths
//! recognized since the last top-level command, innermost last. A flag
//! token is applied once for every scope on the stack that defines it.

use std::collections::HashMap;

use flagwright_input::{derive_var_name, EnvReader};

use crate::command::CommandTree;
use crate::error::ParseError;
use crate::flag::{FlagKey, FlagKind};
use crate::registry::FlagRegistry;
use crate::session::{Positional, Session};
use crate::settings::Settings;
use crate::tokens::TokenStream;
use crate::value::{is_numeric, parse_bool, Delimiter};

use super::command_context;
use super::resolve::finalize;

/// How a token looks before any lookup.
#[derive(Debug, PartialEq, Eq)]
enum Shape<'t> {
    Long {
        display: &'t str,
        name: &'t str,
        inline: Option<&'t str>,
    },
    Short {
        display: &'t str,
        name: &'t str,
        inline: Option<&'t str>,
    },
    EndOfFlags,
    Plain,
}

fn split_inline(body: &str) -> (&str, Option<&str>) {
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    }
}

pub(crate) struct Engine<'p> {
    pub settings: &'p Settings,
    pub registry: &'p FlagRegistry,
    pub tree: &'p CommandTree,
    pub env: &'p dyn EnvReader,
    pub delimiter: &'p Delimiter,
    pub session: &'p mut Session,
    stream: TokenStream,
    literal: bool,
    /// Spliced environment tokens, pinned to the flag they were derived from.
    pinned: HashMap<usize, FlagKey>,
}

impl<'p> Engine<'p> {
    pub fn new(
        settings: &'p Settings,
        registry: &'p FlagRegistry,
        tree: &'p CommandTree,
        env: &'p dyn EnvReader,
        delimiter: &'p Delimiter,
        session: &'p mut Session,
        stream: TokenStream,
    ) -> Self {
        Self {
            settings,
            registry,
            tree,
            env,
            delimiter,
            session,
            stream,
            literal: false,
            pinned: HashMap::new(),
        }
    }

    pub fn run(mut self) {
        self.inject_env(&[String::new()]);

        while self.stream.advance() {
            let Some(token) = self.stream.current().map(str::to_string) else {
                break;
            };
            tracing::trace!(token = %token, position = ?self.stream.current_position(), "token");

            if self.literal {
                self.positional(token);
                continue;
            }

            let pinned = self
                .stream
                .current_position()
                .and_then(|pos| self.pinned.remove(&pos));
            if let Some(key) = pinned {
                self.consume(&[key], None);
                continue;
            }

            match self.shape(&token) {
                Shape::EndOfFlags => self.literal = true,
                Shape::Long {
                    display,
                    name,
                    inline,
                } => self.long_flag(display, name, inline),
                Shape::Short {
                    display,
                    name,
                    inline,
                } => self.short_flag(display, name, inline),
                Shape::Plain => self.plain(token.clone()),
            }
        }

        self.flush_pending();
    }

    fn shape<'t>(&self, token: &'t str) -> Shape<'t> {
        let Some(first) = token.chars().next() else {
            return Shape::Plain;
        };
        if !self.settings.is_prefix(first) {
            return Shape::Plain;
        }

        let one = first.len_utf8();
        let rest = &token[one..];
        if rest.is_empty() {
            return Shape::Plain;
        }

        if rest.starts_with(first) {
            let body = &rest[one..];
            if body.is_empty() {
                return Shape::EndOfFlags;
            }
            let (name, inline) = split_inline(body);
            return Shape::Long {
                display: &token[..2 * one + name.len()],
                name,
                inline,
            };
        }

        let (name, inline) = split_inline(rest);
        if is_numeric(rest) && self.short_keys(name).is_empty() {
            return Shape::Plain;
        }
        Shape::Short {
            display: &token[..one + name.len()],
            name,
            inline,
        }
    }

    // ========================================================================
    // Flag lookup
    // ========================================================================

    /// Keys for one name: the global flag if there is one, otherwise every
    /// context scope defining it, innermost first.
    fn scoped_keys(&self, find: impl Fn(&str) -> Option<FlagKey>) -> Vec<FlagKey> {
        if let Some(key) = find("") {
            return vec![key];
        }
        let mut keys: Vec<FlagKey> = Vec::new();
        for path in self.session.context.iter().rev() {
            if let Some(key) = find(path) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    fn long_keys(&self, name: &str) -> Vec<FlagKey> {
        let registry = self.registry;
        self.scoped_keys(|path| {
            let key = FlagKey::scoped(path, name);
            registry.contains(&key).then_some(key)
        })
    }

    fn short_keys(&self, short: &str) -> Vec<FlagKey> {
        let registry = self.registry;
        self.scoped_keys(|path| registry.short_in(short, path).cloned())
    }

    fn not_found(&mut self, display: &str, name: &str, short: bool) {
        let mut paths = self.registry.scopes_of(name);
        if short {
            for path in self.registry.scopes_of_short(name) {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }

        if !paths.is_empty() {
            self.session.error(ParseError::OutOfScope {
                flag: display.to_string(),
                paths,
            });
        } else if self.session.unknown.insert(display.to_string()) {
            self.session.error(ParseError::UnknownFlag {
                flag: display.to_string(),
            });
        }
    }

    // ========================================================================
    // Flag tokens
    // ========================================================================

    fn long_flag(&mut self, display: &str, name: &str, inline: Option<&str>) {
        let keys = self.long_keys(name);
        if !keys.is_empty() {
            self.consume(&keys, inline);
            return;
        }

        if let Some((base, index)) = FlagKey::global(name).split_slot() {
            let registry = self.registry;
            let keys: Vec<FlagKey> = self
                .long_keys(base.name())
                .into_iter()
                .filter(|k| registry.get(k).is_some_and(|f| f.slot_capacity() > 0))
                .collect();
            if !keys.is_empty() {
                self.slot_flag(&keys, index, inline);
                return;
            }
        }

        self.not_found(display, name, false);
    }

    fn short_flag(&mut self, display: &str, name: &str, inline: Option<&str>) {
        if !self.settings.posix {
            let mut keys = self.short_keys(name);
            if keys.is_empty() {
                keys = self.long_keys(name);
            }
            if keys.is_empty() {
                self.not_found(display, name, true);
            } else {
                self.consume(&keys, inline);
            }
            return;
        }

        if name.chars().count() == 1 {
            let keys = self.short_keys(name);
            if keys.is_empty() {
                self.not_found(display, name, true);
            } else {
                self.consume(&keys, inline);
            }
            return;
        }

        let groups: Vec<Vec<FlagKey>> = name
            .chars()
            .map(|c| self.short_keys(c.encode_utf8(&mut [0; 4])))
            .collect();
        if groups.iter().any(Vec::is_empty) {
            self.session.error(ParseError::PosixIncompatible {
                token: display.to_string(),
            });
            return;
        }

        let registry = self.registry;
        let last = groups.len() - 1;
        for (i, keys) in groups.iter().enumerate() {
            if i == last {
                self.consume(keys, inline);
                continue;
            }
            let Some(flag) = registry.get(&keys[0]) else {
                continue;
            };
            if flag.is_secure() {
                for key in keys {
                    self.session.secure.mark_present(key.clone());
                }
            } else if flag.kind() == FlagKind::Standalone {
                for key in keys {
                    self.apply(key, None, "true");
                }
            } else {
                self.session.error(ParseError::MissingValue {
                    flag: keys[0].to_string(),
                });
            }
        }
    }

    /// Take the value for a flag and apply it to every key.
    fn consume(&mut self, keys: &[FlagKey], inline: Option<&str>) {
        let registry = self.registry;
        let Some(flag) = registry.get(&keys[0]) else {
            return;
        };

        if flag.is_secure() {
            for key in keys {
                match inline {
                    Some(value) => self.session.secure.seed(key.clone(), value.to_string()),
                    None => self.session.secure.mark_present(key.clone()),
                }
            }
            return;
        }

        let label = keys[0].to_string();
        if let Some(value) = self.take_value(&label, flag.kind(), inline) {
            for key in keys {
                self.apply(key, None, &value);
            }
        }
    }

    fn slot_flag(&mut self, keys: &[FlagKey], index: usize, inline: Option<&str>) {
        let label = keys[0].slot(index).to_string();
        let Some(value) = self.take_value(&label, FlagKind::Single, inline) else {
            return;
        };

        for key in keys {
            let capacity = self.registry.get(key).map_or(0, |f| f.slot_capacity());
            if usize::try_from(capacity).map_or(true, |cap| index >= cap) {
                self.session.error(ParseError::IndexOutOfRange {
                    flag: key.to_string(),
                    index,
                    capacity,
                });
                continue;
            }
            self.apply(key, Some(index), &value);
        }
    }

    fn take_value(&mut self, label: &str, kind: FlagKind, inline: Option<&str>) -> Option<String> {
        match (kind, inline) {
            (FlagKind::Standalone, Some(raw)) => match parse_bool(raw) {
                Some(b) => Some(b.to_string()),
                None => {
                    self.session.error(ParseError::InvalidValue {
                        flag: label.to_string(),
                        value: raw.to_string(),
                        reason: "expected a boolean".to_string(),
                    });
                    None
                }
            },
            (FlagKind::Standalone, None) => {
                match self.stream.peek().and_then(parse_bool) {
                    Some(b) => {
                        self.stream.advance();
                        Some(b.to_string())
                    }
                    None => Some("true".to_string()),
                }
            }
            (_, Some(raw)) => Some(raw.to_string()),
            (_, None) => {
                if self.stream.advance() {
                    self.stream.current().map(str::to_string)
                } else {
                    self.session.error(ParseError::MissingValue {
                        flag: label.to_string(),
                    });
                    None
                }
            }
        }
    }

    fn apply(&mut self, key: &FlagKey, slot: Option<usize>, raw: &str) {
        let registry = self.registry;
        let Some(flag) = registry.get(key) else {
            return;
        };
        let stored = slot.map_or_else(|| key.clone(), |i| key.slot(i));

        match finalize(flag, &stored.to_string(), slot, raw, self.delimiter) {
            Ok(resolved) => {
                if let Some(path) = resolved.file_path {
                    self.session.file_paths.insert(stored.clone(), path);
                }
                self.session.store(stored, resolved.value);
            }
            Err(err) => self.session.error(err),
        }
    }

    // ========================================================================
    // Plain tokens
    // ========================================================================

    fn plain(&mut self, token: String) {
        let continuation = self
            .session
            .context
            .last()
            .and_then(|top| self.tree.index_of(top))
            .and_then(|parent| self.tree.match_child(parent, &token));
        if let Some(child) = continuation {
            self.enter(child, true);
            return;
        }

        if let Some(root) = self.tree.match_root(&token) {
            self.enter(root, false);
            return;
        }

        self.positional(token);
    }

    /// Recognize a command starting at `start`, extending greedily through
    /// the following tokens.
    fn enter(&mut self, start: usize, continuation: bool) {
        if !continuation {
            self.flush_pending();
            if !self.session.context.is_empty() {
                tracing::debug!("context cleared");
            }
            self.session.context.clear();
        }

        let mut idx = start;
        let mut pushed = vec![self.tree.node(idx).path().to_string()];
        while let Some(next) = self.stream.peek() {
            match self.tree.match_child(idx, next) {
                Some(child) => {
                    self.stream.advance();
                    idx = child;
                    pushed.push(self.tree.node(idx).path().to_string());
                }
                None => break,
            }
        }

        for path in &pushed {
            if !self.session.context.contains(path) {
                tracing::debug!(path = %path, "context pushed");
                self.session.context.push(path.clone());
            }
        }

        let path = self.tree.node(idx).path().to_string();
        if continuation {
            if let Some(previous) = self.session.pending.take() {
                if self.session.pending_is_new {
                    self.session.commands.shift_remove(&previous);
                }
            }
        }
        tracing::debug!(path = %path, continuation, "command recognized");
        self.session.pending_is_new = self.session.commands.insert(path.clone());
        self.session.pending = Some(path);

        self.inject_env(&pushed);
    }

    fn flush_pending(&mut self) {
        let Some(path) = self.session.pending.take() else {
            return;
        };
        let tree = self.tree;
        let Some(callback) = tree.find(&path).and_then(|n| n.callback()) else {
            return;
        };

        if self.settings.eager_callbacks {
            tracing::debug!(path = %path, "running command callback");
            let ctx = command_context(self.session, &path);
            if let Err(err) = callback(&ctx) {
                tracing::debug!(path = %path, error = %err, "command callback failed");
                self.session.callback_errors.insert(path, err);
            }
        } else {
            self.session.queue.push_back(path);
        }
    }

    fn positional(&mut self, value: String) {
        let cursor = self.stream.current_position().unwrap_or(0);
        let position = self.stream.origin(cursor).unwrap_or(cursor);
        let flag = self
            .session
            .file_paths
            .iter()
            .find(|(_, path)| **path == value)
            .map(|(key, _)| key.clone());
        let index = self.session.positionals.len();
        self.session
            .positionals
            .push(Positional::new(position, index, value, flag));
    }

    // ========================================================================
    // Environment
    // ========================================================================

    /// Splice environment values for flags scoped to `paths` in after the
    /// cursor. Each path is injected at most once per parse.
    fn inject_env(&mut self, paths: &[String]) {
        let registry = self.registry;
        let mut spliced: Vec<String> = Vec::new();
        let mut targets: Vec<FlagKey> = Vec::new();

        for path in paths {
            let count = self.session.injections.entry(path.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                continue;
            }

            for flag in registry.flags_in(path) {
                let var = match (flag.env_var(), &self.settings.env_prefix) {
                    (Some(var), _) => var.to_string(),
                    (None, Some(prefix)) => derive_var_name(prefix, path, flag.name()),
                    (None, None) => continue,
                };
                let Some(value) = self.env.var(&var) else {
                    continue;
                };

                let key = flag.key();
                if flag.is_secure() {
                    tracing::debug!(flag = %key, var = %var, "seeding secure flag from environment");
                    self.session.secure.seed(key, value);
                    continue;
                }
                if flag.kind() == FlagKind::Standalone && parse_bool(&value).is_none() {
                    tracing::warn!(flag = %key, var = %var, value = %value, "ignoring non-boolean environment value");
                    continue;
                }

                tracing::debug!(flag = %key, var = %var, "injecting environment value");
                targets.push(key);
                spliced.push(self.settings.long_form(flag.name()));
                spliced.push(value);
            }
        }

        if spliced.is_empty() {
            return;
        }
        let at = self.stream.insert_after_cursor(spliced);
        for (i, key) in targets.into_iter().enumerate() {
            self.pinned.insert(at + 2 * i, key);
        }
    }
}
