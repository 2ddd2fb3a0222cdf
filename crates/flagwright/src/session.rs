//! Mutable parse state.
//!
//! One [`Session`] lives inside each [`Parser`](crate::Parser). Only one
//! parse may be in flight at a time; `parse` takes `&mut self`, which is what
//! enforces it.
//!
//! Resolved options, errors, recognized commands and positionals accumulate
//! across parses until they are cleared with
//! [`Parser::clear`](crate::Parser::clear). Everything else is reset at the
//! start of every parse.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::depends::DependencyWarning;
use crate::error::ParseError;
use crate::flag::FlagKey;
use crate::secure::SecureCandidates;

/// A token that was neither a flag, a flag value nor a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positional {
    position: usize,
    index: usize,
    value: String,
    flag: Option<FlagKey>,
}

impl Positional {
    pub(crate) fn new(position: usize, index: usize, value: String, flag: Option<FlagKey>) -> Self {
        Self {
            position,
            index,
            value,
            flag,
        }
    }

    /// Index of the token in the argument vector.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Index among positional arguments.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The literal token.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The `File` flag whose path this token repeats, if any.
    pub fn flag(&self) -> Option<&FlagKey> {
        self.flag.as_ref()
    }
}

/// Which parts of the session [`Parser::clear`](crate::Parser::clear) resets.
///
/// `accepted` and `filters` act on the registered flags rather than the
/// session: they drop accepted-value patterns and pre/post filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reset {
    pub options: bool,
    pub errors: bool,
    pub accepted: bool,
    pub filters: bool,
    pub commands: bool,
    pub positionals: bool,
}

impl Reset {
    /// Everything a parse produces, keeping the grammar untouched.
    pub fn session() -> Self {
        Self {
            options: true,
            errors: true,
            commands: true,
            positionals: true,
            ..Self::default()
        }
    }

    /// Everything, including accepted-value guards and filters.
    pub fn all() -> Self {
        Self {
            accepted: true,
            filters: true,
            ..Self::session()
        }
    }

    /// Nothing.
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Default)]
pub(crate) struct Session {
    pub options: IndexMap<FlagKey, String>,
    pub file_paths: IndexMap<FlagKey, String>,
    pub commands: IndexSet<String>,
    pub positionals: Vec<Positional>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<DependencyWarning>,
    pub callback_errors: IndexMap<String, anyhow::Error>,
    pub secure_keys: HashSet<FlagKey>,

    // Reset at the start of every parse.
    pub pending: Option<String>,
    /// Whether `pending` was first recorded by this parse.
    pub pending_is_new: bool,
    pub queue: VecDeque<String>,
    pub secure: SecureCandidates,
    pub injections: HashMap<String, usize>,
    pub context: Vec<String>,
    pub unknown: HashSet<String>,
}

impl Session {
    pub fn begin(&mut self) {
        self.warnings.clear();
        self.pending = None;
        self.pending_is_new = false;
        self.queue.clear();
        self.secure = SecureCandidates::default();
        self.injections.clear();
        self.context.clear();
        self.unknown.clear();
    }

    pub fn clear(&mut self, reset: Reset) {
        if reset.options {
            self.options.clear();
            self.file_paths.clear();
            self.secure_keys.clear();
        }
        if reset.errors {
            self.errors.clear();
            self.warnings.clear();
            self.callback_errors.clear();
        }
        if reset.commands {
            self.commands.clear();
            self.queue.clear();
        }
        if reset.positionals {
            self.positionals.clear();
        }
    }

    /// Store a resolved value; last one wins.
    pub fn store(&mut self, key: FlagKey, value: String) {
        self.options.insert(key, value);
    }

    pub fn error(&mut self, err: ParseError) {
        tracing::debug!(error = %err, "parse error");
        self.errors.push(err);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options: IndexMap<String, &str> = self
            .options
            .iter()
            .map(|(k, v)| {
                let shown = if self.secure_keys.contains(k) {
                    "[REDACTED]"
                } else {
                    v.as_str()
                };
                (k.to_string(), shown)
            })
            .collect();

        f.debug_struct("Session")
            .field("options", &options)
            .field("commands", &self.commands)
            .field("positionals", &self.positionals)
            .field("errors", &self.errors)
            .field("warnings", &self.warnings)
            .field("pending", &self.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_presets() {
        assert!(!Reset::none().options);
        assert!(Reset::session().options && !Reset::session().accepted);
        assert!(Reset::all().accepted && Reset::all().filters);
    }

    #[test]
    fn clear_selected_parts() {
        let mut session = Session::default();
        session.store(FlagKey::global("a"), "1".into());
        session.commands.insert("build".into());
        session.error(ParseError::MissingValue { flag: "a".into() });

        session.clear(Reset {
            errors: true,
            ..Reset::none()
        });
        assert!(session.errors.is_empty());
        assert_eq!(session.options.len(), 1);
        assert_eq!(session.commands.len(), 1);
    }

    #[test]
    fn debug_redacts_secure_values() {
        let mut session = Session::default();
        session.store(FlagKey::global("password"), "hunter2".into());
        session.secure_keys.insert(FlagKey::global("password"));
        let out = format!("{:?}", session);
        assert!(!out.contains("hunter2"));
        assert!(out.contains("[REDACTED]"));
    }
}
