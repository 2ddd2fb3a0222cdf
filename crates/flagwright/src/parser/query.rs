//! Reading results back after a parse.

use indexmap::IndexMap;

use crate::depends::DependencyWarning;
use crate::error::{ParseError, ValueError};
use crate::flag::{FlagKey, FlagKind};
use crate::session::{Positional, Reset};
use crate::value::{parse_bool, split_chain};

use super::{command_context, Parser};

impl Parser {
    /// The resolved value of a flag, falling back to its default.
    ///
    /// A default returned this way is recorded as seen: from then on it
    /// shows up in [`options`](Parser::options) like any other value.
    pub fn value(&mut self, key: impl Into<FlagKey>) -> Option<String> {
        let key = key.into();
        if let Some(value) = self.session.options.get(&key) {
            return Some(value.clone());
        }
        let default = self.registry.get(&key)?.default_value()?.to_string();
        self.session.store(key, default.clone());
        Some(default)
    }

    /// The resolved value of a flag scoped to `path`.
    pub fn value_in(&mut self, path: &str, name: &str) -> Option<String> {
        self.value(FlagKey::scoped(path, name))
    }

    /// A flag's value as a boolean. An absent `Standalone` flag is `false`.
    pub fn get_bool(&mut self, key: impl Into<FlagKey>) -> Result<bool, ValueError> {
        let key = key.into();
        match self.value(key.clone()) {
            Some(raw) => parse_bool(&raw).ok_or(ValueError::Invalid {
                flag: key.to_string(),
                value: raw,
                expected: "boolean",
            }),
            None if self
                .registry
                .get(&key)
                .is_some_and(|f| f.kind() == FlagKind::Standalone) =>
            {
                Ok(false)
            }
            None => Err(ValueError::Missing {
                flag: key.to_string(),
            }),
        }
    }

    /// A flag's value as a signed integer.
    pub fn get_int(&mut self, key: impl Into<FlagKey>) -> Result<i64, ValueError> {
        self.typed(key.into(), "integer", |raw| raw.trim().parse().ok())
    }

    /// A flag's value as a float.
    pub fn get_float(&mut self, key: impl Into<FlagKey>) -> Result<f64, ValueError> {
        self.typed(key.into(), "float", |raw| raw.trim().parse().ok())
    }

    /// A flag's value split into items with the chain delimiter.
    pub fn get_list(&mut self, key: impl Into<FlagKey>) -> Result<Vec<String>, ValueError> {
        let key = key.into();
        let raw = self.value(key.clone()).ok_or_else(|| ValueError::Missing {
            flag: key.to_string(),
        })?;
        Ok(split_chain(&raw, self.delimiter.as_ref()))
    }

    fn typed<T>(
        &mut self,
        key: FlagKey,
        expected: &'static str,
        convert: impl Fn(&str) -> Option<T>,
    ) -> Result<T, ValueError> {
        let raw = self.value(key.clone()).ok_or_else(|| ValueError::Missing {
            flag: key.to_string(),
        })?;
        convert(&raw).ok_or(ValueError::Invalid {
            flag: key.to_string(),
            value: raw,
            expected,
        })
    }

    /// The path a `File` flag was given, as opposed to the file content.
    pub fn file_path(&self, key: impl Into<FlagKey>) -> Option<&str> {
        self.session
            .file_paths
            .get(&key.into())
            .map(String::as_str)
    }

    /// Every resolved value, in resolution order.
    pub fn options(&self) -> &IndexMap<FlagKey, String> {
        &self.session.options
    }

    /// Command paths recognized, in order.
    pub fn commands(&self) -> Vec<&str> {
        self.session.commands.iter().map(String::as_str).collect()
    }

    pub fn has_command(&self, path: &str) -> bool {
        self.session.commands.contains(path)
    }

    pub fn positionals(&self) -> &[Positional] {
        &self.session.positionals
    }

    /// Hard errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.session.errors
    }

    /// Dependency warnings from the last parse.
    pub fn warnings(&self) -> &[DependencyWarning] {
        &self.session.warnings
    }

    /// Whether no hard error has been recorded.
    pub fn success(&self) -> bool {
        self.session.errors.is_empty()
    }

    /// The error returned by a command callback.
    pub fn callback_error(&self, path: &str) -> Option<&anyhow::Error> {
        self.session.callback_errors.get(path)
    }

    /// Every callback error, keyed by command path.
    pub fn callback_errors(&self) -> &IndexMap<String, anyhow::Error> {
        &self.session.callback_errors
    }

    /// Command paths whose callbacks are queued.
    pub fn pending_callbacks(&self) -> Vec<&str> {
        self.session.queue.iter().map(String::as_str).collect()
    }

    /// Run queued callbacks in recognition order. Returns how many ran.
    ///
    /// Failures are stored per path and never change the parse result.
    pub fn run_callbacks(&mut self) -> usize {
        let mut ran = 0;
        while let Some(path) = self.session.queue.pop_front() {
            let Some(callback) = self.tree.find(&path).and_then(|n| n.callback()).cloned() else {
                continue;
            };
            tracing::debug!(path = %path, "running command callback");
            let ctx = command_context(&self.session, &path);
            ran += 1;
            if let Err(err) = callback(&ctx) {
                tracing::debug!(path = %path, error = %err, "command callback failed");
                self.session.callback_errors.insert(path, err);
            }
        }
        ran
    }

    /// Reset parts of the parse state, keeping the grammar.
    pub fn clear(&mut self, reset: Reset) {
        self.session.clear(reset);
        if reset.accepted || reset.filters {
            for flag in self.registry.flags_mut() {
                if reset.accepted {
                    flag.clear_accepted();
                }
                if reset.filters {
                    flag.clear_filters();
                }
            }
        }
    }
}
