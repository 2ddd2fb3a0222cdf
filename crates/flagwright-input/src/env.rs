//! Environment abstractions for testability.
//!
//! The parser splices environment-derived flag values into the token stream
//! and seeds secure flags from the environment. Both go through
//! [`EnvReader`] so tests never have to touch the real process environment.

use std::collections::HashMap;

/// Abstraction over environment variables.
pub trait EnvReader: Send + Sync {
    /// Get an environment variable value.
    ///
    /// Returns `None` when the variable is unset or not valid unicode.
    fn var(&self, name: &str) -> Option<String>;
}

/// Real environment variable reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealEnv;

impl EnvReader for RealEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Mock environment variable reader for testing.
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    /// Create an empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Number of variables defined in this mock.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the mock defines no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvReader for MockEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<R: EnvReader + ?Sized> EnvReader for std::sync::Arc<R> {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Derive an environment variable name from a prefix, command path and flag name.
///
/// Every character that is not ASCII alphanumeric becomes `_` and the result
/// is uppercased: prefix `APP`, path `user create`, name `dry-run` gives
/// `APP_USER_CREATE_DRY_RUN`.
pub fn derive_var_name(prefix: &str, path: &str, name: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !prefix.is_empty() {
        parts.push(prefix);
    }
    parts.extend(path.split_whitespace());
    parts.push(name);

    parts
        .join("_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
