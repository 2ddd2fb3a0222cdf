//! Core secret source trait.
//!
//! The [`SecretSource`] trait defines the interface for everything that can
//! produce the value of a secure flag. Implementations can be composed into
//! a [`SecretChain`](crate::SecretChain) with fallback behavior.

use std::fmt;

use crate::InputError;

/// What the parser knows about a secure flag when it asks for its value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretRequest {
    /// Path-qualified flag key, rendered for display (e.g. `db::password`).
    pub flag: String,
    /// Prompt text configured on the flag.
    pub prompt: String,
    /// Environment variable associated with the flag, if any.
    pub env_var: Option<String>,
}

impl SecretRequest {
    /// Create a request for the given flag with a prompt.
    pub fn new(flag: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            prompt: prompt.into(),
            env_var: None,
        }
    }

    /// Attach an environment variable name.
    pub fn with_env(mut self, var: impl Into<String>) -> Self {
        self.env_var = Some(var.into());
        self
    }
}

impl fmt::Debug for SecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRequest")
            .field("flag", &self.flag)
            .field("env_var", &self.env_var)
            .finish_non_exhaustive()
    }
}

/// A source that can produce the value of a secure flag.
///
/// # Implementation Guidelines
///
/// - [`is_available`](Self::is_available) should return `false` if this
///   source cannot provide input in the current environment (no TTY for a
///   prompt, no variable for an environment source).
///
/// - [`read_secret`](Self::read_secret) returns `Ok(None)` to mean "try the
///   next source" and `Ok(Some(value))` when a value was obtained. Return
///   `Err` only for actual failures.
///
/// # Example
///
/// ```
/// use flagwright_input::{InputError, SecretRequest, SecretSource};
///
/// struct Fixed(String);
///
/// impl SecretSource for Fixed {
///     fn name(&self) -> &'static str { "fixed" }
///
///     fn is_available(&self, _: &SecretRequest) -> bool { true }
///
///     fn read_secret(&self, _: &SecretRequest) -> Result<Option<String>, InputError> {
///         Ok(Some(self.0.clone()))
///     }
/// }
/// ```
pub trait SecretSource: Send + Sync {
    /// Human-readable name for this source, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Check if this source can provide a value for the request.
    fn is_available(&self, request: &SecretRequest) -> bool;

    /// Attempt to read the secret.
    fn read_secret(&self, request: &SecretRequest) -> Result<Option<String>, InputError>;

    /// Whether this source supports retry on validation failure.
    ///
    /// Interactive sources should return `true`. Default is `false`.
    fn can_retry(&self) -> bool {
        false
    }
}

impl<S: SecretSource + ?Sized> SecretSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_available(&self, request: &SecretRequest) -> bool {
        (**self).is_available(request)
    }

    fn read_secret(&self, request: &SecretRequest) -> Result<Option<String>, InputError> {
        (**self).read_secret(request)
    }

    fn can_retry(&self) -> bool {
        (**self).can_retry()
    }
}

/// The kind of source that provided a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOrigin {
    /// Pre-seeded before the secure pass (e.g. from the parser's env injection).
    Seeded,
    /// From an environment variable.
    Env,
    /// From an interactive prompt.
    Prompt,
    /// From a fixed or mocked value.
    Fixed,
}

impl fmt::Display for SecretOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seeded => write!(f, "seeded"),
            Self::Env => write!(f, "environment variable"),
            Self::Prompt => write!(f, "prompt"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

/// A secret together with the source it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Which source provided it.
    pub origin: SecretOrigin,
}

impl fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("value", &"<redacted>")
            .field("origin", &self.origin)
            .finish()
    }
}
