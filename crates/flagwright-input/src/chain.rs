//! Secret chain builder for composing multiple sources.
//!
//! The [`SecretChain`] tries sources in order until one provides a value.

use std::fmt;

use crate::secret::{ResolvedSecret, SecretOrigin, SecretRequest, SecretSource};
use crate::InputError;

/// Validator function type.
type ValidatorFn = Box<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// Attempts an interactive source gets before its validation failure is final.
const MAX_ATTEMPTS: usize = 3;

/// Chain multiple secret sources with fallback behavior.
///
/// Sources are tried in the order they were added. The first source that
/// returns `Some(value)` wins. If every source returns `None`, resolution
/// fails with [`InputError::NoInput`].
///
/// # Example
///
/// ```
/// use flagwright_input::{EnvSecret, MockEnv, MockSecrets, SecretChain, SecretRequest};
///
/// let chain = SecretChain::new()
///     .try_source(EnvSecret::with_reader(MockEnv::new()))
///     .try_source(MockSecrets::new().with("password", "hunter2"));
///
/// let request = SecretRequest::new("password", "Password: ");
/// assert_eq!(chain.resolve(&request).unwrap().value, "hunter2");
/// ```
#[derive(Default)]
pub struct SecretChain {
    sources: Vec<(Box<dyn SecretSource>, SecretOrigin)>,
    validators: Vec<ValidatorFn>,
}

impl SecretChain {
    /// Create a new empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source to the chain.
    pub fn try_source<S: SecretSource + 'static>(mut self, source: S) -> Self {
        let origin = origin_from_name(source.name());
        self.sources.push((Box::new(source), origin));
        self
    }

    /// Add a source with an explicit origin.
    pub fn try_source_with_origin<S: SecretSource + 'static>(
        mut self,
        source: S,
        origin: SecretOrigin,
    ) -> Self {
        self.sources.push((Box::new(source), origin));
        self
    }

    /// Add a validation rule.
    ///
    /// Interactive sources re-prompt on failure (up to three attempts);
    /// non-interactive sources fail with [`InputError::ValidationFailed`].
    pub fn validate<F>(mut self, f: F, error_msg: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let msg = error_msg.into();
        self.validators.push(Box::new(move |value| {
            if f(value) {
                Ok(())
            } else {
                Err(msg.clone())
            }
        }));
        self
    }

    /// Number of sources in the chain.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Resolve the chain for one secure flag.
    pub fn resolve(&self, request: &SecretRequest) -> Result<ResolvedSecret, InputError> {
        for (source, origin) in &self.sources {
            if !source.is_available(request) {
                continue;
            }

            let mut attempts = 0;
            loop {
                attempts += 1;
                let Some(value) = source.read_secret(request)? else {
                    break;
                };

                match self.check(&value) {
                    Ok(()) => {
                        return Ok(ResolvedSecret {
                            value,
                            origin: *origin,
                        })
                    }
                    Err(msg) if source.can_retry() && attempts < MAX_ATTEMPTS => {
                        eprintln!("Invalid: {}", msg);
                    }
                    Err(msg) => return Err(InputError::ValidationFailed(msg)),
                }
            }
        }

        Err(InputError::NoInput(request.flag.clone()))
    }

    fn check(&self, value: &str) -> Result<(), String> {
        self.validators.iter().try_for_each(|v| v(value))
    }
}

impl SecretSource for SecretChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn is_available(&self, request: &SecretRequest) -> bool {
        self.sources.iter().any(|(s, _)| s.is_available(request))
    }

    fn read_secret(&self, request: &SecretRequest) -> Result<Option<String>, InputError> {
        match self.resolve(request) {
            Ok(resolved) => Ok(Some(resolved.value)),
            Err(InputError::NoInput(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Debug for SecretChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|(s, _)| s.name()).collect();
        f.debug_struct("SecretChain")
            .field("sources", &names)
            .field("validators", &self.validators.len())
            .finish()
    }
}

fn origin_from_name(name: &str) -> SecretOrigin {
    match name {
        "environment variable" => SecretOrigin::Env,
        "prompt" => SecretOrigin::Prompt,
        _ => SecretOrigin::Fixed,
    }
}
