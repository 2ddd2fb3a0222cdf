//! Environment variable secret source.

use std::sync::Arc;

use crate::env::{EnvReader, RealEnv};
use crate::secret::{SecretRequest, SecretSource};
use crate::InputError;

/// Read a secure flag's value from its environment variable.
///
/// Available when the request names a variable that is set and non-empty.
///
/// # Testing
///
/// Use [`EnvSecret::with_reader`] to inject a mock environment:
///
/// ```
/// use flagwright_input::{EnvSecret, MockEnv, SecretRequest, SecretSource};
///
/// let env = MockEnv::new().with_var("APP_TOKEN", "secret");
/// let source = EnvSecret::with_reader(env);
/// let request = SecretRequest::new("token", "Token: ").with_env("APP_TOKEN");
/// assert_eq!(source.read_secret(&request).unwrap(), Some("secret".into()));
/// ```
#[derive(Clone)]
pub struct EnvSecret<R: EnvReader = RealEnv> {
    reader: Arc<R>,
}

impl EnvSecret<RealEnv> {
    /// Create a source reading the real process environment.
    pub fn new() -> Self {
        Self {
            reader: Arc::new(RealEnv),
        }
    }
}

impl Default for EnvSecret<RealEnv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: EnvReader> EnvSecret<R> {
    /// Create a source with a custom reader.
    pub fn with_reader(reader: R) -> Self {
        Self {
            reader: Arc::new(reader),
        }
    }

    fn lookup(&self, request: &SecretRequest) -> Option<String> {
        let var = request.env_var.as_deref()?;
        self.reader.var(var).filter(|v| !v.is_empty())
    }
}

impl<R: EnvReader + 'static> SecretSource for EnvSecret<R> {
    fn name(&self) -> &'static str {
        "environment variable"
    }

    fn is_available(&self, request: &SecretRequest) -> bool {
        self.lookup(request).is_some()
    }

    fn read_secret(&self, request: &SecretRequest) -> Result<Option<String>, InputError> {
        Ok(self.lookup(request))
    }
}
