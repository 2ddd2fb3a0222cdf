//! Fixed secret answers for tests and non-interactive runs.

use std::collections::{HashMap, HashSet};

use crate::secret::{SecretRequest, SecretSource};
use crate::InputError;

/// Answers secure flags from a fixed table keyed by flag.
///
/// Flags registered with [`MockSecrets::failing`] simulate a cancelled
/// prompt, which is how tests exercise secure-resolution failures.
#[derive(Debug, Clone, Default)]
pub struct MockSecrets {
    answers: HashMap<String, String>,
    failing: HashSet<String>,
}

impl MockSecrets {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `flag` with `value`.
    pub fn with(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.answers.insert(flag.into(), value.into());
        self
    }

    /// Make `flag` fail as if the user cancelled the prompt.
    pub fn failing(mut self, flag: impl Into<String>) -> Self {
        self.failing.insert(flag.into());
        self
    }
}

impl SecretSource for MockSecrets {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn is_available(&self, request: &SecretRequest) -> bool {
        self.answers.contains_key(&request.flag) || self.failing.contains(&request.flag)
    }

    fn read_secret(&self, request: &SecretRequest) -> Result<Option<String>, InputError> {
        if self.failing.contains(&request.flag) {
            return Err(InputError::PromptCancelled);
        }
        Ok(self.answers.get(&request.flag).cloned())
    }
}
