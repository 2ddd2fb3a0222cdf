//! Error types for secret and environment input.

use std::io;

/// Errors that can occur while collecting a secure value.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// User cancelled an interactive prompt.
    #[error("Prompt cancelled by user.")]
    PromptCancelled,

    /// Interactive prompt failed.
    #[error("Prompt failed: {0}")]
    PromptFailed(String),

    /// Reading the terminal failed.
    #[error("Failed to read terminal: {0}")]
    TerminalFailed(#[source] io::Error),

    /// The collected value was rejected by a validator.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// No source could provide a value for the flag.
    #[error("No value provided for secure flag '{0}'.")]
    NoInput(String),
}

impl InputError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    /// Create a prompt failure.
    pub fn prompt(msg: impl Into<String>) -> Self {
        Self::PromptFailed(msg.into())
    }
}
