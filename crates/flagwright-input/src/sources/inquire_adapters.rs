//! Masked password prompt backed by the inquire crate.

use std::io::IsTerminal;

use inquire::{InquireError, Password, PasswordDisplayMode};

use crate::secret::{SecretRequest, SecretSource};
use crate::InputError;

fn map_inquire_error(e: InquireError) -> InputError {
    match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            InputError::PromptCancelled
        }
        other => InputError::PromptFailed(other.to_string()),
    }
}

/// Password prompt using inquire.
///
/// ```ignore
/// use flagwright::Parser;
/// use flagwright_input::InquirePassword;
///
/// let parser = Parser::builder()
///     .secret_source(InquirePassword::new())
///     .build();
/// ```
pub struct InquirePassword {
    help_message: Option<String>,
    display_mode: PasswordDisplayMode,
    confirm: bool,
}

impl InquirePassword {
    /// Create a new masked password prompt.
    pub fn new() -> Self {
        Self {
            help_message: None,
            display_mode: PasswordDisplayMode::Masked,
            confirm: false,
        }
    }

    /// Set a help message.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help_message = Some(help.into());
        self
    }

    /// Hide input completely (no asterisks).
    pub fn hidden(mut self) -> Self {
        self.display_mode = PasswordDisplayMode::Hidden;
        self
    }

    /// Ask for the value twice.
    pub fn with_confirmation(mut self) -> Self {
        self.confirm = true;
        self
    }
}

impl Default for InquirePassword {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretSource for InquirePassword {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn is_available(&self, _request: &SecretRequest) -> bool {
        std::io::stdin().is_terminal()
    }

    fn read_secret(&self, request: &SecretRequest) -> Result<Option<String>, InputError> {
        let message = if request.prompt.is_empty() {
            format!("{}:", request.flag)
        } else {
            request.prompt.clone()
        };

        let mut prompt = Password::new(&message).with_display_mode(self.display_mode);
        if let Some(help) = &self.help_message {
            prompt = prompt.with_help_message(help);
        }
        if !self.confirm {
            prompt = prompt.without_confirmation();
        }

        let result = prompt.prompt().map_err(map_inquire_error)?;
        if result.is_empty() {
            Ok(None)
        } else {
            Ok(Some(result))
        }
    }

    fn can_retry(&self) -> bool {
        true
    }
}
