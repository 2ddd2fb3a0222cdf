//! Secret source implementations.
//!
//! - [`EnvSecret`] - Read the flag's environment variable
//! - [`PromptSecret`] - Ask on the terminal (requires `simple-prompts` feature)
//! - [`MockSecrets`] - Fixed answers keyed by flag, for tests
//! - [`InquirePassword`] - Masked prompt (requires `inquire` feature)

mod env;
mod fixed;

#[cfg(feature = "simple-prompts")]
mod prompt;

#[cfg(feature = "inquire")]
mod inquire_adapters;

pub use env::EnvSecret;
pub use fixed::MockSecrets;

#[cfg(feature = "simple-prompts")]
pub use prompt::{MockTerminal, PromptSecret, RealTerminal, TerminalIO};

#[cfg(feature = "inquire")]
pub use inquire_adapters::InquirePassword;
