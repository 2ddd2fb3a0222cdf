//! Environment and secret-value sources for flagwright.
//!
//! `flagwright-input` holds the I/O the parser depends on but never performs
//! directly: reading environment variables for flag injection, and
//! obtaining the values of secure flags once parsing has succeeded.
//!
//! # Quick Start
//!
//! ```
//! use flagwright_input::{EnvSecret, MockEnv, MockSecrets, SecretChain, SecretRequest};
//!
//! // Environment first, then a fixed table
//! let chain = SecretChain::new()
//!     .try_source(EnvSecret::with_reader(MockEnv::new()))
//!     .try_source(MockSecrets::new().with("token", "abc123"));
//!
//! let secret = chain.resolve(&SecretRequest::new("token", "Token: ")).unwrap();
//! assert_eq!(secret.value, "abc123");
//! ```
//!
//! # Features
//!
//! - **`simple-prompts`** (default) - Enable the plain terminal prompt
//! - **`inquire`** - Enable masked password entry via the inquire crate
//!
//! # Testing
//!
//! Every source accepts a mock: [`MockEnv`] for environment variables,
//! [`MockTerminal`] for prompts and [`MockSecrets`] for fixed answers.

mod chain;
pub mod env;
mod error;
mod secret;
pub mod sources;

pub use chain::SecretChain;
pub use env::{derive_var_name, EnvReader, MockEnv, RealEnv};
pub use error::InputError;
pub use secret::{ResolvedSecret, SecretOrigin, SecretRequest, SecretSource};

pub use sources::{EnvSecret, MockSecrets};

#[cfg(feature = "simple-prompts")]
pub use sources::{MockTerminal, PromptSecret, RealTerminal, TerminalIO};

#[cfg(feature = "inquire")]
pub use sources::InquirePassword;
