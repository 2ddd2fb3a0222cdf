//! Command-line flag and nested-command parsing.
//!
//! `flagwright` parses a token vector against a grammar declared up front:
//! flags (global or scoped to a command path) and a tree of nested commands.
//! Flags and commands may be interleaved freely. The result is a set of
//! resolved flag values, the recognized command paths and the leftover
//! positional arguments.
//!
//! # Quick Start
//!
//! ```
//! use flagwright::{Command, Flag, Parser};
//!
//! let mut parser = Parser::new();
//! parser.register(Flag::new("verbose").short('v').standalone()).unwrap();
//! parser
//!     .register(Flag::new("role").scope("user create").default("member"))
//!     .unwrap();
//! parser
//!     .command(Command::new("user").subcommand(Command::new("create")))
//!     .unwrap();
//!
//! assert!(parser.parse(["user", "-v", "create", "--role", "admin", "ada"]));
//! assert!(parser.has_command("user create"));
//! assert_eq!(parser.value_in("user create", "role").as_deref(), Some("admin"));
//! assert_eq!(parser.positionals()[0].value(), "ada");
//! ```
//!
//! # Pipeline
//!
//! ```text
//! args ─► TokenStream ─► engine pass ─► dependency check ─► secure values
//!                          │                   │                  │
//!                    errors, options       warnings          prompts / env
//! ```
//!
//! - The engine pass records hard errors ([`ParseError`]) and keeps going.
//! - Dependency problems are advisory ([`DependencyWarning`]).
//! - Secure flags are resolved through a [`SecretSource`] only when the pass
//!   had no hard errors.
//!
//! # Environment
//!
//! A flag with [`Flag::env`], or any flag when the parser has an
//! [`env_prefix`](ParserBuilder::env_prefix), takes its value from the
//! environment as if it had been typed right after its command. Values typed
//! on the command line win.
//!
//! # Features
//!
//! - **`inquire`** - Masked password prompts for secure flags

mod bind;
mod command;
mod completion;
mod depends;
mod error;
mod flag;
mod parser;
mod registry;
mod schema;
mod secure;
mod session;
mod settings;
mod tokens;
mod value;

pub use bind::{BindTarget, Bindable, Bound};
pub use command::{
    path_to_string, string_to_path, Callback, Command, CommandContext, CommandNode, CommandTree,
    PATH_SEPARATOR, TRAVERSAL_LIMIT,
};
pub use completion::{CompletionCommand, CompletionData, CompletionFlag};
pub use depends::{DependencyIssue, DependencyWarning};
pub use error::{ConfigError, ParseError, ValueError};
pub use flag::{AcceptedValue, Filter, Flag, FlagKey, FlagKind};
pub use parser::{Parser, ParserBuilder};
pub use registry::FlagRegistry;
pub use schema::{Field, Schema};
pub use session::{Positional, Reset};
pub use settings::{Settings, DEFAULT_DEPENDENCY_DEPTH, DEFAULT_MAX_DEPTH};
pub use tokens::{Token, TokenStream};
pub use value::{comma_delimiter, parse_bool, split_chain, Delimiter};

// Input collaborators
pub use flagwright_input::{
    EnvReader, InputError, MockEnv, MockSecrets, RealEnv, SecretChain, SecretRequest,
    SecretSource,
};
