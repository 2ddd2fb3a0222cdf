//! Error types for grammar configuration, parsing and value retrieval.
//!
//! Three families of failure exist and they travel differently:
//!
//! - [`ConfigError`] is returned synchronously from registration calls.
//! - [`ParseError`] is accumulated during a parse. Parsing keeps consuming
//!   tokens after one, and the parse as a whole reports failure.
//! - [`ValueError`] comes from the typed getters after a parse.
//!
//! Dependency warnings ([`DependencyWarning`](crate::DependencyWarning)) and
//! command callback errors are not errors in this sense; they never affect
//! whether a parse succeeded.

use flagwright_input::InputError;
use thiserror::Error;

/// Errors raised while declaring the grammar.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A flag was registered with an empty name.
    #[error("flag name must not be empty")]
    EmptyFlagName,

    /// The path-qualified flag key is already registered.
    #[error("flag '{key}' is already registered")]
    DuplicateFlag { key: String },

    /// The short name is already used by another flag in the same scope.
    #[error("short name '{short}' is already used by flag '{existing}'")]
    DuplicateShort { short: String, existing: String },

    /// A short name longer than one character was registered in POSIX mode.
    #[error("short name '{short}' of flag '{flag}' must be a single character in POSIX mode")]
    NonPosixShort { flag: String, short: String },

    /// A fixed-size slot capacity was negative.
    #[error("flag '{flag}' has invalid capacity {capacity}")]
    InvalidCapacity { flag: String, capacity: i64 },

    /// An accepted-value pattern failed to compile.
    #[error("flag '{flag}' has an invalid accepted-value pattern: {source}")]
    InvalidPattern {
        flag: String,
        #[source]
        source: regex::Error,
    },

    /// The flag's binding cannot hold what the flag was configured for.
    #[error("flag '{flag}' cannot be bound: {reason}")]
    Binding { flag: String, reason: String },

    /// A command was declared with an empty or whitespace-containing name.
    #[error("invalid command name '{name}'")]
    InvalidCommandName { name: String },

    /// Two commands would share the same path.
    #[error("command path '{path}' is already registered")]
    DuplicateCommand { path: String },

    /// The command tree is deeper than the configured maximum.
    #[error("command path '{path}' has depth {depth}, exceeding the maximum of {max}")]
    DepthExceeded {
        path: String,
        depth: usize,
        max: usize,
    },

    /// The command subtree exceeds the hard traversal limit.
    #[error("command tree exceeds the traversal limit of {limit}")]
    TraversalLimit { limit: usize },

    /// A referenced command path does not exist.
    #[error("unknown command path '{path}'")]
    UnknownCommand { path: String },

    /// A referenced flag does not exist.
    #[error("unknown flag '{key}'")]
    UnknownFlag { key: String },
}

/// Errors accumulated during a single parse.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No flag with this name exists in any scope.
    #[error("flag not found: {flag}")]
    UnknownFlag { flag: String },

    /// The flag exists, but only under commands that are not active.
    #[error("flag {flag} is only valid after command(s): {}", .paths.join(", "))]
    OutOfScope { flag: String, paths: Vec<String> },

    /// The flag needs a value but the stream ended.
    #[error("flag {flag} requires a value")]
    MissingValue { flag: String },

    /// The value matched none of the flag's accepted-value patterns.
    #[error("value '{value}' is not accepted by {flag}; expected {}", .expected.join(" or "))]
    NotAccepted {
        flag: String,
        value: String,
        expected: Vec<String>,
    },

    /// The value could not be coerced to the flag's type.
    #[error("invalid value '{value}' for {flag}: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },

    /// A combined short-flag token could not be split in POSIX mode.
    #[error("'{token}' is not POSIX compatible: every character must be a registered short flag")]
    PosixIncompatible { token: String },

    /// An indexed slot was addressed beyond the flag's capacity.
    #[error("index {index} is out of range for {flag} (capacity {capacity})")]
    IndexOutOfRange {
        flag: String,
        index: usize,
        capacity: i64,
    },

    /// A required flag was never given and has no default.
    #[error("required flag {flag} was not provided")]
    MissingRequired { flag: String },

    /// The file named by a `File` flag could not be read.
    #[error("cannot read file '{path}' for {flag}: {reason}")]
    FileRead {
        flag: String,
        path: String,
        reason: String,
    },

    /// The raw command line could not be split into tokens.
    #[error("cannot tokenize command line: {reason}")]
    Tokenize { reason: String },

    /// Resolving a secure flag failed.
    #[error("cannot resolve secure flag {flag}: {source}")]
    Secure {
        flag: String,
        #[source]
        source: InputError,
    },
}

impl ParseError {
    /// The flag this error is about, if any.
    pub fn flag(&self) -> Option<&str> {
        match self {
            Self::UnknownFlag { flag }
            | Self::OutOfScope { flag, .. }
            | Self::MissingValue { flag }
            | Self::NotAccepted { flag, .. }
            | Self::InvalidValue { flag, .. }
            | Self::IndexOutOfRange { flag, .. }
            | Self::MissingRequired { flag }
            | Self::FileRead { flag, .. }
            | Self::Secure { flag, .. } => Some(flag),
            Self::PosixIncompatible { .. } | Self::Tokenize { .. } => None,
        }
    }
}

/// Errors from the typed value getters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    /// The flag has no resolved value and no default.
    #[error("flag '{flag}' has no value")]
    Missing { flag: String },

    /// The value does not convert to the requested type.
    #[error("value '{value}' of flag '{flag}' is not a valid {expected}")]
    Invalid {
        flag: String,
        value: String,
        expected: &'static str,
    },
}
