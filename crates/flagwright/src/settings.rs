//! Parser settings.

/// Default maximum command-tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default bound on dependency recursion.
pub const DEFAULT_DEPENDENCY_DEPTH: usize = 10;

/// Behavior switches fixed when the parser is built.
///
/// Use [`Parser::builder`](crate::Parser::builder) to change them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Split `-abc` into `-a -b -c` and require single-character short names.
    pub posix: bool,
    /// Characters that introduce a flag.
    pub prefixes: Vec<char>,
    /// Maximum command-tree depth.
    pub max_depth: usize,
    /// Maximum dependency recursion depth.
    pub dependency_depth: usize,
    /// Run command callbacks during the pass instead of queueing them.
    pub eager_callbacks: bool,
    /// Prefix used to derive environment variable names for every flag.
    pub env_prefix: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            posix: false,
            prefixes: vec!['-'],
            max_depth: DEFAULT_MAX_DEPTH,
            dependency_depth: DEFAULT_DEPENDENCY_DEPTH,
            eager_callbacks: false,
            env_prefix: None,
        }
    }
}

impl Settings {
    pub(crate) fn is_prefix(&self, c: char) -> bool {
        self.prefixes.contains(&c)
    }

    /// The long-flag form of `name`, using the first prefix.
    pub(crate) fn long_form(&self, name: &str) -> String {
        let p = self.prefixes.first().copied().unwrap_or('-');
        format!("{p}{p}{name}")
    }
}
