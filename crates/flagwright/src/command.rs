//! Command tree.
//!
//! Commands form a forest. Each node knows its full path, the ancestor chain
//! joined by a single space (`"user create"`). Nodes live in an arena and
//! refer to each other by index.
//!
//! ```
//! use flagwright::{Command, Parser};
//!
//! let mut parser = Parser::new();
//! parser
//!     .command(
//!         Command::new("user")
//!             .subcommand(Command::new("create"))
//!             .subcommand(Command::new("delete")),
//!     )
//!     .unwrap();
//!
//! assert!(parser.parse(["user", "create"]));
//! assert!(parser.has_command("user create"));
//! assert!(!parser.has_command("user delete"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::flag::FlagKey;

/// Separator between the names in a command path.
pub const PATH_SEPARATOR: char = ' ';

/// Hard cap on the number of nodes walked when registering one subtree.
pub const TRAVERSAL_LIMIT: usize = 100;

/// Callback attached to a command.
pub type Callback = Arc<dyn Fn(&CommandContext) -> anyhow::Result<()> + Send + Sync>;

/// Joins command names into a path string.
///
/// For example, `["user", "create"]` becomes `"user create"`.
pub fn path_to_string(path: &[String]) -> String {
    path.join(&PATH_SEPARATOR.to_string())
}

/// Splits a path string into command names.
///
/// For example, `"user create"` becomes `["user", "create"]`.
pub fn string_to_path(s: &str) -> Vec<String> {
    s.split(PATH_SEPARATOR)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// What a command callback sees when it runs.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The command path being executed (e.g., `["user", "create"]`).
    pub command_path: Vec<String>,

    /// Resolved flag values at the time the callback runs.
    pub options: IndexMap<FlagKey, String>,

    /// Positional arguments collected so far.
    pub positionals: Vec<String>,
}

impl CommandContext {
    /// The command path as a string.
    pub fn path(&self) -> String {
        path_to_string(&self.command_path)
    }

    /// Value of a flag, looked up under this command's path first and then
    /// globally.
    pub fn value(&self, name: &str) -> Option<&str> {
        let scoped = FlagKey::scoped(self.path(), name);
        self.options
            .get(&scoped)
            .or_else(|| self.options.get(&FlagKey::global(name)))
            .map(String::as_str)
    }
}

/// A command declaration, with its sub-commands.
#[derive(Clone, Default)]
pub struct Command {
    name: String,
    description: String,
    callback: Option<Callback>,
    subcommands: Vec<Command>,
}

impl Command {
    /// Start a command declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a sub-command.
    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    /// Attach a callback, run when this command is recognized.
    pub fn callback<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(f));
        self
    }

    /// The command name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("callback", &self.callback.is_some())
            .field("subcommands", &self.subcommands)
            .finish()
    }
}

/// A registered command.
#[derive(Clone)]
pub struct CommandNode {
    name: String,
    path: String,
    description: String,
    callback: Option<Callback>,
    children: Vec<usize>,
    parent: Option<usize>,
    depth: usize,
}

impl CommandNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn callback(&self) -> Option<&Callback> {
        self.callback.as_ref()
    }

    /// Whether the node is a root of the forest.
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// Number of names in the path; roots have depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("path", &self.path)
            .field("children", &self.children.len())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Forest of registered commands.
#[derive(Debug, Default, Clone)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    roots: Vec<usize>,
    by_path: HashMap<String, usize>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level command and its whole subtree.
    pub fn register(&mut self, command: Command, max_depth: usize) -> Result<(), ConfigError> {
        self.insert_subtree(None, command, max_depth)
    }

    /// Register a command subtree under an existing path.
    pub fn register_under(
        &mut self,
        parent: &str,
        command: Command,
        max_depth: usize,
    ) -> Result<(), ConfigError> {
        let parent_path = string_to_path(parent);
        let idx = *self
            .by_path
            .get(&path_to_string(&parent_path))
            .ok_or_else(|| ConfigError::UnknownCommand {
                path: parent.to_string(),
            })?;
        self.insert_subtree(Some(idx), command, max_depth)
    }

    fn insert_subtree(
        &mut self,
        parent: Option<usize>,
        command: Command,
        max_depth: usize,
    ) -> Result<(), ConfigError> {
        let base: Vec<String> = parent
            .map(|p| string_to_path(&self.nodes[p].path))
            .unwrap_or_default();

        self.validate(&base, &command, max_depth)?;

        let mut stack = vec![(parent, command)];
        while let Some((parent, command)) = stack.pop() {
            let idx = self.push_node(parent, &command);
            // Reverse so children keep declaration order once popped.
            for sub in command.subcommands.into_iter().rev() {
                stack.push((Some(idx), sub));
            }
        }
        Ok(())
    }

    /// Check a whole subtree before touching the tree.
    fn validate(
        &self,
        base: &[String],
        command: &Command,
        max_depth: usize,
    ) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        let mut visited = 0usize;
        let mut stack: Vec<(Vec<String>, &Command)> = vec![(base.to_vec(), command)];

        while let Some((prefix, cmd)) = stack.pop() {
            visited += 1;
            if visited > TRAVERSAL_LIMIT {
                return Err(ConfigError::TraversalLimit {
                    limit: TRAVERSAL_LIMIT,
                });
            }

            if cmd.name.is_empty() || cmd.name.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidCommandName {
                    name: cmd.name.clone(),
                });
            }

            let mut names = prefix;
            names.push(cmd.name.clone());
            let path = path_to_string(&names);

            if names.len() > max_depth {
                return Err(ConfigError::DepthExceeded {
                    path,
                    depth: names.len(),
                    max: max_depth,
                });
            }
            if self.by_path.contains_key(&path) || !seen.insert(path.clone()) {
                return Err(ConfigError::DuplicateCommand { path });
            }

            for sub in &cmd.subcommands {
                stack.push((names.clone(), sub));
            }
        }
        Ok(())
    }

    fn push_node(&mut self, parent: Option<usize>, command: &Command) -> usize {
        let (path, depth) = match parent {
            Some(p) => (
                format!("{}{}{}", self.nodes[p].path, PATH_SEPARATOR, command.name),
                self.nodes[p].depth + 1,
            ),
            None => (command.name.clone(), 1),
        };

        let idx = self.nodes.len();
        self.nodes.push(CommandNode {
            name: command.name.clone(),
            path: path.clone(),
            description: command.description.clone(),
            callback: command.callback.clone(),
            children: Vec::new(),
            parent,
            depth,
        });

        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.roots.push(idx),
        }
        tracing::debug!(path = %path, "registered command");
        self.by_path.insert(path, idx);
        idx
    }

    /// The node at `idx`.
    pub fn node(&self, idx: usize) -> &CommandNode {
        &self.nodes[idx]
    }

    /// The node registered at `path`.
    pub fn find(&self, path: &str) -> Option<&CommandNode> {
        self.index_of(path).map(|i| &self.nodes[i])
    }

    pub(crate) fn index_of(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// Whether `path` is registered.
    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Top-level commands in declaration order.
    pub fn roots(&self) -> impl Iterator<Item = &CommandNode> {
        self.roots.iter().map(|&i| &self.nodes[i])
    }

    /// Children of the node at `idx`, in declaration order.
    pub fn children(&self, idx: usize) -> impl Iterator<Item = &CommandNode> {
        self.nodes[idx].children.iter().map(|&i| &self.nodes[i])
    }

    /// The top-level command named `token`.
    pub fn match_root(&self, token: &str) -> Option<usize> {
        self.roots
            .iter()
            .copied()
            .find(|&i| self.nodes[i].name == token)
    }

    /// The child of `parent` named `token`.
    pub fn match_child(&self, parent: usize, token: &str) -> Option<usize> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&i| self.nodes[i].name == token)
    }

    /// Every path, depth-first in declaration order.
    pub fn paths(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            out.push(self.nodes[i].path.as_str());
            stack.extend(self.nodes[i].children.iter().rev().copied());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
