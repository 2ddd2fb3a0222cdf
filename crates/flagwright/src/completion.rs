//! Flat grammar export for shell-completion generators.
//!
//! The parser does not write completion scripts. It hands out the registered
//! flags and commands in a flat, serializable shape that a generator can
//! consume.

use serde::Serialize;

use crate::flag::FlagKind;
use crate::parser::Parser;

/// One registered flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionFlag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    /// Command path the flag is scoped to; empty for globals.
    pub path: String,
    pub kind: FlagKind,
    pub takes_value: bool,
    pub required: bool,
    pub secure: bool,
    pub description: String,
    /// Descriptions of the accepted-value patterns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accepts: Vec<String>,
}

/// One registered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionCommand {
    pub path: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

/// Everything a completion generator needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionData {
    pub flags: Vec<CompletionFlag>,
    pub commands: Vec<CompletionCommand>,
}

impl CompletionData {
    /// Flags available under `path`: its own plus the globals.
    pub fn flags_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a CompletionFlag> {
        self.flags
            .iter()
            .filter(move |f| f.path.is_empty() || f.path == path)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Parser {
    /// Export the grammar for completion generators.
    pub fn completion_data(&self) -> CompletionData {
        let flags = self
            .registry()
            .flags()
            .map(|f| CompletionFlag {
                name: f.name().to_string(),
                short: f.short_name().map(str::to_string),
                path: f.path().to_string(),
                kind: f.kind(),
                takes_value: f.kind().takes_value(),
                required: f.is_required(),
                secure: f.is_secure(),
                description: f.description_text().to_string(),
                accepts: f
                    .accepted()
                    .iter()
                    .map(|a| a.description().to_string())
                    .collect(),
            })
            .collect();

        let tree = self.tree();
        let commands = tree
            .paths()
            .into_iter()
            .filter_map(|path| {
                let idx = tree.index_of(path)?;
                let node = tree.node(idx);
                Some(CompletionCommand {
                    path: node.path().to_string(),
                    name: node.name().to_string(),
                    description: node.description().to_string(),
                    children: tree.children(idx).map(|c| c.name().to_string()).collect(),
                })
            })
            .collect();

        CompletionData { flags, commands }
    }
}
