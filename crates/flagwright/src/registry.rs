//! Flag registry.
//!
//! Flags are stored in declaration order under their path-qualified
//! [`FlagKey`]. A secondary index maps `(path, short)` to the owning key.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::flag::{Flag, FlagKey};

/// Ordered mapping from flag key to flag definition.
#[derive(Debug, Default, Clone)]
pub struct FlagRegistry {
    flags: IndexMap<FlagKey, Flag>,
    shorts: HashMap<(String, String), FlagKey>,
}

impl FlagRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag.
    ///
    /// Fails if the name is empty, the key is already taken, the short name
    /// collides with another flag in the same scope, the short name is longer
    /// than one character while `posix` is set, or the flag's capacity,
    /// patterns or binding are invalid.
    pub fn register(&mut self, mut flag: Flag, posix: bool) -> Result<&Flag, ConfigError> {
        if flag.name().is_empty() {
            return Err(ConfigError::EmptyFlagName);
        }

        let key = flag.key();
        if self.flags.contains_key(&key) {
            return Err(ConfigError::DuplicateFlag {
                key: key.to_string(),
            });
        }

        if let Some(short) = flag.short_name() {
            if posix && short.chars().count() != 1 {
                return Err(ConfigError::NonPosixShort {
                    flag: key.to_string(),
                    short: short.to_string(),
                });
            }
            if let Some(existing) = self.shorts.get(&(key.path().to_string(), short.to_string()))
            {
                return Err(ConfigError::DuplicateShort {
                    short: short.to_string(),
                    existing: existing.to_string(),
                });
            }
        }

        flag.prepare()?;

        if let Some(short) = flag.short_name() {
            self.shorts
                .insert((key.path().to_string(), short.to_string()), key.clone());
        }

        tracing::debug!(flag = %key, kind = %flag.kind(), "registered flag");
        Ok(self.flags.entry(key).or_insert(flag))
    }

    /// Replace a registered flag with a new definition under the same key.
    ///
    /// On failure the previous definition stays in place.
    pub fn redefine(&mut self, flag: Flag, posix: bool) -> Result<&Flag, ConfigError> {
        let key = flag.key();
        let index = self
            .flags
            .get_index_of(&key)
            .ok_or_else(|| ConfigError::UnknownFlag {
                key: key.to_string(),
            })?;

        let previous = self.remove(&key).ok_or_else(|| ConfigError::UnknownFlag {
            key: key.to_string(),
        })?;

        let registered = self.register(flag, posix).map(|_| ());
        if let Err(err) = registered {
            self.reinsert(previous, index);
            return Err(err);
        }

        // Keep declaration order stable.
        let last = self.flags.len() - 1;
        self.flags.move_index(last, index);
        Ok(&self.flags[index])
    }

    fn reinsert(&mut self, flag: Flag, index: usize) {
        let key = flag.key();
        if let Some(short) = flag.short_name() {
            self.shorts
                .insert((key.path().to_string(), short.to_string()), key.clone());
        }
        self.flags.insert(key, flag);
        let last = self.flags.len() - 1;
        self.flags.move_index(last, index);
    }

    /// Remove a flag, returning its definition.
    pub fn remove(&mut self, key: &FlagKey) -> Option<Flag> {
        let flag = self.flags.shift_remove(key)?;
        if let Some(short) = flag.short_name() {
            self.shorts
                .remove(&(key.path().to_string(), short.to_string()));
        }
        Some(flag)
    }

    /// The flag registered under exactly this key.
    pub fn get(&self, key: &FlagKey) -> Option<&Flag> {
        self.flags.get(key)
    }

    /// Look a flag up by long name, trying `path` first and then the global
    /// scope.
    pub fn lookup(&self, name: &str, path: &str) -> Option<&Flag> {
        if !path.is_empty() {
            if let Some(flag) = self.flags.get(&FlagKey::scoped(path, name)) {
                return Some(flag);
            }
        }
        self.flags.get(&FlagKey::global(name))
    }

    /// The key of the flag with this short name in exactly this scope.
    pub fn short_in(&self, short: &str, path: &str) -> Option<&FlagKey> {
        self.shorts.get(&(path.to_string(), short.to_string()))
    }

    /// Look a flag up by short name, trying `path` first and then the global
    /// scope.
    pub fn lookup_short(&self, short: &str, path: &str) -> Option<&Flag> {
        let key = if path.is_empty() {
            self.short_in(short, "")
        } else {
            self.short_in(short, path).or_else(|| self.short_in(short, ""))
        }?;
        self.flags.get(key)
    }

    /// Every command path a flag name is scoped to, in declaration order.
    pub fn scopes_of(&self, name: &str) -> Vec<String> {
        self.flags
            .keys()
            .filter(|k| !k.is_global() && k.name() == name)
            .map(|k| k.path().to_string())
            .collect()
    }

    /// Every command path a short name is scoped to.
    pub fn scopes_of_short(&self, short: &str) -> Vec<String> {
        self.flags
            .values()
            .filter(|f| !f.path().is_empty() && f.short_name() == Some(short))
            .map(|f| f.path().to_string())
            .collect()
    }

    /// All flags in declaration order.
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    /// Flags scoped to exactly this path.
    pub fn flags_in<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Flag> + 'a {
        self.flags.values().filter(move |f| f.path() == path)
    }

    pub(crate) fn flags_mut(&mut self) -> impl Iterator<Item = &mut Flag> {
        self.flags.values_mut()
    }

    /// Whether a key is registered.
    pub fn contains(&self, key: &FlagKey) -> bool {
        self.flags.contains_key(key)
    }

    /// Number of registered flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no flags are registered.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
