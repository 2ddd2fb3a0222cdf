//! Dependency validation.
//!
//! A flag may declare companions it needs: another flag that must be present,
//! optionally with one of a set of values. After a parse every resolved flag's
//! declarations are checked. Problems become [`DependencyWarning`]s; they are
//! advisory and never make a parse fail.
//!
//! Declarations can form cycles. Each `(flag, companion)` pair is checked at
//! most once per parse and recursion stops at a configured depth, so a
//! cyclic graph terminates.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::flag::FlagKey;
use crate::registry::FlagRegistry;

/// What is wrong with a companion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyIssue {
    /// The companion was never given.
    Missing,
    /// The companion's value is not one of the allowed ones.
    Mismatch {
        expected: Vec<String>,
        actual: String,
    },
}

/// An unmet dependency between two flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyWarning {
    pub flag: FlagKey,
    pub companion: FlagKey,
    pub issue: DependencyIssue,
}

impl fmt::Display for DependencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            DependencyIssue::Missing => write!(
                f,
                "flag {} depends on {}, which was not provided",
                self.flag, self.companion
            ),
            DependencyIssue::Mismatch { expected, actual } => write!(
                f,
                "flag {} depends on {} being {}, but it is '{}'",
                self.flag,
                self.companion,
                expected.join(" or "),
                actual
            ),
        }
    }
}

struct Walk<'a> {
    registry: &'a FlagRegistry,
    options: &'a IndexMap<FlagKey, String>,
    max_depth: usize,
    checked: HashSet<(FlagKey, FlagKey)>,
    warnings: Vec<DependencyWarning>,
}

/// Check the dependency declarations of every resolved flag.
pub fn validate(
    registry: &FlagRegistry,
    options: &IndexMap<FlagKey, String>,
    max_depth: usize,
) -> Vec<DependencyWarning> {
    let mut walk = Walk {
        registry,
        options,
        max_depth,
        checked: HashSet::new(),
        warnings: Vec::new(),
    };

    for key in options.keys() {
        let key = match key.split_slot() {
            Some((base, _)) if !registry.contains(key) => base,
            _ => key.clone(),
        };
        walk.visit(&key, 0);
    }

    walk.warnings
}

impl Walk<'_> {
    fn visit(&mut self, key: &FlagKey, depth: usize) {
        if depth >= self.max_depth {
            tracing::debug!(flag = %key, depth, "dependency depth limit reached");
            return;
        }
        let registry = self.registry;
        let Some(flag) = registry.get(key) else {
            return;
        };

        for (companion, allowed) in flag.dependencies() {
            let companion = self.resolve_companion(key, companion);
            if !self.checked.insert((key.clone(), companion.clone())) {
                continue;
            }

            let issue = match self.options.get(&companion) {
                None => Some(DependencyIssue::Missing),
                Some(actual) if !allowed.is_empty() && !matches_any(actual, allowed) => {
                    Some(DependencyIssue::Mismatch {
                        expected: allowed.clone(),
                        actual: actual.clone(),
                    })
                }
                Some(_) => None,
            };

            match issue {
                Some(issue) => {
                    let warning = DependencyWarning {
                        flag: key.clone(),
                        companion,
                        issue,
                    };
                    tracing::warn!(%warning, "unmet flag dependency");
                    self.warnings.push(warning);
                }
                None => self.visit(&companion, depth + 1),
            }
        }
    }

    /// A global companion name refers to the dependent's own scope when a
    /// flag of that name exists there.
    fn resolve_companion(&self, dependent: &FlagKey, companion: &FlagKey) -> FlagKey {
        if companion.is_global() && !dependent.is_global() {
            let scoped = FlagKey::scoped(dependent.path(), companion.name());
            if self.registry.contains(&scoped) {
                return scoped;
            }
        }
        companion.clone()
    }
}

fn matches_any(actual: &str, allowed: &[String]) -> bool {
    let actual = actual.to_lowercase();
    allowed.iter().any(|a| a.to_lowercase() == actual)
}
