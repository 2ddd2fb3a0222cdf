//! Deferred resolution of secure flags.
//!
//! During the pass the engine only records that a secure flag is wanted,
//! optionally with a value seeded from the command line or the environment
//! ([`SecureCandidates`]). Once the pass finished without hard errors,
//! [`process`] turns the candidates into values ([`SecureResolved`]) by
//! asking a [`SecretSource`] for whatever was not seeded. The candidates are
//! consumed in the process.

use flagwright_input::{derive_var_name, InputError, SecretRequest, SecretSource};
use indexmap::IndexMap;

use crate::error::ParseError;
use crate::flag::FlagKey;
use crate::parser::resolve::{finalize, Resolved};
use crate::registry::FlagRegistry;
use crate::value::Delimiter;

/// Secure flags wanted by the current parse, with optional seeded values.
#[derive(Default)]
pub(crate) struct SecureCandidates {
    wanted: IndexMap<FlagKey, Option<String>>,
}

impl SecureCandidates {
    /// The flag appeared without a value.
    pub fn mark_present(&mut self, key: FlagKey) {
        self.wanted.entry(key).or_insert(None);
    }

    /// The flag has a value already; later seeds win.
    pub fn seed(&mut self, key: FlagKey, value: String) {
        self.wanted.insert(key, Some(value));
    }

    pub fn contains(&self, key: &FlagKey) -> bool {
        self.wanted.contains_key(key)
    }

    fn take(&mut self, key: &FlagKey) -> Option<Option<String>> {
        self.wanted.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.wanted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wanted.is_empty()
    }
}

/// Values obtained for secure flags, in declaration order.
#[derive(Default)]
pub(crate) struct SecureResolved {
    pub values: IndexMap<FlagKey, Resolved>,
}

/// Where secure values come from.
pub(crate) struct SecureInputs<'a> {
    pub secrets: &'a dyn SecretSource,
    pub env_prefix: Option<&'a str>,
    pub delimiter: &'a Delimiter,
}

/// Resolve every candidate, plus required secure flags whose scope is
/// active, in declaration order.
pub(crate) fn process(
    registry: &FlagRegistry,
    mut candidates: SecureCandidates,
    scope_active: impl Fn(&str) -> bool,
    inputs: SecureInputs<'_>,
) -> (SecureResolved, Vec<ParseError>) {
    let mut resolved = SecureResolved::default();
    let mut errors = Vec::new();

    for flag in registry.flags().filter(|f| f.is_secure()) {
        let key = flag.key();
        let seeded = match candidates.take(&key) {
            Some(seeded) => seeded,
            None if flag.is_required() && scope_active(flag.path()) => None,
            None => continue,
        };
        let label = key.to_string();

        let raw = match seeded {
            Some(value) => Some(value),
            None => {
                let mut request =
                    SecretRequest::new(label.clone(), flag.secure_prompt().unwrap_or_default());
                let var = flag.env_var().map(str::to_string).or_else(|| {
                    inputs
                        .env_prefix
                        .map(|p| derive_var_name(p, flag.path(), flag.name()))
                });
                if let Some(var) = var {
                    request = request.with_env(var);
                }

                tracing::debug!(flag = %key, source = inputs.secrets.name(), "reading secure value");
                match inputs.secrets.read_secret(&request) {
                    Ok(value) => value,
                    Err(source) => {
                        errors.push(ParseError::Secure {
                            flag: label,
                            source,
                        });
                        continue;
                    }
                }
            }
        };

        let Some(raw) = raw.or_else(|| flag.default_value().map(str::to_string)) else {
            errors.push(ParseError::Secure {
                flag: label.clone(),
                source: InputError::NoInput(label),
            });
            continue;
        };

        match finalize(flag, &label, None, &raw, inputs.delimiter) {
            Ok(value) => {
                resolved.values.insert(key, value);
            }
            Err(err) => errors.push(err),
        }
    }

    if !candidates.is_empty() {
        tracing::debug!(
            leftover = candidates.len(),
            "dropping secure candidates with no matching flag"
        );
    }

    (resolved, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::Flag;
    use crate::value::comma_delimiter;
    use flagwright_input::MockSecrets;

    fn registry(flags: Vec<Flag>) -> FlagRegistry {
        let mut reg = FlagRegistry::new();
        for flag in flags {
            reg.register(flag, false).unwrap();
        }
        reg
    }

    fn run(
        reg: &FlagRegistry,
        candidates: SecureCandidates,
        secrets: &MockSecrets,
    ) -> (SecureResolved, Vec<ParseError>) {
        let delimiter = comma_delimiter();
        process(
            reg,
            candidates,
            |path| path.is_empty(),
            SecureInputs {
                secrets,
                env_prefix: None,
                delimiter: &delimiter,
            },
        )
    }

    #[test]
    fn seeded_value_skips_the_source() {
        let reg = registry(vec![Flag::new("password").secure("Password: ")]);
        let mut candidates = SecureCandidates::default();
        candidates.seed(FlagKey::global("password"), "from-env".into());

        let (resolved, errors) = run(&reg, candidates, &MockSecrets::new().failing("password"));
        assert!(errors.is_empty());
        assert_eq!(
            resolved.values[&FlagKey::global("password")].value,
            "from-env"
        );
    }

    #[test]
    fn present_flag_asks_the_source() {
        let reg = registry(vec![Flag::new("password").secure("Password: ")]);
        let mut candidates = SecureCandidates::default();
        candidates.mark_present(FlagKey::global("password"));

        let secrets = MockSecrets::new().with("password", "s3cret");
        let (resolved, errors) = run(&reg, candidates, &secrets);
        assert!(errors.is_empty());
        assert_eq!(resolved.values[&FlagKey::global("password")].value, "s3cret");
    }

    #[test]
    fn absent_optional_flag_is_skipped() {
        let reg = registry(vec![Flag::new("password").secure("Password: ")]);
        let (resolved, errors) = run(&reg, SecureCandidates::default(), &MockSecrets::new());
        assert!(errors.is_empty());
        assert!(resolved.values.is_empty());
    }

    #[test]
    fn required_flag_without_input_fails() {
        let reg = registry(vec![Flag::new("password").secure("Password: ").required()]);
        let (_, errors) = run(&reg, SecureCandidates::default(), &MockSecrets::new());
        assert!(matches!(
            &errors[..],
            [ParseError::Secure {
                source: InputError::NoInput(_),
                ..
            }]
        ));
    }

    #[test]
    fn default_covers_missing_input() {
        let reg = registry(vec![Flag::new("token")
            .secure("Token: ")
            .required()
            .default("anonymous")]);
        let (resolved, errors) = run(&reg, SecureCandidates::default(), &MockSecrets::new());
        assert!(errors.is_empty());
        assert_eq!(resolved.values[&FlagKey::global("token")].value, "anonymous");
    }

    #[test]
    fn source_failure_is_reported() {
        let reg = registry(vec![Flag::new("password").secure("Password: ")]);
        let mut candidates = SecureCandidates::default();
        candidates.mark_present(FlagKey::global("password"));

        let (_, errors) = run(&reg, candidates, &MockSecrets::new().failing("password"));
        assert!(matches!(
            &errors[..],
            [ParseError::Secure {
                source: InputError::PromptCancelled,
                ..
            }]
        ));
    }

    #[test]
    fn secure_values_pass_accepted_check() {
        let reg = registry(vec![Flag::new("pin")
            .secure("PIN: ")
            .accept("^[0-9]{4}$", "four digits")]);
        let mut candidates = SecureCandidates::default();
        candidates.seed(FlagKey::global("pin"), "12ab".into());

        let (_, errors) = run(&reg, candidates, &MockSecrets::new());
        assert!(matches!(&errors[..], [ParseError::NotAccepted { .. }]));
    }
}
