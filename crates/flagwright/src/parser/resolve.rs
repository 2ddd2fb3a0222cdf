//! Turning a raw value into a stored one.
//!
//! Every value, whether typed by the user, spliced in from the environment,
//! supplied as a default or obtained for a secure flag, goes through
//! [`finalize`]: pre-filter, accepted-value check, post-filter, file read,
//! binding.

use crate::error::ParseError;
use crate::flag::{Flag, FlagKind};
use crate::value::{split_chain, Delimiter};

/// A value ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub value: String,
    /// The path a `File` flag was given, kept apart from the file content.
    pub file_path: Option<String>,
}

pub(crate) fn finalize(
    flag: &Flag,
    label: &str,
    slot: Option<usize>,
    raw: &str,
    delimiter: &Delimiter,
) -> Result<Resolved, ParseError> {
    let value = match flag.pre() {
        Some(f) => f(raw),
        None => raw.to_string(),
    };

    if !flag.accepts(&value) {
        return Err(ParseError::NotAccepted {
            flag: label.to_string(),
            value,
            expected: flag
                .accepted()
                .iter()
                .map(|a| {
                    if a.description().is_empty() {
                        a.pattern().to_string()
                    } else {
                        a.description().to_string()
                    }
                })
                .collect(),
        });
    }

    let mut value = match flag.post() {
        Some(f) => f(&value),
        None => value,
    };

    let mut file_path = None;
    if flag.kind() == FlagKind::File {
        let content = std::fs::read_to_string(&value).map_err(|e| ParseError::FileRead {
            flag: label.to_string(),
            path: value.clone(),
            reason: e.to_string(),
        })?;
        file_path = Some(std::mem::replace(&mut value, content));
    }

    if let Some(binding) = flag.binding() {
        let bound = match slot {
            Some(index) => binding.assign_slot(index, &value),
            None => binding.assign(&value, &|s: &str| split_chain(s, delimiter.as_ref())),
        };
        bound.map_err(|reason| ParseError::InvalidValue {
            flag: label.to_string(),
            value: value.clone(),
            reason,
        })?;
    }

    Ok(Resolved { value, file_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::Bound;
    use crate::value::comma_delimiter;
    use std::io::Write;

    fn prepared(flag: Flag) -> Flag {
        let mut flag = flag;
        flag.prepare().unwrap();
        flag
    }

    #[test]
    fn filters_wrap_the_accepted_check() {
        let flag = prepared(
            Flag::new("level")
                .accept("^info$", "info")
                .pre_filter(|s| s.to_lowercase())
                .post_filter(|s| format!("[{}]", s)),
        );
        let out = finalize(&flag, "level", None, "INFO", &comma_delimiter()).unwrap();
        assert_eq!(out.value, "[info]");
    }

    #[test]
    fn rejected_value_lists_descriptions() {
        let flag = prepared(Flag::new("level").accept("^info$", "info").accept("^debug$", ""));
        let err = finalize(&flag, "level", None, "loud", &comma_delimiter()).unwrap_err();
        match err {
            ParseError::NotAccepted { expected, .. } => {
                assert_eq!(expected, vec!["info", "^debug$"])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn binding_failure_is_invalid_value() {
        let n = Bound::new(0i64);
        let flag = prepared(Flag::new("n").bind(&n));
        let err = finalize(&flag, "n", None, "abc", &comma_delimiter()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { .. }));
    }

    #[test]
    fn file_content_replaces_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "hello").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let flag = prepared(Flag::new("config").file());
        let out = finalize(&flag, "config", None, &path, &comma_delimiter()).unwrap();
        assert_eq!(out.value, "hello");
        assert_eq!(out.file_path.as_deref(), Some(path.as_str()));
    }

    #[test]
    fn missing_file_is_reported() {
        let flag = prepared(Flag::new("config").file());
        let err = finalize(
            &flag,
            "config",
            None,
            "/definitely/not/here.txt",
            &comma_delimiter(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::FileRead { .. }));
    }
}
