//! Conversions between raw flag values and typed values.

use std::sync::Arc;

/// Predicate deciding which characters separate the items of a `Chained` value.
pub type Delimiter = Arc<dyn Fn(char) -> bool + Send + Sync>;

/// The default chain delimiter: a comma.
pub fn comma_delimiter() -> Delimiter {
    Arc::new(|c| c == ',')
}

/// Parse a boolean the way command lines spell them.
///
/// Accepts `1`, `t`, `true`, `0`, `f`, `false` in any letter case.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Split a `Chained` value into its items, dropping empty pieces.
pub fn split_chain(raw: &str, delimiter: &(dyn Fn(char) -> bool + Send + Sync)) -> Vec<String> {
    raw.split(|c| delimiter(c))
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a token looks like a number rather than a short flag (`-5`, `-0.25`).
/// Only digit-led text counts, so `nan` and `inf` stay flag names.
pub(crate) fn is_numeric(raw: &str) -> bool {
    raw.starts_with(|c: char| c.is_ascii_digit() || c == '.') && raw.parse::<f64>().is_ok()
}
