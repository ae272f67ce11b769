//! Field name cleaning for metric path segments

use regex::Regex;
use std::sync::LazyLock;

/// Any character in the Unicode dash punctuation category
static DASH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Pd}").expect("valid regex"));

/// Normalize a key value or column name for use in a metric path.
///
/// With `enabled`, every Unicode dash becomes an ASCII `-` and every
/// underscore becomes a space. Dashes render inconsistently in monitoring
/// UIs, underscores read poorly in metric trees. Without `enabled` the input
/// is returned unchanged.
///
/// Cleaning is idempotent.
pub fn clean_field_name(name: &str, enabled: bool) -> String {
    if !enabled {
        return name.to_string();
    }
    DASH_REGEX.replace_all(name, "-").replace('_', " ")
}
