use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<[^>]+>").expect("tag pattern is valid");
    static ref WHITESPACE: Regex = Regex::new(r"[\s\x1c-\x1f]+").expect("whitespace pattern is valid");
}

/// Normalizes ticket text before it is handed to any model.
///
/// Lower-cases the input, replaces anything that looks like an HTML tag with
/// a space, collapses whitespace runs into a single space and trims the ends.
/// The ASCII file, group, record and unit separators count as whitespace.
/// The function is total and idempotent.
///
/// # Example
/// ```
/// use helpsort::normalize;
///
/// assert_eq!(normalize("<b>Hi</b>  there"), "hi there");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let untagged = TAG.replace_all(&lowered, " ");
    let collapsed = WHITESPACE.replace_all(&untagged, " ");
    collapsed.trim().to_string()
}

/// Normalizes any displayable value through its string form.
pub fn normalize_display(value: impl Display) -> String {
    normalize(&value.to_string())
}
