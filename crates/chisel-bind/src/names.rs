//! Identifier transforms for binding generation
//!
//! This module provides the string functions used to normalize C identifiers
//! (prefixed, SCREAMING_SNAKE_CASE) into C# naming conventions, plus the
//! ordered replacement table used as a final cleanup pass over renamed
//! symbols.
//!
//! All functions are pure, never panic on empty input, and are idempotent
//! on already-normalized strings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Uppercase the first letter of an identifier.
///
/// No-op if the string is empty or already starts with an uppercase (or
/// non-lowercase) character. The rest of the string is left untouched.
///
/// # Examples
///
/// ```
/// use chisel_bind::names::capitalize;
///
/// assert_eq!(capitalize("context"), "Context");
/// assert_eq!(capitalize("Context"), "Context");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => {
            let mut result = String::with_capacity(text.len());
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
            result
        }
        _ => text.to_string(),
    }
}

/// Remove a literal prefix from an identifier.
///
/// No-op if the string does not start with the prefix.
pub fn strip_prefix<'a>(text: &'a str, prefix: &str) -> &'a str {
    text.strip_prefix(prefix).unwrap_or(text)
}

/// Remove a literal suffix from an identifier.
///
/// No-op if the string does not end with the suffix.
pub fn strip_suffix<'a>(text: &'a str, suffix: &str) -> &'a str {
    text.strip_suffix(suffix).unwrap_or(text)
}

/// Remove everything up to and including the first occurrence of a
/// separator character.
///
/// No-op if the separator does not occur.
///
/// # Examples
///
/// ```
/// use chisel_bind::names::strip_through_separator;
///
/// assert_eq!(strip_through_separator("LIBVERSION_MAJOR", '_'), "MAJOR");
/// assert_eq!(strip_through_separator("plain", '_'), "plain");
/// ```
pub fn strip_through_separator(text: &str, separator: char) -> &str {
    match text.find(separator) {
        Some(idx) => &text[idx + separator.len_utf8()..],
        None => text,
    }
}

/// Convert a separator-delimited identifier to UpperCamelCase.
///
/// Splits on the separator, title-cases each non-empty segment (first
/// letter uppercased, the rest lowercased), and concatenates the segments
/// without separators. Empty segments contribute nothing, so repeated
/// separators collapse.
///
/// # Examples
///
/// ```
/// use chisel_bind::names::snake_to_camel;
///
/// assert_eq!(snake_to_camel("foo_bar_baz", '_'), "FooBarBaz");
/// assert_eq!(snake_to_camel("SIMDLEVEL_NEON", '_'), "SimdlevelNeon");
/// assert_eq!(snake_to_camel("foo__bar", '_'), "FooBar");
/// ```
pub fn snake_to_camel(text: &str, separator: char) -> String {
    let mut result = String::with_capacity(text.len());

    for segment in text.split(separator) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            for c in chars {
                result.extend(c.to_lowercase());
            }
        }
    }

    result
}

/// Ordered literal-substring replacement table.
///
/// Used as a final cleanup pass over renamed symbols to fix casing
/// artifacts the mechanical transforms cannot know about ("Outofmemory" →
/// "OutOfMemory"). Order is significant: later entries operate on the
/// string already produced by earlier ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameReplacementTable {
    /// Replacement pairs in application order.
    entries: IndexMap<String, String>,
}

impl NameReplacementTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a replacement pair, keeping insertion order.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.entries.insert(from.into(), to.into());
    }

    /// Builder-style insertion.
    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.insert(from, to);
        self
    }

    /// Number of replacement pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every replacement, in order, to the given name.
    pub fn apply(&self, name: &str) -> String {
        let mut result = name.to_string();
        for (from, to) in &self.entries {
            result = result.replace(from.as_str(), to.as_str());
        }
        result
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NameReplacementTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("context"), "Context");
        assert_eq!(capitalize("Context"), "Context");
        assert_eq!(capitalize("_x"), "_x");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_capitalize_idempotent() {
        let once = capitalize("audioBuffer");
        assert_eq!(capitalize(&once), once);
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("IPLContext", "IPL"), "Context");
        assert_eq!(strip_prefix("Context", "IPL"), "Context");
        assert_eq!(strip_prefix("", "IPL"), "");
    }

    #[test]
    fn test_strip_prefix_idempotent() {
        let once = strip_prefix("IPLContext", "IPL");
        assert_eq!(strip_prefix(once, "IPL"), once);
    }

    #[test]
    fn test_strip_suffix() {
        assert_eq!(strip_suffix("_IPLContext_t", "_t"), "_IPLContext");
        assert_eq!(strip_suffix("Context", "_t"), "Context");
    }

    #[test]
    fn test_strip_through_separator() {
        assert_eq!(strip_through_separator("LIBVERSION_MAJOR", '_'), "MAJOR");
        assert_eq!(
            strip_through_separator("STEAMAUDIO_VERSION_MAJOR", '_'),
            "VERSION_MAJOR"
        );
        assert_eq!(strip_through_separator("plain", '_'), "plain");
        assert_eq!(strip_through_separator("", '_'), "");
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("foo_bar_baz", '_'), "FooBarBaz");
        assert_eq!(snake_to_camel("VERSION_MAJOR", '_'), "VersionMajor");
        assert_eq!(snake_to_camel("SIMDLEVEL_NEON", '_'), "SimdlevelNeon");
    }

    #[test]
    fn test_snake_to_camel_collapses_repeated_separators() {
        assert_eq!(snake_to_camel("foo__bar", '_'), "FooBar");
        assert_eq!(snake_to_camel("_leading", '_'), "Leading");
        assert_eq!(snake_to_camel("trailing_", '_'), "Trailing");
        assert_eq!(snake_to_camel("", '_'), "");
    }

    #[test]
    fn test_replacement_table_order_matters() {
        // The second entry operates on the output of the first.
        let table = NameReplacementTable::new()
            .with("Freqindependent", "FrequencyIndependent")
            .with("Frequency", "Freq");

        assert_eq!(table.apply("Freqindependent"), "FreqIndependent");
    }

    #[test]
    fn test_replacement_table_apply() {
        let table = NameReplacementTable::new()
            .with("HRTF", "Hrtf")
            .with("SIMD", "Simd");

        assert_eq!(table.apply("HRTFSettings"), "HrtfSettings");
        assert_eq!(table.apply("SIMDLevel"), "SimdLevel");
        assert_eq!(table.apply("Distance"), "Distance");
    }
}
