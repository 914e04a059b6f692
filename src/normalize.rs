//! Name normalization used to build fuzzy-matchable keys for tracks and artists.

/// Lower-cases `s`, drops everything that is not a letter, digit or whitespace,
/// collapses whitespace runs into a single space and trims the result.
///
/// `None` and `""` both normalize to the empty string.
pub fn normalize(s: Option<&str>) -> String {
    let Some(s) = s else {
        return String::new();
    };

    let kept: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convenience wrapper for the common non-optional case.
pub fn normalize_str(s: &str) -> String {
    normalize(Some(s))
}
