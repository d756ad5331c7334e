/// Strips byte-order marks and zero-width spaces and collapses runs of
/// whitespace, keeping case.
pub(crate) fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased alphanumerics only, for matching header cells.
pub(crate) fn header_key(value: &str) -> String {
    normalize_name(value)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
