/// Strips everything but ASCII letters and digits and uppercases the rest, so that
/// `56.10a`, `56 10 A` and `5610A` all compare equal.
pub fn normalize_sector_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// The NAF division: the first two consecutive digits of a normalized code.
pub(crate) fn division_of(normalized: &str) -> Option<&str> {
    let bytes = normalized.as_bytes();
    bytes
        .windows(2)
        .position(|pair| pair[0].is_ascii_digit() && pair[1].is_ascii_digit())
        .map(|start| &normalized[start..start + 2])
}
