// src/utils/hash.rs

/// Polynomial rolling hash (multiplier 31) over UTF-16 code units, wrapping at 32 bits.
///
/// Hashing code units rather than bytes keeps seeds identical to the ones the
/// browser client derives for the same identity.
pub fn rolling_hash(input: &str) -> u32 {
    input
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Trims whitespace and U+FEFF from both ends, as the browser's `String.trim` does.
pub fn trim_identity(field: &str) -> &str {
    field.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Derives the session seed from a student's identity fields.
///
/// Both fields are trimmed and concatenated before hashing, so surrounding
/// whitespace never changes the shuffle a student sees.
pub fn identity_seed(name: &str, handle: &str) -> u32 {
    let mut identity = String::with_capacity(name.len() + handle.len());
    identity.push_str(trim_identity(name));
    identity.push_str(trim_identity(handle));
    rolling_hash(&identity)
}
