//! Validation utilities for identity tokens

/// Validate an identity token
///
/// # Arguments
/// * `token` - The opaque per-user key (device identifier)
///
/// # Returns
/// true iff the token is exactly 16 characters, each a hex digit
/// (any case)
pub fn is_valid_identity(token: &str) -> bool {
    token.len() == 16 && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identities() {
        assert!(is_valid_identity("0123456789abcdef"));
        assert!(is_valid_identity("0123456789ABCDEF"));
        assert!(is_valid_identity("DeadBeefCafe0042"));
        assert!(is_valid_identity("0000000000000000"));
    }

    #[test]
    fn test_wrong_length() {
        assert!(!is_valid_identity(""));
        assert!(!is_valid_identity("0123456789abcde"));
        assert!(!is_valid_identity("0123456789abcdef0"));
    }

    #[test]
    fn test_non_hex_characters() {
        assert!(!is_valid_identity("0123456789abcdeg"));
        assert!(!is_valid_identity("0123456789abcde "));
        assert!(!is_valid_identity("g123456789abcdef"));
        assert!(!is_valid_identity("0123-56789abcdef"));
    }

    #[test]
    fn test_non_ascii() {
        // 16 caratteri ma non ASCII hex
        assert!(!is_valid_identity("àèìòù67890abcdef"));
    }
}
