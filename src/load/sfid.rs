//! Local checksum validation for 18-character record ids.
//!
//! The last three characters of an 18-character id encode the letter case of
//! the first fifteen. Passing this check only means a value is shaped like an
//! id; whether the org knows it is settled by the batch reference check.

use once_cell::sync::Lazy;
use regex::Regex;

static ID_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-zA-Z0-9]{18}$").expect("id format regex is valid"));

const CHECKSUM_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";

/// Checksum suffix for the first 15 characters of an id.
fn checksum(prefix: &[u8]) -> [u8; 3] {
    let mut suffix = [0u8; 3];
    for (group, chunk) in prefix.chunks(5).take(3).enumerate() {
        let mask = chunk
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_ascii_uppercase())
            .fold(0usize, |acc, (i, _)| acc | (1 << i));
        suffix[group] = CHECKSUM_ALPHABET[mask];
    }
    suffix
}

/// True when `input` is 18 alphanumeric characters with a matching checksum.
pub fn is_valid_id(input: &str) -> bool {
    if !ID_FORMAT.is_match(input) {
        return false;
    }
    let bytes = input.as_bytes();
    checksum(&bytes[..15]) == bytes[15..18]
}

/// Extend a 15-character id to its 18-character form.
pub fn to_18(id: &str) -> Option<String> {
    if id.len() != 15 || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    let suffix = checksum(id.as_bytes());
    let mut out = String::with_capacity(18);
    out.push_str(id);
    out.extend(suffix.iter().map(|&b| b as char));
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("001000000000001AAA"));
        assert!(is_valid_id("0015g00000AbCdEAAV"));
        assert!(is_valid_id("ABCDEABCDEABCDE555"));
    }

    #[test]
    fn test_flipped_checksum_case_is_invalid() {
        assert!(!is_valid_id("0015g00000AbCdEAAv"));
        assert!(!is_valid_id("001000000000001aAA"));
    }

    #[test]
    fn test_case_change_in_body_is_invalid() {
        assert!(!is_valid_id("0015g00000abCdEAAV"));
    }

    #[test]
    fn test_wrong_shape_is_invalid() {
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("001000000000001"));
        assert!(!is_valid_id("001000000000001AAAA"));
        assert!(!is_valid_id("001000000000-01AAA"));
        assert!(!is_valid_id("Acme Corporation!!"));
    }

    #[test]
    fn test_to_18() {
        assert_eq!(to_18("0015g00000AbCdE").as_deref(), Some("0015g00000AbCdEAAV"));
        assert_eq!(to_18("short"), None);
        for id in ["001000000000001", "a0B5g000001XyZq", "ABCDEABCDEABCDE"] {
            assert!(is_valid_id(&to_18(id).unwrap()));
        }
    }
}
