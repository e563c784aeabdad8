//! Contract address checks.
//!
//! Addresses are used as cache and storage keys exactly as given; checksum
//! casing is preserved and not normalized.

use crate::constants::ADDRESS_LENGTH;
use crate::error::{Result, RetrieverError};

/// Validates the shape of an Ethereum address (`0x` + 40 hex characters).
///
/// Returns the trimmed address on success.
pub fn validate_address(address: &str) -> Result<&str> {
    let address = address.trim();

    if address.is_empty() {
        return Err(RetrieverError::InvalidAddress("address is required".into()));
    }

    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| RetrieverError::InvalidAddress(format!("missing 0x prefix: {address}")))?;

    if address.len() != ADDRESS_LENGTH {
        return Err(RetrieverError::InvalidAddress(format!(
            "expected {ADDRESS_LENGTH} characters, got {}",
            address.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RetrieverError::InvalidAddress(format!(
            "non-hex characters in {address}"
        )));
    }

    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_addresses() {
        let checksummed = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
        assert_eq!(validate_address(checksummed).unwrap(), checksummed);
        assert_eq!(validate_address("  0x0000000000000000000000000000000000000001 ").unwrap().len(), 42);
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(validate_address("").is_err());
        assert!(validate_address("dAC17F958D2ee523a2206206994597C13D831ec7").is_err());
        assert!(validate_address("0x1234").is_err());
        assert!(validate_address("0xZZC17F958D2ee523a2206206994597C13D831ec7").is_err());
    }

    proptest! {
        #[test]
        fn prop_any_40_hex_chars_is_valid(body in "[0-9a-fA-F]{40}") {
            let address = format!("0x{body}");
            prop_assert!(validate_address(&address).is_ok());
        }
    }
}
