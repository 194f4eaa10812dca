//! Declared package digests

use crate::errors::{Result, UpdateError};

/// A `sha256:<hex>` digest published alongside a release asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDigest {
    hex: String,
}

impl ExpectedDigest {
    /// Parse a declared digest. Only SHA-256 is understood; anything else
    /// cannot be verified and is rejected.
    pub fn parse(declared: &str) -> Result<Self> {
        let declared = declared.trim();
        let (algorithm, hex) = declared
            .split_once(':')
            .ok_or_else(|| UpdateError::UnsupportedDigest(declared.to_string()))?;

        if !algorithm.eq_ignore_ascii_case("sha256") {
            return Err(UpdateError::UnsupportedDigest(declared.to_string()));
        }

        Ok(Self {
            hex: hex.to_ascii_lowercase(),
        })
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Case-insensitive comparison against a computed hex digest
    pub fn verify(&self, actual_hex: &str) -> Result<()> {
        if self.hex.eq_ignore_ascii_case(actual_hex) {
            Ok(())
        } else {
            Err(UpdateError::ChecksumMismatch {
                expected: self.hex.clone(),
                actual: actual_hex.to_ascii_lowercase(),
            })
        }
    }
}
