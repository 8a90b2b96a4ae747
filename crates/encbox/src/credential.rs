//! Named credentials binding key material to an algorithm tag.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroize;

use crate::algorithm::Algorithm;

/// Errors raised while constructing a [`Credential`].
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The key material does not fit the algorithm.
    #[error("credential {name:?}: key must be {expected} for {algorithm}, got {got} bytes")]
    InvalidKeyLength {
        name: String,
        algorithm: Algorithm,
        expected: &'static str,
        got: usize,
    },

    /// The declared IV size does not match the algorithm's block size.
    #[error("credential {name:?}: IV size must be {expected} for {algorithm}, got {got}")]
    InvalidIvSize {
        name: String,
        algorithm: Algorithm,
        expected: usize,
        got: usize,
    },
}

/// Owned key material.
///
/// The buffer is overwritten with zeroes when dropped to shorten the window
/// during which plaintext key bytes live in RAM, and the `Debug` impl never
/// prints the contents.
#[derive(Clone)]
pub struct KeyBytes(Vec<u8>);

impl KeyBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for KeyBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyBytes([REDACTED])")
    }
}

/// A named pairing of key material with an algorithm tag.
///
/// The name is a caller-visible label, not a secret. Construction validates
/// the key length and IV size against the algorithm, so a credential that
/// exists is always usable: key-material problems surface when the registry
/// is built, never lazily at first use.
#[derive(Debug, Clone)]
pub struct Credential {
    name: String,
    algorithm: Algorithm,
    key: KeyBytes,
    iv_size: usize,
}

impl Credential {
    /// Build a credential with the algorithm's natural IV size.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidKeyLength`] if `key` does not fit
    /// `algorithm`.
    pub fn new(
        name: impl Into<String>,
        algorithm: Algorithm,
        key: Vec<u8>,
    ) -> Result<Self, CredentialError> {
        let iv_size = algorithm.block_size();
        Self::with_iv_size(name, algorithm, key, iv_size)
    }

    /// Build a credential with an explicit IV size.
    ///
    /// The IV size must equal the algorithm's block size; the parameter
    /// exists so configuration records carrying the size are checked rather
    /// than trusted.
    pub fn with_iv_size(
        name: impl Into<String>,
        algorithm: Algorithm,
        key: Vec<u8>,
        iv_size: usize,
    ) -> Result<Self, CredentialError> {
        let name = name.into();
        if !algorithm.key_len_valid(key.len()) {
            return Err(CredentialError::InvalidKeyLength {
                name,
                algorithm,
                expected: algorithm.key_len_spec(),
                got: key.len(),
            });
        }
        if iv_size != algorithm.block_size() {
            return Err(CredentialError::InvalidIvSize {
                name,
                algorithm,
                expected: algorithm.block_size(),
                got: iv_size,
            });
        }
        Ok(Self {
            name,
            algorithm,
            key: KeyBytes::from(key),
            iv_size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn key(&self) -> &[u8] {
        self.key.as_slice()
    }

    /// IV length in bytes drawn for each encryption; 8 or 16.
    pub fn iv_size(&self) -> usize {
        self.iv_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_aes_credential() {
        let c = Credential::new("primary", Algorithm::Aes, vec![0u8; 32]).unwrap();
        assert_eq!(c.name(), "primary");
        assert_eq!(c.algorithm(), Algorithm::Aes);
        assert_eq!(c.key().len(), 32);
        assert_eq!(c.iv_size(), 16);
    }

    #[test]
    fn key_length_is_validated_per_algorithm() {
        assert!(Credential::new("x", Algorithm::Des, vec![0u8; 16]).is_err());
        assert!(Credential::new("x", Algorithm::Des, vec![0u8; 8]).is_ok());
        assert!(Credential::new("x", Algorithm::TripleDes, vec![0u8; 8]).is_err());
        assert!(Credential::new("x", Algorithm::Rc2, vec![0u8; 4]).is_err());
        assert!(Credential::new("x", Algorithm::Rc2, vec![0u8; 12]).is_ok());
    }

    #[test]
    fn iv_size_must_match_block_size() {
        let err =
            Credential::with_iv_size("x", Algorithm::Aes, vec![0u8; 32], 8).unwrap_err();
        assert!(matches!(
            err,
            CredentialError::InvalidIvSize { expected: 16, got: 8, .. }
        ));
        assert!(Credential::with_iv_size("x", Algorithm::Des, vec![0u8; 8], 8).is_ok());
    }

    #[test]
    fn error_names_the_credential() {
        let err = Credential::new("billing", Algorithm::Aes, vec![0u8; 3]).unwrap_err();
        assert!(err.to_string().contains("billing"));
    }

    #[test]
    fn key_bytes_redacted_in_debug() {
        let c = Credential::new("x", Algorithm::Aes, vec![0xFFu8; 16]).unwrap();
        let debug = format!("{c:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("255"));
    }
}
