//! The closed set of symmetric algorithm tags and their sizing rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Symmetric algorithm a credential may select.
///
/// New credentials should use [`Algorithm::Aes`]. The remaining tags exist so
/// cipher-text produced against legacy credentials stays decryptable;
/// `Rijndael` is the historical alias for the 128-bit-block cipher and maps
/// to the AES implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Aes,
    Des,
    Rc2,
    Rijndael,
    TripleDes,
}

/// An algorithm tag outside the closed set was encountered.
#[derive(Debug, Error)]
#[error("unknown algorithm {input:?}; valid algorithms are: AES, DES, RC2, Rijndael, TripleDES")]
pub struct AlgorithmParseError {
    /// The rejected tag, verbatim.
    pub input: String,
}

impl Algorithm {
    /// Cipher block size in bytes. Also the only valid IV length for the
    /// algorithm, and the `ivLength` value written into envelopes.
    pub fn block_size(self) -> usize {
        match self {
            Algorithm::Aes | Algorithm::Rijndael => 16,
            Algorithm::Des | Algorithm::Rc2 | Algorithm::TripleDes => 8,
        }
    }

    /// Returns `true` if `len` is a valid key length in bytes.
    pub fn key_len_valid(self, len: usize) -> bool {
        match self {
            Algorithm::Aes | Algorithm::Rijndael => matches!(len, 16 | 24 | 32),
            Algorithm::Des => len == 8,
            Algorithm::TripleDes => matches!(len, 16 | 24),
            Algorithm::Rc2 => (5..=16).contains(&len),
        }
    }

    /// The valid key lengths, spelled out for error messages.
    pub fn key_len_spec(self) -> &'static str {
        match self {
            Algorithm::Aes | Algorithm::Rijndael => "16, 24 or 32 bytes",
            Algorithm::Des => "8 bytes",
            Algorithm::TripleDes => "16 or 24 bytes",
            Algorithm::Rc2 => "5 to 16 bytes",
        }
    }

    /// Canonical tag name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::Des => "DES",
            Algorithm::Rc2 => "RC2",
            Algorithm::Rijndael => "Rijndael",
            Algorithm::TripleDes => "TripleDES",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = AlgorithmParseError;

    /// Case-insensitive parse of the canonical tag names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes" => Ok(Algorithm::Aes),
            "des" => Ok(Algorithm::Des),
            "rc2" => Ok(Algorithm::Rc2),
            "rijndael" => Ok(Algorithm::Rijndael),
            "tripledes" => Ok(Algorithm::TripleDes),
            _ => Err(AlgorithmParseError { input: s.to_owned() }),
        }
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}
