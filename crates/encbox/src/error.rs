//! Operational error type for the encrypt/decrypt pipeline.

use thiserror::Error;

use crate::cipher::CipherError;
use crate::envelope::EnvelopeError;
use crate::registry::RegistryError;

/// Errors surfaced by [`crate::Encryptor`], [`crate::Decryptor`] and
/// [`crate::Crypto`] operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A string envelope was not valid Base64.
    #[error("cipher-text is not valid Base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decrypted payload of a string operation was not valid UTF-8.
    #[error("decrypted payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
