//! Per-credential encryption and decryption handles.
//!
//! Both handles are plain structs over an [`Arc<Credential>`]: they hold no
//! per-call state, so one handle can be reused across calls and shared
//! across threads. A fresh cipher is instantiated for every operation and a
//! fresh IV drawn for every encryption.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::cipher;
use crate::credential::Credential;
use crate::envelope::{self, Envelope};
use crate::error::CryptoError;
use crate::rng;

/// Single-shot encryption bound to one credential.
#[derive(Debug, Clone)]
pub struct Encryptor {
    credential: Arc<Credential>,
}

impl Encryptor {
    pub(crate) fn new(credential: Arc<Credential>) -> Self {
        Self { credential }
    }

    /// The credential this handle encrypts under.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Encrypt `plain`, returning a self-describing envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Cipher`] if the credential's material is
    /// rejected by the primitive (not expected for a registry-built
    /// credential, which is validated at load).
    pub fn encrypt_bytes(&self, plain: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let iv = rng::iv_bytes(self.credential.iv_size());
        let mut out = Vec::with_capacity(
            envelope::HEADER_LEN + iv.len() + plain.len() + self.credential.algorithm().block_size(),
        );
        envelope::write_header(&mut out, &iv);
        let ciphertext =
            cipher::encrypt(self.credential.algorithm(), self.credential.key(), &iv, plain)?;
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Encrypt a string: UTF-8 encode, encrypt, then Base64-encode the
    /// envelope (standard alphabet, `=` padding).
    pub fn encrypt_string(&self, plain: &str) -> Result<String, CryptoError> {
        Ok(STANDARD.encode(self.encrypt_bytes(plain.as_bytes())?))
    }
}

/// Single-shot decryption bound to one credential.
///
/// `decrypt_string` is a left-inverse of [`Encryptor::encrypt_string`] for
/// the same credential. It does **not** detect that an input is already
/// plaintext; callers probing for that case should run
/// [`crate::is_enveloped`] against the raw bytes first.
#[derive(Debug, Clone)]
pub struct Decryptor {
    credential: Arc<Credential>,
}

impl Decryptor {
    pub(crate) fn new(credential: Arc<Credential>) -> Self {
        Self { credential }
    }

    /// The credential this handle decrypts under.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Decrypt an envelope produced by [`Encryptor::encrypt_bytes`].
    ///
    /// # Errors
    ///
    /// Envelope parse failures surface as [`CryptoError::Envelope`]
    /// (unsupported version, truncation); a ciphertext the primitive rejects
    /// surfaces as [`CryptoError::Cipher`].
    pub fn decrypt_bytes(&self, enveloped: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let env = Envelope::parse(enveloped)?;
        Ok(cipher::decrypt(
            self.credential.algorithm(),
            self.credential.key(),
            env.iv,
            env.ciphertext,
        )?)
    }

    /// Decrypt a string envelope: Base64-decode, decrypt, UTF-8 decode.
    ///
    /// Whitespace in the input is not tolerated.
    pub fn decrypt_string(&self, enveloped: &str) -> Result<String, CryptoError> {
        let raw = STANDARD.decode(enveloped)?;
        Ok(String::from_utf8(self.decrypt_bytes(&raw)?)?)
    }
}
