//! Credential-keyed symmetric encryption with a self-describing cipher-text
//! envelope.
//!
//! A [`CredentialRegistry`] binds caller-visible credential names to key
//! material and an [`Algorithm`] tag. The [`Crypto`] facade resolves a name
//! (or the registry default) to an [`Encryptor`]/[`Decryptor`] handle, which
//! performs single-shot CBC/PKCS#7 encryption over bytes or UTF-8 text.
//!
//! # Cipher-text format
//!
//! ```text
//! offset   size    field
//! 0        1       version, always 0x01
//! 1        2       IV length, little-endian unsigned 16-bit
//! 3        ivlen   IV, drawn fresh per encryption
//! 3+ivlen  ..      block-cipher output
//! ```
//!
//! String operations Base64-encode this frame with the standard alphabet and
//! `=` padding. The envelope names the IV but not the credential: the
//! decrypting side chooses the credential, and [`is_enveloped`] offers a
//! conservative shape probe for "does this look encrypted?".
//!
//! # Security notes
//!
//! - CBC with PKCS#7 provides no authentication; callers needing integrity
//!   must layer a MAC or signature above this crate.
//! - Key material is zeroed on drop and redacted from `Debug` output, and
//!   must never appear in logs or traces.

pub mod algorithm;
pub mod cipher;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod encryptor;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod rng;

pub use algorithm::{Algorithm, AlgorithmParseError};
pub use credential::{Credential, CredentialError, KeyBytes};
pub use crypto::Crypto;
pub use encryptor::{Decryptor, Encryptor};
pub use envelope::is_enveloped;
pub use error::CryptoError;
pub use registry::{CredentialRegistry, RegistryBuilder, RegistryError};
