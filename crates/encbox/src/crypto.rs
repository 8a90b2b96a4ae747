//! Top-level facade resolving credential names to encrypt/decrypt handles.

use std::sync::{Arc, OnceLock};

use crate::encryptor::{Decryptor, Encryptor};
use crate::error::CryptoError;
use crate::registry::CredentialRegistry;

static GLOBAL: OnceLock<Crypto> = OnceLock::new();

/// Facade over a [`CredentialRegistry`].
///
/// All fields are `Arc`-backed, so cloning is cheap and a single instance
/// can be shared freely across threads; there is no cross-call state.
#[derive(Debug, Clone)]
pub struct Crypto {
    registry: Arc<CredentialRegistry>,
}

impl Crypto {
    pub fn new(registry: CredentialRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &CredentialRegistry {
        &self.registry
    }

    /// Resolve `credential` (`None` selects the default) to an [`Encryptor`].
    pub fn encryptor(&self, credential: Option<&str>) -> Result<Encryptor, CryptoError> {
        Ok(Encryptor::new(self.registry.get(credential)?))
    }

    /// Resolve `credential` (`None` selects the default) to a [`Decryptor`].
    pub fn decryptor(&self, credential: Option<&str>) -> Result<Decryptor, CryptoError> {
        Ok(Decryptor::new(self.registry.get(credential)?))
    }

    /// One-shot convenience: resolve an encryptor and encrypt `plain`.
    pub fn encrypt(
        &self,
        plain: &[u8],
        credential: Option<&str>,
    ) -> Result<Vec<u8>, CryptoError> {
        self.encryptor(credential)?.encrypt_bytes(plain)
    }

    /// One-shot convenience: resolve an encryptor and encrypt the string.
    pub fn encrypt_string(
        &self,
        plain: &str,
        credential: Option<&str>,
    ) -> Result<String, CryptoError> {
        self.encryptor(credential)?.encrypt_string(plain)
    }

    /// One-shot convenience: resolve a decryptor and decrypt the envelope.
    pub fn decrypt(
        &self,
        enveloped: &[u8],
        credential: Option<&str>,
    ) -> Result<Vec<u8>, CryptoError> {
        self.decryptor(credential)?.decrypt_bytes(enveloped)
    }

    /// One-shot convenience: resolve a decryptor and decrypt the string
    /// envelope.
    pub fn decrypt_string(
        &self,
        enveloped: &str,
        credential: Option<&str>,
    ) -> Result<String, CryptoError> {
        self.decryptor(credential)?.decrypt_string(enveloped)
    }

    /// True iff `credential` resolves for encryption.
    pub fn can_encrypt(&self, credential: Option<&str>) -> bool {
        self.registry.can_encrypt(credential)
    }

    /// True iff `credential` resolves for decryption.
    pub fn can_decrypt(&self, credential: Option<&str>) -> bool {
        self.registry.can_decrypt(credential)
    }

    /// Install this facade as the process-wide instance read by
    /// [`Crypto::global`].
    ///
    /// Set once at startup, immutable thereafter. Nothing inside this
    /// library reads the global; it exists only as a convenience for
    /// top-level callers that cannot thread a facade through.
    ///
    /// # Errors
    ///
    /// Returns `self` back if a global facade was already installed.
    pub fn install_global(self) -> Result<(), Crypto> {
        GLOBAL.set(self)
    }

    /// The process-wide facade, if one was installed.
    pub fn global() -> Option<&'static Crypto> {
        GLOBAL.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;
    use crate::credential::Credential;

    fn crypto() -> Crypto {
        let registry = CredentialRegistry::builder()
            .credential(
                Credential::new("primary", Algorithm::Aes, vec![0u8; 32]).unwrap(),
                true,
            )
            .unwrap()
            .credential(
                Credential::new("legacy", Algorithm::Des, vec![0x0Fu8; 8]).unwrap(),
                false,
            )
            .unwrap()
            .build();
        Crypto::new(registry)
    }

    #[test]
    fn convenience_calls_match_handle_calls() {
        let crypto = crypto();
        let env = crypto.encrypt(b"payload", Some("legacy")).unwrap();
        let dec = crypto.decryptor(Some("legacy")).unwrap();
        assert_eq!(dec.decrypt_bytes(&env).unwrap(), b"payload");
    }

    #[test]
    fn default_credential_is_used_for_none() {
        let crypto = crypto();
        let sealed = crypto.encrypt_string("secret", None).unwrap();
        assert_eq!(crypto.decrypt_string(&sealed, None).unwrap(), "secret");
    }

    #[test]
    fn unknown_credential_fails_lookup() {
        let crypto = crypto();
        assert!(crypto.encrypt(b"x", Some("absent")).is_err());
        assert!(crypto.encryptor(Some("absent")).is_err());
    }

    #[test]
    fn capability_checks() {
        let crypto = crypto();
        assert!(crypto.can_encrypt(None));
        assert!(crypto.can_decrypt(Some("legacy")));
        assert!(!crypto.can_encrypt(Some("absent")));
    }

    #[test]
    fn cross_credential_decrypt_does_not_round_trip() {
        let crypto = crypto();
        let env = crypto.encrypt(b"cross credential payload!", Some("primary")).unwrap();
        // "legacy" is DES with an 8-byte IV; the 16-byte IV envelope fails
        // the cipher's sizing check outright.
        assert!(crypto.decrypt(&env, Some("legacy")).is_err());
    }

    #[test]
    fn global_installs_once() {
        let crypto = crypto();
        assert!(crypto.clone().install_global().is_ok());
        assert!(Crypto::global().is_some());
        // Second install is rejected and hands the facade back.
        assert!(crypto.install_global().is_err());
    }
}
