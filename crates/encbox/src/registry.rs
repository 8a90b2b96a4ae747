//! Immutable registry of named credentials.
//!
//! The registry is built once at startup (usually via [`crate::config`]) and
//! never changes for the life of the process, so lookups are plain map reads
//! with no locking.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::credential::Credential;

/// Errors produced by registry lookups and construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No credential with the requested name exists.
    #[error("no credential named {0:?}")]
    NotFound(String),

    /// A default credential was requested but none is configured.
    #[error("no default credential is configured")]
    NoDefault,

    /// Two credentials share a name. Names are case-sensitive and unique.
    #[error("duplicate credential name {0:?}")]
    DuplicateName(String),

    /// More than one credential is flagged as the default.
    #[error("credential {0:?} is marked default, but a default already exists")]
    DuplicateDefault(String),
}

/// Mapping from case-sensitive credential names to credentials, with at most
/// one designated default selected by a `None` name.
#[derive(Debug, Clone, Default)]
pub struct CredentialRegistry {
    by_name: HashMap<String, Arc<Credential>>,
    default: Option<Arc<Credential>>,
}

impl CredentialRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolve `name`, or the default credential when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown name and
    /// [`RegistryError::NoDefault`] when `None` is passed with no default
    /// configured.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<Credential>, RegistryError> {
        match name {
            Some(n) => self
                .by_name
                .get(n)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound(n.to_owned())),
            None => self.default.clone().ok_or(RegistryError::NoDefault),
        }
    }

    /// True iff [`CredentialRegistry::get`] would succeed for `name`.
    ///
    /// Encryption and decryption authorization are the same today; the two
    /// entry points exist so a future registry can answer them differently.
    pub fn can_encrypt(&self, name: Option<&str>) -> bool {
        self.contains(name)
    }

    /// See [`CredentialRegistry::can_encrypt`].
    pub fn can_decrypt(&self, name: Option<&str>) -> bool {
        self.contains(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn contains(&self, name: Option<&str>) -> bool {
        match name {
            Some(n) => self.by_name.contains_key(n),
            None => self.default.is_some(),
        }
    }
}

/// Builder enforcing the registry invariants: unique names, one default.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    by_name: HashMap<String, Arc<Credential>>,
    default: Option<Arc<Credential>>,
}

impl RegistryBuilder {
    /// Add `credential`, optionally designating it the default.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken and
    /// [`RegistryError::DuplicateDefault`] if a default already exists.
    pub fn credential(
        mut self,
        credential: Credential,
        default: bool,
    ) -> Result<Self, RegistryError> {
        if self.by_name.contains_key(credential.name()) {
            return Err(RegistryError::DuplicateName(credential.name().to_owned()));
        }
        let credential = Arc::new(credential);
        if default {
            if self.default.is_some() {
                return Err(RegistryError::DuplicateDefault(
                    credential.name().to_owned(),
                ));
            }
            self.default = Some(Arc::clone(&credential));
        }
        self.by_name
            .insert(credential.name().to_owned(), credential);
        Ok(self)
    }

    pub fn build(self) -> CredentialRegistry {
        CredentialRegistry {
            by_name: self.by_name,
            default: self.default,
        }
    }
}
