//! Credential registry configuration.
//!
//! The registry is consumed from an external source as a list of records,
//! each `{name, algorithm, key (Base64), iv_size, default}`, with at most
//! one record flagged as the default. Files may be TOML or JSON; any value
//! can be overridden through `ENCBOX_`-prefixed environment variables.
//!
//! Validation is strict and happens entirely at load time: bad key
//! encoding, a key length the algorithm rejects, an IV size other than the
//! block size, duplicate names, or a second default all fail the load with
//! a message naming the offending record. A registry that loads is fully
//! usable.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tracing::info;

use crate::algorithm::Algorithm;
use crate::credential::Credential;
use crate::registry::CredentialRegistry;

/// Top-level registry configuration shape.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Credential records, in declaration order.
    pub credentials: Vec<CredentialConfig>,
}

/// One credential record.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    /// Caller-visible label; case-sensitive and unique.
    pub name: String,

    /// Algorithm tag. Unknown tags fail deserialization with the full
    /// valid set in the message.
    pub algorithm: Algorithm,

    /// Base64-encoded key material (standard alphabet).
    pub key: String,

    /// IV length in bytes; defaults to the algorithm's block size.
    #[serde(default)]
    pub iv_size: Option<usize>,

    /// Marks this credential as the one selected by an absent name.
    #[serde(default)]
    pub default: bool,
}

impl RegistryConfig {
    /// Load the configuration from `path` with `ENCBOX_` environment
    /// overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not deserialize
    /// into the registry shape.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("ENCBOX").separator("__"))
            .build()
            .context("failed to build registry configuration")?;
        cfg.try_deserialize()
            .context("failed to deserialise registry configuration")
    }

    /// Build the immutable [`CredentialRegistry`], validating every record.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid record with a message naming it.
    pub fn build(self) -> Result<CredentialRegistry> {
        let count = self.credentials.len();
        let mut builder = CredentialRegistry::builder();
        for record in self.credentials {
            let key = STANDARD
                .decode(&record.key)
                .with_context(|| format!("credential {:?}: key is not valid Base64", record.name))?;
            let iv_size = record.iv_size.unwrap_or_else(|| record.algorithm.block_size());
            let credential =
                Credential::with_iv_size(record.name, record.algorithm, key, iv_size)?;
            builder = builder.credential(credential, record.default)?;
        }
        let registry = builder.build();
        info!(credentials = count, "credential registry loaded");
        Ok(registry)
    }
}

/// Load and build in one step.
pub fn load_registry(path: &std::path::Path) -> Result<CredentialRegistry> {
    RegistryConfig::load(path)?.build()
}
