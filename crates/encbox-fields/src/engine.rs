//! Traversal plumbing shared by the XML and JSON engines.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use encbox::{is_enveloped, CryptoError};
use tokio_util::sync::CancellationToken;

use crate::error::FieldError;

/// Single-assignment slot for a crypto handle, filled on first use so
/// documents whose paths match nothing never touch the registry.
pub(crate) struct LazyHandle<T> {
    slot: Option<T>,
}

impl<T> LazyHandle<T> {
    pub(crate) fn new() -> Self {
        Self { slot: None }
    }

    pub(crate) fn get_or_init(
        &mut self,
        init: impl FnOnce() -> Result<T, CryptoError>,
    ) -> Result<&T, CryptoError> {
        let handle = match self.slot.take() {
            Some(handle) => handle,
            None => init()?,
        };
        Ok(self.slot.insert(handle))
    }
}

/// Fail with [`FieldError::Canceled`] once the caller's signal is observed.
/// Checked before every per-field crypto operation.
pub(crate) fn ensure_live(cancel: &CancellationToken) -> Result<(), FieldError> {
    if cancel.is_cancelled() {
        return Err(FieldError::Canceled);
    }
    Ok(())
}

/// Reject blank path elements before they reach the path compiler.
pub(crate) fn ensure_path_present(index: usize, path: &str) -> Result<(), FieldError> {
    if path.trim().is_empty() {
        return Err(FieldError::InvalidPath {
            index,
            reason: "path expression is empty".into(),
        });
    }
    Ok(())
}

/// Attach path/match context to a crypto failure.
pub(crate) fn crypto_failure(path: &str, match_index: usize, source: CryptoError) -> FieldError {
    FieldError::Crypto {
        path: path.to_owned(),
        match_index,
        source,
    }
}

/// Shape probe for the decrypt direction: a field value is only fed to the
/// decryptor when its Base64 decoding carries the envelope prefix. Anything
/// else is plaintext the engine must leave untouched.
pub(crate) fn is_envelope_string(value: &str) -> bool {
    STANDARD
        .decode(value)
        .map(|raw| is_enveloped(&raw))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_handle_initialises_once() {
        let mut lazy = LazyHandle::new();
        let mut calls = 0;
        for _ in 0..3 {
            let value = lazy.get_or_init(|| {
                calls += 1;
                Ok(41 + calls)
            });
            assert_eq!(*value.unwrap(), 42);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn blank_paths_are_rejected_with_their_index() {
        assert!(ensure_path_present(0, "$.a").is_ok());
        let err = ensure_path_present(3, "   ").unwrap_err();
        assert!(matches!(err, FieldError::InvalidPath { index: 3, .. }));
    }

    #[test]
    fn cancellation_is_observed() {
        let token = CancellationToken::new();
        assert!(ensure_live(&token).is_ok());
        token.cancel();
        assert!(matches!(ensure_live(&token), Err(FieldError::Canceled)));
    }

    #[test]
    fn envelope_probe_rejects_plaintext() {
        assert!(!is_envelope_string("visible"));
        assert!(!is_envelope_string("aGVsbG8="));
        // A hand-framed envelope: version 1, 8-byte IV, one byte of body.
        let mut raw = vec![1u8, 8, 0];
        raw.extend_from_slice(&[0u8; 8]);
        raw.push(0xFF);
        let encoded = STANDARD.encode(&raw);
        assert!(is_envelope_string(&encoded));
    }
}
