//! JSONPath-driven field-level encryption over JSON documents.
//!
//! Matched tokens are serialized as minified JSON, encrypted through the
//! facade, and replaced by JSON string tokens holding the Base64 envelope.
//! Decryption parses the plaintext back into a token before splicing, so a
//! number that was encrypted decrypts to a number, not a quoted string.
//!
//! Root-token matches are special-cased both ways: encrypting the root
//! yields a quoted-string document and ends the traversal; decrypting the
//! root replaces the working tree, and later path expressions are evaluated
//! against the decrypted root.

use encbox::Crypto;
use serde_json::Value;
use serde_json_path::JsonPath;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{
    crypto_failure, ensure_live, ensure_path_present, is_envelope_string, LazyHandle,
};
use crate::error::FieldError;

/// Encrypt every token matched by `paths`, in input order.
///
/// # Errors
///
/// [`FieldError::NoPaths`] for an empty list, [`FieldError::InvalidPath`]
/// for a blank or malformed expression, [`FieldError::Crypto`] when a
/// per-field operation fails (earlier rewrites are not rolled back).
pub fn encrypt(
    crypto: &Crypto,
    document: &str,
    paths: &[String],
    credential: Option<&str>,
) -> Result<String, FieldError> {
    encrypt_with_cancel(crypto, document, paths, credential, &CancellationToken::new())
}

/// [`encrypt`] with a cancellation signal, checked before each per-field
/// crypto operation.
pub fn encrypt_with_cancel(
    crypto: &Crypto,
    document: &str,
    paths: &[String],
    credential: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String, FieldError> {
    if paths.is_empty() {
        return Err(FieldError::NoPaths);
    }
    let mut doc = parse_document(document)?;
    let mut encryptor = LazyHandle::new();

    for (index, path) in paths.iter().enumerate() {
        let compiled = compile_path(index, path)?;
        let matches = locate(&compiled, &doc);
        debug!(path = %path, matches = matches.len(), "JSONPath evaluated");
        for (match_index, (pointer, snapshot)) in matches.into_iter().enumerate() {
            ensure_live(cancel)?;
            let enc = encryptor
                .get_or_init(|| crypto.encryptor(credential))
                .map_err(|e| crypto_failure(path, match_index, e))?;
            let plain = serde_json::to_string(&snapshot)
                .map_err(|e| FieldError::Serialize(e.to_string()))?;
            let sealed = enc
                .encrypt_string(&plain)
                .map_err(|e| crypto_failure(path, match_index, e))?;
            if pointer.is_empty() {
                // Root match: the whole document collapses to one string
                // token and the traversal ends.
                return serialize(&Value::String(sealed));
            }
            if let Some(slot) = doc.pointer_mut(&pointer) {
                *slot = Value::String(sealed);
            }
        }
    }
    serialize(&doc)
}

/// Decrypt every token matched by `paths`, in input order.
///
/// String tokens whose value is not an envelope are left untouched; a token
/// the decryptor rejects aborts the call.
pub fn decrypt(
    crypto: &Crypto,
    document: &str,
    paths: &[String],
    credential: Option<&str>,
) -> Result<String, FieldError> {
    decrypt_with_cancel(crypto, document, paths, credential, &CancellationToken::new())
}

/// [`decrypt`] with a cancellation signal, checked before each per-field
/// crypto operation.
pub fn decrypt_with_cancel(
    crypto: &Crypto,
    document: &str,
    paths: &[String],
    credential: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String, FieldError> {
    if paths.is_empty() {
        return Err(FieldError::NoPaths);
    }
    let mut doc = parse_document(document)?;
    let mut decryptor = LazyHandle::new();

    for (index, path) in paths.iter().enumerate() {
        let compiled = compile_path(index, path)?;
        let matches = locate(&compiled, &doc);
        debug!(path = %path, matches = matches.len(), "JSONPath evaluated");
        for (match_index, (pointer, snapshot)) in matches.into_iter().enumerate() {
            ensure_live(cancel)?;
            // Only a string token can carry an envelope.
            let sealed = match snapshot {
                Value::String(s) => s,
                _ => continue,
            };
            if !is_envelope_string(&sealed) {
                debug!(path = %path, match_index, "value is not an envelope; skipping");
                continue;
            }
            let dec = decryptor
                .get_or_init(|| crypto.decryptor(credential))
                .map_err(|e| crypto_failure(path, match_index, e))?;
            let plain = dec
                .decrypt_string(&sealed)
                .map_err(|e| crypto_failure(path, match_index, e))?;
            let token = match serde_json::from_str::<Value>(&plain) {
                Ok(value) => value,
                Err(_) => Value::String(plain),
            };
            if pointer.is_empty() {
                // Root match: the decrypted token becomes the new root and
                // later paths are evaluated against it.
                doc = token;
            } else if let Some(slot) = doc.pointer_mut(&pointer) {
                *slot = token;
            }
        }
    }
    serialize(&doc)
}

fn parse_document(document: &str) -> Result<Value, FieldError> {
    serde_json::from_str(document).map_err(|e| FieldError::DocumentParse {
        format: "JSON",
        reason: e.to_string(),
    })
}

fn compile_path(index: usize, path: &str) -> Result<JsonPath, FieldError> {
    ensure_path_present(index, path)?;
    JsonPath::parse(path).map_err(|e| FieldError::InvalidPath {
        index,
        reason: e.to_string(),
    })
}

/// Eager snapshot of the matches: (JSON Pointer, token copy) pairs in
/// document order, so rewrites cannot invalidate the iteration.
fn locate(path: &JsonPath, doc: &Value) -> Vec<(String, Value)> {
    path.query_located(doc)
        .iter()
        .map(|located| {
            (
                located.location().to_json_pointer(),
                located.node().clone(),
            )
        })
        .collect()
}

fn serialize(doc: &Value) -> Result<String, FieldError> {
    serde_json::to_string(doc).map_err(|e| FieldError::Serialize(e.to_string()))
}
