//! CBC/PKCS#7 block-cipher transforms for the closed algorithm set.
//!
//! This module is free of credential and envelope concerns: it maps an
//! [`Algorithm`] tag plus raw key/IV material to a single-shot transform.
//! Callers are expected to have drawn a fresh IV per encryption; nothing
//! here authenticates the ciphertext.

use cipher::block_padding::Pkcs7;
use cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, InnerIvInit, KeyInit, KeyIvInit};
use thiserror::Error;

use crate::algorithm::Algorithm;

/// Errors produced by the block-cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key length is not valid for the algorithm.
    #[error("invalid key length for {algorithm}: expected {expected}, got {got} bytes")]
    InvalidKeyLength {
        algorithm: Algorithm,
        expected: &'static str,
        got: usize,
    },

    /// The IV length does not match the algorithm's block size.
    #[error("invalid IV length for {algorithm}: expected {expected} bytes, got {got}")]
    InvalidIvLength {
        algorithm: Algorithm,
        expected: usize,
        got: usize,
    },

    /// The decrypt transform rejected the input (bad padding or a
    /// ciphertext that is not block-aligned), which usually means the wrong
    /// credential or corrupted bytes.
    #[error("block transform rejected the input (bad padding or alignment)")]
    Transform,
}

/// Encrypt `plain` under `algorithm` in CBC mode with PKCS#7 padding.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] or
/// [`CipherError::InvalidIvLength`] when the material does not fit the
/// algorithm's sizing rules.
pub fn encrypt(
    algorithm: Algorithm,
    key: &[u8],
    iv: &[u8],
    plain: &[u8],
) -> Result<Vec<u8>, CipherError> {
    check_sizes(algorithm, key, iv)?;
    match algorithm {
        Algorithm::Aes | Algorithm::Rijndael => match key.len() {
            16 => cbc_encrypt::<aes::Aes128>(algorithm, key, iv, plain),
            24 => cbc_encrypt::<aes::Aes192>(algorithm, key, iv, plain),
            _ => cbc_encrypt::<aes::Aes256>(algorithm, key, iv, plain),
        },
        Algorithm::Des => cbc_encrypt::<des::Des>(algorithm, key, iv, plain),
        Algorithm::TripleDes => match key.len() {
            16 => cbc_encrypt::<des::TdesEde2>(algorithm, key, iv, plain),
            _ => cbc_encrypt::<des::TdesEde3>(algorithm, key, iv, plain),
        },
        Algorithm::Rc2 => {
            let rc2 = rc2::Rc2::new_with_eff_key_len(key, key.len() * 8);
            let enc = cbc::Encryptor::<rc2::Rc2>::inner_iv_slice_init(rc2, iv)
                .map_err(|_| iv_error(algorithm, iv))?;
            Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plain))
        }
    }
}

/// Decrypt `ciphertext` under `algorithm` in CBC mode with PKCS#7 padding.
///
/// # Errors
///
/// Sizing violations surface as with [`encrypt`]; a ciphertext the cipher
/// rejects (padding, alignment) surfaces as [`CipherError::Transform`].
pub fn decrypt(
    algorithm: Algorithm,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    check_sizes(algorithm, key, iv)?;
    match algorithm {
        Algorithm::Aes | Algorithm::Rijndael => match key.len() {
            16 => cbc_decrypt::<aes::Aes128>(algorithm, key, iv, ciphertext),
            24 => cbc_decrypt::<aes::Aes192>(algorithm, key, iv, ciphertext),
            _ => cbc_decrypt::<aes::Aes256>(algorithm, key, iv, ciphertext),
        },
        Algorithm::Des => cbc_decrypt::<des::Des>(algorithm, key, iv, ciphertext),
        Algorithm::TripleDes => match key.len() {
            16 => cbc_decrypt::<des::TdesEde2>(algorithm, key, iv, ciphertext),
            _ => cbc_decrypt::<des::TdesEde3>(algorithm, key, iv, ciphertext),
        },
        Algorithm::Rc2 => {
            let rc2 = rc2::Rc2::new_with_eff_key_len(key, key.len() * 8);
            let dec = cbc::Decryptor::<rc2::Rc2>::inner_iv_slice_init(rc2, iv)
                .map_err(|_| iv_error(algorithm, iv))?;
            dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CipherError::Transform)
        }
    }
}

fn check_sizes(algorithm: Algorithm, key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
    if !algorithm.key_len_valid(key.len()) {
        return Err(CipherError::InvalidKeyLength {
            algorithm,
            expected: algorithm.key_len_spec(),
            got: key.len(),
        });
    }
    if iv.len() != algorithm.block_size() {
        return Err(iv_error(algorithm, iv));
    }
    Ok(())
}

fn iv_error(algorithm: Algorithm, iv: &[u8]) -> CipherError {
    CipherError::InvalidIvLength {
        algorithm,
        expected: algorithm.block_size(),
        got: iv.len(),
    }
}

fn cbc_encrypt<C>(
    algorithm: Algorithm,
    key: &[u8],
    iv: &[u8],
    plain: &[u8],
) -> Result<Vec<u8>, CipherError>
where
    C: BlockCipher + BlockEncryptMut + KeyInit,
{
    let enc = cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(|_| {
        CipherError::InvalidKeyLength {
            algorithm,
            expected: algorithm.key_len_spec(),
            got: key.len(),
        }
    })?;
    Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plain))
}

fn cbc_decrypt<C>(
    algorithm: Algorithm,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    let dec = cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(|_| {
        CipherError::InvalidKeyLength {
            algorithm,
            expected: algorithm.key_len_spec(),
            got: key.len(),
        }
    })?;
    dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::Transform)
}
