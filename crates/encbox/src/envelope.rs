//! Cipher-text envelope framing.
//!
//! Every encryption output is framed so the decrypting side can recover the
//! IV without out-of-band coordination:
//!
//! ```text
//! offset   size    field
//! 0        1       version, always 0x01
//! 1        2       IV length, little-endian unsigned 16-bit
//! 3        ivlen   IV
//! 3+ivlen  ..      raw block-cipher output
//! ```
//!
//! The envelope is self-describing for the IV but **not** for the credential:
//! the decrypting side chooses the credential by name. The one-byte version
//! lets the framing evolve without breaking existing cipher-text.

use thiserror::Error;

/// The only defined envelope protocol version.
pub const VERSION: u8 = 1;

/// Bytes before the IV: version byte plus the two-byte IV length.
pub const HEADER_LEN: usize = 3;

/// Errors produced while parsing an envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The version byte is not [`VERSION`].
    #[error("unsupported envelope protocol version {0:#04x}; only version 1 is defined")]
    UnsupportedProtocol(u8),

    /// The input ends before the declared layout is complete.
    #[error("envelope truncated: need at least {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },
}

/// Borrowed view over a parsed envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    /// The initialization vector carried inline.
    pub iv: &'a [u8],
    /// The raw block-cipher output following the header.
    pub ciphertext: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Parse `bytes` as an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::UnsupportedProtocol`] if the version byte is
    /// not 1, or [`EnvelopeError::Truncated`] if the input is shorter than
    /// the header plus the declared IV length.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, EnvelopeError> {
        let version = match bytes.first() {
            Some(&v) => v,
            None => return Err(EnvelopeError::Truncated { needed: 1, have: 0 }),
        };
        if version != VERSION {
            return Err(EnvelopeError::UnsupportedProtocol(version));
        }
        if bytes.len() < HEADER_LEN {
            return Err(EnvelopeError::Truncated {
                needed: HEADER_LEN,
                have: bytes.len(),
            });
        }
        let iv_len = u16::from_le_bytes([bytes[1], bytes[2]]) as usize;
        let body = HEADER_LEN + iv_len;
        if bytes.len() < body {
            return Err(EnvelopeError::Truncated {
                needed: body,
                have: bytes.len(),
            });
        }
        Ok(Envelope {
            iv: &bytes[HEADER_LEN..body],
            ciphertext: &bytes[body..],
        })
    }
}

/// Append the envelope header for `iv` to `sink`.
pub fn write_header(sink: &mut Vec<u8>, iv: &[u8]) {
    sink.push(VERSION);
    sink.extend_from_slice(&(iv.len() as u16).to_le_bytes());
    sink.extend_from_slice(iv);
}

/// Shape probe: does `bytes` look like an envelope produced by this library?
///
/// True iff the version byte is 1, the declared IV length is 8 or 16, and
/// the input is long enough to hold the header and IV. This never inspects
/// the ciphertext bytes, so adversarial input matching the three-byte prefix
/// pattern produces a false positive; it is a shape check, not
/// authentication.
pub fn is_enveloped(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN || bytes[0] != VERSION {
        return false;
    }
    let iv_len = u16::from_le_bytes([bytes[1], bytes[2]]) as usize;
    (iv_len == 8 || iv_len == 16) && bytes.len() >= HEADER_LEN + iv_len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(iv: &[u8], ciphertext: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_header(&mut out, iv);
        out.extend_from_slice(ciphertext);
        out
    }

    #[test]
    fn header_round_trip() {
        let iv = [0xAAu8; 16];
        let bytes = framed(&iv, b"ciphertext");
        assert_eq!(bytes[0], 1);
        assert_eq!(u16::from_le_bytes([bytes[1], bytes[2]]), 16);
        let env = Envelope::parse(&bytes).unwrap();
        assert_eq!(env.iv, &iv);
        assert_eq!(env.ciphertext, b"ciphertext");
    }

    #[test]
    fn eight_byte_iv_round_trip() {
        let iv = [0x01u8; 8];
        let env_bytes = framed(&iv, &[0xFF; 8]);
        let env = Envelope::parse(&env_bytes).unwrap();
        assert_eq!(env.iv.len(), 8);
    }

    #[test]
    fn wrong_version_is_unsupported_protocol() {
        let err = Envelope::parse(&[0x02, 16, 0, 0]).unwrap_err();
        assert_eq!(err, EnvelopeError::UnsupportedProtocol(2));
    }

    #[test]
    fn version_is_checked_before_length() {
        // A single wrong version byte is an UnsupportedProtocol, not Truncated.
        let err = Envelope::parse(&[0x02]).unwrap_err();
        assert_eq!(err, EnvelopeError::UnsupportedProtocol(2));
    }

    #[test]
    fn empty_input_is_truncated() {
        assert!(matches!(
            Envelope::parse(&[]),
            Err(EnvelopeError::Truncated { .. })
        ));
    }

    #[test]
    fn short_iv_is_truncated() {
        // Declares a 16-byte IV but carries only 4 bytes of it.
        let err = Envelope::parse(&[1, 16, 0, 0xAA, 0xBB, 0xCC, 0xDD]).unwrap_err();
        assert_eq!(err, EnvelopeError::Truncated { needed: 19, have: 7 });
    }

    #[test]
    fn empty_ciphertext_parses() {
        let env_bytes = framed(&[0u8; 16], &[]);
        let env = Envelope::parse(&env_bytes).unwrap();
        assert!(env.ciphertext.is_empty());
    }

    #[test]
    fn probe_accepts_produced_shapes() {
        assert!(is_enveloped(&framed(&[0u8; 16], b"x")));
        assert!(is_enveloped(&framed(&[0u8; 8], &[])));
    }

    #[test]
    fn probe_rejects_other_shapes() {
        // wrong version
        assert!(!is_enveloped(&[2, 16, 0, 0, 0]));
        // IV length outside {8, 16}
        assert!(!is_enveloped(&framed(&[0u8; 12], b"x")));
        // too short for the declared IV
        assert!(!is_enveloped(&[1, 16, 0, 0xAA]));
        // too short for any header
        assert!(!is_enveloped(&[1, 16]));
        assert!(!is_enveloped(&[]));
    }
}
