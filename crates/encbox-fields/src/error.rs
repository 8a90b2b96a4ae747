//! Field-level engine errors.

use encbox::CryptoError;
use thiserror::Error;

/// Errors produced by the XML and JSON field engines.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The path list was empty.
    #[error("no path expressions were supplied")]
    NoPaths,

    /// A path element was blank, or the expression failed to compile.
    ///
    /// Raised at the offending element's position in the list, even when
    /// earlier expressions already rewrote nodes; those rewrites are not
    /// rolled back.
    #[error("invalid path expression at index {index}: {reason}")]
    InvalidPath { index: usize, reason: String },

    /// The input document could not be parsed.
    #[error("failed to parse {format} document: {reason}")]
    DocumentParse { format: &'static str, reason: String },

    /// The rewritten document could not be serialized back out.
    #[error("failed to serialise document: {0}")]
    Serialize(String),

    /// A per-field crypto operation failed. Carries the failing path
    /// expression and the match's position in document order.
    #[error("crypto failure at path {path:?}, match {match_index}: {source}")]
    Crypto {
        path: String,
        match_index: usize,
        #[source]
        source: CryptoError,
    },

    /// The caller's cancellation signal was observed. Rewrites already
    /// applied to the working tree are discarded with it.
    #[error("field operation was canceled")]
    Canceled,
}
