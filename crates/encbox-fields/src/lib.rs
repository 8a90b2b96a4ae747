//! Field-level encryption for XML and JSON documents.
//!
//! Walks a document along caller-supplied path expressions (XPath 1.0 for
//! XML, JSONPath for JSON) and rewrites every matched node through an
//! [`encbox::Crypto`] facade, preserving the rest of the document.
//!
//! Traversal rules shared by both formats:
//!
//! - path expressions are processed in input order, and later rewrites see
//!   the effects of earlier ones;
//! - matches within one expression are processed in document order from an
//!   eager snapshot, so rewrites cannot invalidate the iteration;
//! - the crypto handle is resolved lazily at the first match, so a document
//!   whose paths match nothing never touches the credential registry;
//! - an empty path list fails with [`FieldError::NoPaths`]; a blank path
//!   element fails with [`FieldError::InvalidPath`] at its index, even when
//!   earlier expressions already rewrote nodes;
//! - a mid-traversal failure aborts the call without rolling back earlier
//!   rewrites, and the error names the path and match index;
//! - the `*_with_cancel` variants observe a
//!   [`tokio_util::sync::CancellationToken`] before each per-field crypto
//!   operation and fail with [`FieldError::Canceled`], leaving the partially
//!   rewritten tree unpublished.

mod engine;
pub mod error;
pub mod json;
pub mod xml;

pub use error::FieldError;
