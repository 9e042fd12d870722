//! # Navproof Verifier
//!
//! Decides whether fetched snapshot bytes are the bytes the registry (or the
//! record itself) says they should be.
//!
//! Two digests are computed for every record: one over the exact bytes
//! received, and one over a canonical serialization of the parsed record with
//! its self-embedded `sha256` field removed. A mismatch is a normal outcome
//! reported through `VerificationResult`, never an error.

pub mod canonical;
pub mod error;
pub mod verifier;

pub use canonical::{canonical_bytes, canonical_string};
pub use error::VerifierError;
pub use verifier::{
    sha256, HashVerifier, Verification, VerificationMode, VerificationResult, EMBEDDED_DIGEST_FIELD,
};
