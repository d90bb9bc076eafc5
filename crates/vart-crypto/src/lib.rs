//! Content hashing for vart.
//!
//! Payload digests serve two purposes: `put_artifact` skips the write when
//! `LATEST` already holds identical bytes, and content reads are verified
//! against the digest recorded at write time.
//!
//! The algorithm is a value carried by each repository, never process-wide
//! state, so two repositories in one process may hash differently.

pub mod hasher;

pub use hasher::{ContentHasher, HashAlgorithm, HasherError};
