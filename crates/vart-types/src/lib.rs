//! Foundation types for vart, the versioned artifact layer.
//!
//! This crate holds everything that is pure: the version identifier, the
//! order-preserving key codec shared by both storage backends, name
//! validation, the public [`Artifact`] and [`Alias`] records, and the clock
//! abstraction. Every other vart crate depends on `vart-types`.
//!
//! # Key Types
//!
//! - [`Version`]: `LATEST` or an immutable numbered snapshot
//! - [`codec`]: version, filename and alias-key encodings
//! - [`Artifact`]: one version of an artifact as seen by callers
//! - [`Alias`]: a named pointer to one or two versions with traffic splitting
//! - [`Clock`]: injectable time source ([`SystemClock`], [`ManualClock`])

pub mod codec;
pub mod error;
pub mod names;
pub mod record;
pub mod temporal;
pub mod version;

pub use codec::{
    decode_alias_key, decode_filename, decode_version, encode_alias_key, encode_filename,
    encode_version,
};
pub use error::TypeError;
pub use names::{validate_alias_name, validate_artifact_name};
pub use record::{Alias, AliasTarget, Artifact};
pub use temporal::{Clock, ManualClock, SystemClock};
pub use version::{Version, LATEST, MAX_VERSION, VERSION_WIDTH};
