//! Versioned artifact repository.
//!
//! Stores binary artifacts under a mutable `LATEST` slot, snapshots it into
//! immutable numbered versions on publish, and binds named aliases to one or
//! two versions with a weighted traffic split. Two backends implement the
//! same [`Repository`] contract:
//!
//! - [`ObjectRepository`] keeps payloads, version metadata and aliases in
//!   object storage. Deletion is permanent.
//! - [`HybridRepository`] keeps payloads in object storage and metadata plus
//!   aliases in a [`vart_index::MetadataIndex`]. Deletion is soft.
//!
//! [`RepositoryBuilder`] picks between them.

pub mod backend;
pub mod builder;
pub mod config;
pub mod error;
pub mod layout;
pub mod repository;
pub mod retention;

pub use backend::{HybridRepository, ObjectRepository};
pub use builder::RepositoryBuilder;
pub use config::{RepositoryConfig, DEFAULT_PREFIX};
pub use error::{RepoError, RepoResult};
pub use layout::StorageLayout;
pub use repository::{AliasContent, BackendKind, Repository};
pub use retention::{select_purge_candidates, PurgeReport, RetentionPolicy};

// Re-export key types
pub use vart_crypto::HashAlgorithm;
pub use vart_store::PutOptions;
pub use vart_types::{Alias, AliasTarget, Artifact, Version};
