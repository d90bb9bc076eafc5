//! Object storage for vart.
//!
//! Both repository backends keep artifact payloads in an object store, and
//! the object-store-only backend keeps everything there: version metadata
//! rides on the payload objects and aliases are small JSON documents.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`LocalObjectStore`] -- directory tree on the local filesystem
//!
//! # Contract
//!
//! 1. Keys are `/`-separated paths; listing is lexicographic by key.
//! 2. Single-object writes are atomic. Nothing spans two objects.
//! 3. A read after a completed write sees that write.
//! 4. The entity tag depends only on the bytes, so a server-side copy keeps it.
//! 5. A missing key is [`StoreError::NotFound`], never a generic failure.

pub mod error;
pub mod key;
pub mod local;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use key::{join_key, validate_key};
pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{ObjectData, ObjectHead, ObjectSummary, PutOptions, PutReceipt};
pub use traits::ObjectStore;
