//! Metadata index for vart's hybrid backend.
//!
//! The index is a strongly consistent keyed table. Rows are addressed by a
//! partition key and a sort key; a query reads one partition in sort-key
//! order. Each row write is atomic, and nothing spans two rows.
//!
//! # Backends
//!
//! - [`InMemoryIndex`] -- nested `BTreeMap` behind a `RwLock`
//!
//! Remote tables plug in by implementing [`MetadataIndex`].

pub mod error;
pub mod item;
pub mod memory;
pub mod query;
pub mod traits;

pub use error::{IndexError, IndexResult};
pub use item::{AttributeUpdate, AttributeValue, Attributes, Item};
pub use memory::InMemoryIndex;
pub use query::{Filter, Query, SortKeyCondition};
pub use traits::MetadataIndex;
