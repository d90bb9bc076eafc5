use std::sync::Arc;

use vart_index::MetadataIndex;
use vart_store::ObjectStore;
use vart_types::{Clock, SystemClock};

use crate::backend::{HybridRepository, ObjectRepository};
use crate::config::RepositoryConfig;
use crate::error::RepoResult;
use crate::repository::Repository;

/// Assembles a [`Repository`] from its collaborators.
///
/// Supplying an index selects the hybrid backend; without one the repository
/// keeps everything in object storage.
///
/// ```
/// use std::sync::Arc;
/// use vart_index::InMemoryIndex;
/// use vart_sdk::{BackendKind, RepositoryBuilder};
/// use vart_store::InMemoryObjectStore;
///
/// let repo = RepositoryBuilder::new(Arc::new(InMemoryObjectStore::new("bucket")))
///     .index(Arc::new(InMemoryIndex::new()))
///     .build()
///     .unwrap();
/// assert_eq!(repo.backend(), BackendKind::Hybrid);
/// ```
pub struct RepositoryBuilder {
    store: Arc<dyn ObjectStore>,
    index: Option<Arc<dyn MetadataIndex>>,
    config: RepositoryConfig,
    clock: Arc<dyn Clock>,
}

impl RepositoryBuilder {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            index: None,
            config: RepositoryConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn index(mut self, index: Arc<dyn MetadataIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Time source for alias timestamps and retention cutoffs.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> RepoResult<Box<dyn Repository>> {
        Ok(match self.index {
            Some(index) => Box::new(HybridRepository::with_clock(
                self.store,
                index,
                &self.config,
                self.clock,
            )?),
            None => Box::new(ObjectRepository::with_clock(
                self.store,
                &self.config,
                self.clock,
            )?),
        })
    }
}
