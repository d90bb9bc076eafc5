//! In-memory metadata index for testing and embedding.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::IndexResult;
use crate::item::{validate_keys, AttributeUpdate, Item};
use crate::query::{Filter, Query};
use crate::traits::MetadataIndex;

type Partition = BTreeMap<String, Item>;

/// An in-memory implementation of [`MetadataIndex`].
///
/// Partitions are `BTreeMap`s keyed by sort key, so queries are ordered
/// range reads. One `RwLock` guards the whole table, which makes every
/// single-row operation (including the conditional put) atomic.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    partitions: RwLock<BTreeMap<String, Partition>>,
}

impl InMemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.partitions
            .read()
            .expect("lock poisoned")
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    /// Returns `true` if the index holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataIndex for InMemoryIndex {
    fn put_item(&self, item: &Item) -> IndexResult<()> {
        item.validate_keys()?;
        let mut parts = self.partitions.write().expect("lock poisoned");
        parts
            .entry(item.partition_key.clone())
            .or_default()
            .insert(item.sort_key.clone(), item.clone());
        Ok(())
    }

    fn put_item_if_absent(&self, item: &Item) -> IndexResult<bool> {
        item.validate_keys()?;
        let mut parts = self.partitions.write().expect("lock poisoned");
        let partition = parts.entry(item.partition_key.clone()).or_default();
        if partition.contains_key(&item.sort_key) {
            debug!(pk = %item.partition_key, sk = %item.sort_key, "conditional put lost");
            return Ok(false);
        }
        partition.insert(item.sort_key.clone(), item.clone());
        Ok(true)
    }

    fn get_item(&self, partition_key: &str, sort_key: &str) -> IndexResult<Option<Item>> {
        validate_keys(partition_key, sort_key)?;
        let parts = self.partitions.read().expect("lock poisoned");
        Ok(parts
            .get(partition_key)
            .and_then(|p| p.get(sort_key))
            .cloned())
    }

    fn query(&self, partition_key: &str, query: &Query) -> IndexResult<Vec<Item>> {
        let parts = self.partitions.read().expect("lock poisoned");
        Ok(match parts.get(partition_key) {
            Some(partition) => query.evaluate(partition.values()),
            None => Vec::new(),
        })
    }

    fn update_item(
        &self,
        partition_key: &str,
        sort_key: &str,
        updates: &[AttributeUpdate],
    ) -> IndexResult<Option<Item>> {
        validate_keys(partition_key, sort_key)?;
        let mut parts = self.partitions.write().expect("lock poisoned");
        let Some(item) = parts
            .get_mut(partition_key)
            .and_then(|p| p.get_mut(sort_key))
        else {
            return Ok(None);
        };
        for update in updates {
            update.apply(&mut item.attributes);
        }
        Ok(Some(item.clone()))
    }

    fn delete_item(&self, partition_key: &str, sort_key: &str) -> IndexResult<bool> {
        validate_keys(partition_key, sort_key)?;
        let mut parts = self.partitions.write().expect("lock poisoned");
        let Some(partition) = parts.get_mut(partition_key) else {
            return Ok(false);
        };
        let existed = partition.remove(sort_key).is_some();
        if partition.is_empty() {
            parts.remove(partition_key);
        }
        Ok(existed)
    }

    fn scan(&self, filter: Option<&Filter>) -> IndexResult<Vec<Item>> {
        let parts = self.partitions.read().expect("lock poisoned");
        Ok(parts
            .values()
            .flat_map(BTreeMap::values)
            .filter(|item| filter.map_or(true, |f| f.matches(item)))
            .cloned()
            .collect())
    }
}
