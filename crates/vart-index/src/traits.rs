//! The [`MetadataIndex`] trait defining the index interface.

use crate::error::IndexResult;
use crate::item::{AttributeUpdate, Item};
use crate::query::{Filter, Query};

/// A strongly consistent table of rows keyed by `(partition_key, sort_key)`.
///
/// Implementations must be thread-safe (`Send + Sync`). Every single-row
/// operation is atomic and visible to all subsequent reads. No operation
/// spans rows atomically; `batch_delete` is a convenience, not a
/// transaction.
pub trait MetadataIndex: Send + Sync {
    /// Create or replace a row.
    fn put_item(&self, item: &Item) -> IndexResult<()>;

    /// Create a row only if no row exists at its key.
    ///
    /// Returns `Ok(false)` without writing when the key is taken.
    fn put_item_if_absent(&self, item: &Item) -> IndexResult<bool>;

    /// Read a row. Returns `Ok(None)` if it does not exist.
    fn get_item(&self, partition_key: &str, sort_key: &str) -> IndexResult<Option<Item>>;

    /// Read rows of one partition in sort-key order.
    fn query(&self, partition_key: &str, query: &Query) -> IndexResult<Vec<Item>>;

    /// Apply attribute mutations to an existing row and return the result.
    ///
    /// Returns `Ok(None)` when the row does not exist; never creates one.
    fn update_item(
        &self,
        partition_key: &str,
        sort_key: &str,
        updates: &[AttributeUpdate],
    ) -> IndexResult<Option<Item>>;

    /// Delete a row. Returns `true` if it existed.
    fn delete_item(&self, partition_key: &str, sort_key: &str) -> IndexResult<bool>;

    /// Read every row of the table, optionally filtered.
    fn scan(&self, filter: Option<&Filter>) -> IndexResult<Vec<Item>>;

    /// Delete many rows. Returns how many existed.
    ///
    /// Default implementation calls `delete_item()` for each key. Backends
    /// may override to use fewer round-trips.
    fn batch_delete(&self, keys: &[(String, String)]) -> IndexResult<usize> {
        let mut removed = 0;
        for (pk, sk) in keys {
            if self.delete_item(pk, sk)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Delete every row of a partition. Returns how many were removed.
    fn delete_partition(&self, partition_key: &str) -> IndexResult<usize> {
        let keys: Vec<(String, String)> = self
            .query(partition_key, &Query::all())?
            .into_iter()
            .map(|item| (item.partition_key, item.sort_key))
            .collect();
        self.batch_delete(&keys)
    }
}
