use async_trait::async_trait;

use crate::model::Key;

use super::{AttributeUpdate, BatchWriteOutput, Item, Result};

/// Client for a single-table key-value store.
///
/// Keys and items carry wire values. Implementations do not retry.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Gets an item by key, or `None` if the store has no such item.
    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Item>>;

    /// Applies a partial update, creating the item if it does not exist.
    async fn update_item(&self, table: &str, key: &Key, updates: &[AttributeUpdate])
        -> Result<()>;

    /// Deletes an item by key. Deleting a missing item succeeds.
    async fn delete_item(&self, table: &str, key: &Key) -> Result<()>;

    /// Gets many items in one bulk read. Result order is unspecified.
    async fn batch_get_item(&self, table: &str, keys: &[Key]) -> Result<Vec<Item>>;

    /// Puts many items in one bulk write.
    async fn batch_write_item(&self, table: &str, items: &[Item]) -> Result<BatchWriteOutput>;
}
