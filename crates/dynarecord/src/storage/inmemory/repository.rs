//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dynarecord_core::model::{Key, ModelSchema};
use dynarecord_core::storage::{
    AttributeAction, AttributeUpdate, BatchWriteOutput, Item, ItemRepository, RepositoryError,
    Result, MAX_BATCH_GET_KEYS,
};
use dynarecord_core::types::Value;

/// A request received by [`InMemoryRepository`], recorded in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    GetItem {
        table: String,
        key: Key,
    },
    UpdateItem {
        table: String,
        key: Key,
        updates: Vec<AttributeUpdate>,
    },
    DeleteItem {
        table: String,
        key: Key,
    },
    BatchGetItem {
        table: String,
        keys: Vec<Key>,
    },
    BatchWriteItem {
        table: String,
        items: Vec<Item>,
    },
}

impl StoreRequest {
    pub fn table(&self) -> &str {
        match self {
            Self::GetItem { table, .. }
            | Self::UpdateItem { table, .. }
            | Self::DeleteItem { table, .. }
            | Self::BatchGetItem { table, .. }
            | Self::BatchWriteItem { table, .. } => table,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::UpdateItem { .. } | Self::DeleteItem { .. } | Self::BatchWriteItem { .. }
        )
    }
}

#[derive(Debug, Default)]
struct Table {
    hash_key: String,
    range_key: Option<String>,
    items: HashMap<String, Item>,
}

impl Table {
    /// Canonical map key for a request key. Key names must match the table.
    fn storage_key(&self, key: &Key) -> Result<String> {
        let range_name = key.range.as_ref().map(|part| part.name.as_str());
        if key.hash.name != self.hash_key || range_name != self.range_key.as_deref() {
            return Err(RepositoryError::InvalidData(format!(
                "Key ({key}) does not match the table key schema"
            )));
        }
        Ok(canonical(&key.hash.value, key.range.as_ref().map(|part| &part.value)))
    }

    /// Canonical map key for a full item.
    fn item_key(&self, item: &Item) -> Result<String> {
        let hash = key_value(item, &self.hash_key)?;
        let range = match &self.range_key {
            Some(name) => Some(key_value(item, name)?),
            None => None,
        };
        Ok(canonical(hash, range))
    }
}

fn key_value<'a>(item: &'a Item, name: &str) -> Result<&'a Value> {
    item.get(name).ok_or_else(|| {
        RepositoryError::InvalidData(format!("Item is missing key attribute: {name}"))
    })
}

fn canonical(hash: &Value, range: Option<&Value>) -> String {
    match range {
        Some(range) => format!("{hash:?}|{range:?}"),
        None => format!("{hash:?}"),
    }
}

/// In-memory storage backend for testing.
///
/// Tables must be created before use, as with a real store. Every request
/// is appended to a log that tests can inspect. Data is lost when the
/// repository is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    requests: Arc<RwLock<Vec<StoreRequest>>>,
    failure: Arc<RwLock<Option<RepositoryError>>>,
}

impl InMemoryRepository {
    /// Creates a new repository with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or empties) a table with the given key schema.
    pub async fn create_table(&self, table: &str, hash_key: &str, range_key: Option<&str>) {
        let mut tables = self.tables.write().await;
        tables.insert(
            table.to_string(),
            Table {
                hash_key: hash_key.to_string(),
                range_key: range_key.map(str::to_string),
                items: HashMap::new(),
            },
        );
    }

    /// Creates the table a model schema points at.
    pub async fn create_table_for(&self, schema: &ModelSchema) {
        self.create_table(schema.table_name(), schema.hash_key(), schema.range_key())
            .await;
    }

    /// Makes every following request fail with `error`, or succeed again with `None`.
    pub async fn set_failure(&self, error: Option<RepositoryError>) {
        *self.failure.write().await = error;
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<StoreRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn clear_requests(&self) {
        self.requests.write().await.clear();
    }

    /// Returns the stored item without logging a request.
    pub async fn item(&self, table: &str, key: &Key) -> Option<Item> {
        let tables = self.tables.read().await;
        let table = tables.get(table)?;
        let storage_key = table.storage_key(key).ok()?;
        table.items.get(&storage_key).cloned()
    }

    pub async fn item_count(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table).map_or(0, |table| table.items.len())
    }

    async fn record(&self, request: StoreRequest) -> Result<()> {
        self.requests.write().await.push(request);
        match self.failure.read().await.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn missing_table(table: &str) -> RepositoryError {
    RepositoryError::TableNotFound(table.to_string())
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Item>> {
        self.record(StoreRequest::GetItem {
            table: table.to_string(),
            key: key.clone(),
        })
        .await?;

        let tables = self.tables.read().await;
        let table_data = tables.get(table).ok_or_else(|| missing_table(table))?;
        let storage_key = table_data.storage_key(key)?;
        Ok(table_data.items.get(&storage_key).cloned())
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        updates: &[AttributeUpdate],
    ) -> Result<()> {
        self.record(StoreRequest::UpdateItem {
            table: table.to_string(),
            key: key.clone(),
            updates: updates.to_vec(),
        })
        .await?;

        let mut tables = self.tables.write().await;
        let table_data = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let storage_key = table_data.storage_key(key)?;
        let item = table_data
            .items
            .entry(storage_key)
            .or_insert_with(|| key.to_item());

        for update in updates {
            if key.parts().any(|part| part.name == update.name) {
                return Err(RepositoryError::InvalidData(format!(
                    "Cannot update key attribute: {}",
                    update.name
                )));
            }
            match &update.action {
                AttributeAction::Put(value) => {
                    item.insert(update.name.clone(), value.clone());
                }
                AttributeAction::Delete => {
                    item.remove(&update.name);
                }
            }
        }
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<()> {
        self.record(StoreRequest::DeleteItem {
            table: table.to_string(),
            key: key.clone(),
        })
        .await?;

        let mut tables = self.tables.write().await;
        let table_data = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let storage_key = table_data.storage_key(key)?;
        table_data.items.remove(&storage_key);
        Ok(())
    }

    async fn batch_get_item(&self, table: &str, keys: &[Key]) -> Result<Vec<Item>> {
        self.record(StoreRequest::BatchGetItem {
            table: table.to_string(),
            keys: keys.to_vec(),
        })
        .await?;

        if keys.len() > MAX_BATCH_GET_KEYS {
            return Err(RepositoryError::QueryFailed(format!(
                "Too many keys in one batch: {} (limit {MAX_BATCH_GET_KEYS})",
                keys.len()
            )));
        }

        let tables = self.tables.read().await;
        let table_data = tables.get(table).ok_or_else(|| missing_table(table))?;
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(item) = table_data.items.get(&table_data.storage_key(key)?) {
                items.push(item.clone());
            }
        }
        Ok(items)
    }

    async fn batch_write_item(&self, table: &str, items: &[Item]) -> Result<BatchWriteOutput> {
        self.record(StoreRequest::BatchWriteItem {
            table: table.to_string(),
            items: items.to_vec(),
        })
        .await?;

        let mut tables = self.tables.write().await;
        let table_data = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let keyed = items
            .iter()
            .map(|item| Ok((table_data.item_key(item)?, item.clone())))
            .collect::<Result<Vec<_>>>()?;

        let written = keyed.len();
        table_data.items.extend(keyed);
        Ok(BatchWriteOutput {
            written,
            unprocessed: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use dynarecord_core::model::KeyPart;

    use super::*;

    fn key(id: &str) -> Key {
        Key::new(KeyPart::new("id", id))
    }

    fn item(id: &str, name: &str) -> Item {
        [
            ("id".to_string(), Value::from(id)),
            ("name".to_string(), Value::from(name)),
        ]
        .into_iter()
        .collect()
    }

    async fn setup() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.create_table("users", "id", None).await;
        repo
    }

    #[tokio::test]
    async fn test_get_missing_item_returns_none() {
        let repo = setup().await;

        assert_eq!(repo.get_item("users", &key("nope")).await.unwrap(), None);
        assert_eq!(repo.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let repo = InMemoryRepository::new();

        let result = repo.get_item("users", &key("a")).await;

        assert!(matches!(result, Err(RepositoryError::TableNotFound(name)) if name == "users"));
    }

    #[tokio::test]
    async fn test_update_creates_then_patches_item() {
        let repo = setup().await;

        repo.update_item(
            "users",
            &key("a"),
            &[AttributeUpdate::put("name", "Ada"), AttributeUpdate::put("age", 36)],
        )
        .await
        .unwrap();
        repo.update_item("users", &key("a"), &[AttributeUpdate::delete("age")])
            .await
            .unwrap();

        let stored = repo.get_item("users", &key("a")).await.unwrap().unwrap();
        assert_eq!(stored, item("a", "Ada"));
    }

    #[tokio::test]
    async fn test_update_rejects_key_attribute() {
        let repo = setup().await;

        let result = repo
            .update_item("users", &key("a"), &[AttributeUpdate::put("id", "b")])
            .await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_key_must_match_table_schema() {
        let repo = setup().await;
        let wrong = Key::new(KeyPart::new("user_id", "a"));

        let result = repo.get_item("users", &wrong).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = setup().await;
        repo.batch_write_item("users", &[item("a", "Ada")]).await.unwrap();

        repo.delete_item("users", &key("a")).await.unwrap();
        repo.delete_item("users", &key("a")).await.unwrap();

        assert_eq!(repo.item_count("users").await, 0);
    }

    #[tokio::test]
    async fn test_batch_write_and_get() {
        let repo = setup().await;

        let output = repo
            .batch_write_item("users", &[item("a", "Ada"), item("b", "Bob")])
            .await
            .unwrap();
        let items = repo
            .batch_get_item("users", &[key("a"), key("b"), key("c")])
            .await
            .unwrap();

        assert_eq!(output.written, 2);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_write_requires_key_attributes() {
        let repo = setup().await;
        let keyless: Item = [("name".to_string(), Value::from("Ada"))].into_iter().collect();

        let result = repo.batch_write_item("users", &[keyless]).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
        assert_eq!(repo.item_count("users").await, 0);
    }

    #[tokio::test]
    async fn test_range_keyed_table() {
        let repo = InMemoryRepository::new();
        repo.create_table("messages", "room", Some("seq")).await;
        let first = Key::new(KeyPart::new("room", "lobby")).with_range(KeyPart::new("seq", 1));
        let second = Key::new(KeyPart::new("room", "lobby")).with_range(KeyPart::new("seq", 2));

        repo.update_item("messages", &first, &[AttributeUpdate::put("body", "hi")])
            .await
            .unwrap();

        assert!(repo.item("messages", &first).await.is_some());
        assert!(repo.item("messages", &second).await.is_none());
    }

    #[tokio::test]
    async fn test_failure_injection_logs_request() {
        let repo = setup().await;
        repo.set_failure(Some(RepositoryError::ConnectionFailed("down".to_string())))
            .await;

        let result = repo.get_item("users", &key("a")).await;

        assert!(matches!(result, Err(RepositoryError::ConnectionFailed(_))));
        assert_eq!(repo.request_count().await, 1);
        assert!(!repo.requests().await[0].is_write());
    }
}
