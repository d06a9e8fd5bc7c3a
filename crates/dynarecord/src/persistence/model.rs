use std::sync::Arc;

use chrono::Utc;
use dynarecord_core::model::{
    Key, KeyPart, ModelSchema, Record, RecordError, CREATED_AT, UPDATED_AT,
};
use dynarecord_core::storage::{
    AttributeUpdate, BatchWriteOutput, ItemRepository, MAX_BATCH_GET_KEYS,
};
use dynarecord_core::types::{CoercionMode, Format, Value};

use crate::batch::{write_records, BatchQueue};

use super::{Error, Result, SaveOptions};

/// A model bound to a store: schema, repository and batch queue.
///
/// Clones share the same repository and queue.
pub struct Model<R: ?Sized> {
    schema: Arc<ModelSchema>,
    repository: Arc<R>,
    queue: Arc<BatchQueue>,
}

impl<R: ?Sized> Clone for Model<R> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            repository: Arc::clone(&self.repository),
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<R: ?Sized> std::fmt::Debug for Model<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("schema", &self.schema)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl<R: ItemRepository + ?Sized> Model<R> {
    pub fn new(schema: Arc<ModelSchema>, repository: Arc<R>) -> Self {
        let queue = Arc::new(BatchQueue::new(schema.batch_size_limit()));
        Self {
            schema,
            repository,
            queue,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn table_name(&self) -> &str {
        self.schema.table_name()
    }

    fn name(&self) -> &str {
        self.schema.name()
    }

    // ------------------------------------------------------------------------
    // Single-item operations
    // ------------------------------------------------------------------------

    /// Builds an unsaved record. Nothing is written.
    pub fn new_record<I, K, V>(&self, attrs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Ok(Record::new(Arc::clone(&self.schema), attrs)?)
    }

    /// Builds and saves a record with default options.
    ///
    /// An invalid record is returned unsaved; check `is_new()` or `errors()`.
    pub async fn create<I, K, V>(&self, attrs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.create_with(attrs, SaveOptions::default()).await
    }

    pub async fn create_with<I, K, V>(&self, attrs: I, options: SaveOptions) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = self.new_record(attrs)?;
        self.save(&mut record, options).await?;
        Ok(record)
    }

    /// Like [`create`](Self::create), but an invalid record is an error.
    pub async fn create_strict<I, K, V>(&self, attrs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = self.new_record(attrs)?;
        self.save_strict(&mut record, SaveOptions::default()).await?;
        Ok(record)
    }

    /// Reads one item by key.
    ///
    /// Key values are coerced strictly. A range value is required when the
    /// model declares a range key.
    pub async fn find(&self, hash: impl Into<Value>, range: Option<Value>) -> Result<Record> {
        let (_, key) = self.lookup_key(hash.into(), range)?;
        self.find_by_key(&key).await
    }

    /// Reads one item by key, or builds an unsaved record carrying that key.
    pub async fn find_or_new(
        &self,
        hash: impl Into<Value>,
        range: Option<Value>,
    ) -> Result<Record> {
        let (requested, key) = self.lookup_key(hash.into(), range)?;
        match self.find_by_key(&key).await {
            Err(Error::NotFound { .. }) => {
                Ok(Record::with_key(Arc::clone(&self.schema), &requested)?)
            }
            other => other,
        }
    }

    async fn find_by_key(&self, key: &Key) -> Result<Record> {
        tracing::debug!(table = self.table_name(), %key, "Getting item");
        match self.repository.get_item(self.table_name(), key).await? {
            Some(item) => Ok(Record::from_item(Arc::clone(&self.schema), item)),
            None => Err(Error::NotFound {
                model: self.name().to_string(),
                key: key.to_string(),
            }),
        }
    }

    /// Writes the record's dirty attributes as one partial update.
    ///
    /// Returns `Ok(true)` without writing when nothing is dirty, and
    /// `Ok(false)` without writing when validation fails.
    pub async fn save(&self, record: &mut Record, options: SaveOptions) -> Result<bool> {
        if !record.has_changes() {
            tracing::debug!(model = self.name(), "Nothing to save");
            return Ok(true);
        }

        if options.validate && !record.is_valid() {
            tracing::debug!(model = self.name(), errors = %record.errors(), "Validation failed");
            return Ok(false);
        }

        self.persist(record, options).await?;
        Ok(true)
    }

    /// Like [`save`](Self::save), but a validation failure is an error.
    pub async fn save_strict(&self, record: &mut Record, options: SaveOptions) -> Result<()> {
        if record.has_changes() && options.validate && !record.is_valid() {
            return Err(Error::ValidationFailed {
                model: self.name().to_string(),
                errors: record.errors().clone(),
            });
        }

        self.save(record, SaveOptions { validate: false, ..options })
            .await
            .map(|_| ())
    }

    async fn persist(&self, record: &mut Record, options: SaveOptions) -> Result<()> {
        if record.ensure_hash_key() {
            tracing::debug!(model = self.name(), "Generated hash key");
        }

        if self.schema.timestamps() && !options.skip_timestamps {
            stamp_timestamps(record)?;
        }

        let key = record.store_key()?;
        let updates: Vec<AttributeUpdate> = record
            .changes()
            .into_iter()
            .filter(|(_, value)| !value.is_blank_string())
            .map(|(name, value)| {
                if value.is_null() {
                    AttributeUpdate::delete(name)
                } else {
                    AttributeUpdate::put(name, value)
                }
            })
            .collect();

        tracing::debug!(
            table = self.table_name(),
            %key,
            attributes = updates.len(),
            "Updating item"
        );
        self.repository
            .update_item(self.table_name(), &key, &updates)
            .await?;

        record.mark_persisted();
        Ok(())
    }

    /// Deletes the record's item, whether or not it exists, and marks the
    /// record destroyed.
    pub async fn delete(&self, record: &mut Record) -> Result<()> {
        let key = record.store_key()?;

        tracing::debug!(table = self.table_name(), %key, "Deleting item");
        self.repository.delete_item(self.table_name(), &key).await?;

        record.mark_destroyed();
        Ok(())
    }

    /// Writes only `updated_at = now`, leaving the dirty set alone.
    ///
    /// Fails with [`Error::StaleRecord`] for a record that was never saved.
    pub async fn touch(&self, record: &mut Record) -> Result<()> {
        if record.is_new() {
            return Err(Error::StaleRecord {
                model: self.name().to_string(),
            });
        }

        let key = record.store_key()?;
        // Epoch seconds even when `updated_at` is not declared on the schema.
        let now = (Format::Time.accessor().write)(Value::from(Utc::now()))?;
        let now = record.set_untracked(UPDATED_AT, now)?;

        tracing::debug!(table = self.table_name(), %key, "Touching item");
        self.repository
            .update_item(self.table_name(), &key, &[AttributeUpdate::put(UPDATED_AT, now)])
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------------

    /// Reads many items in one bulk request. Result order is unspecified.
    ///
    /// Fails before any store call when more than 100 keys are given.
    pub async fn batch_find<I, V>(&self, keys: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = (V, Option<V>)>,
        V: Into<Value>,
    {
        let keys: Vec<(V, Option<V>)> = keys.into_iter().collect();
        if keys.len() > MAX_BATCH_GET_KEYS {
            return Err(Error::BatchSizeExceeded {
                requested: keys.len(),
                limit: MAX_BATCH_GET_KEYS,
            });
        }
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let keys = keys
            .into_iter()
            .map(|(hash, range)| {
                self.lookup_key(hash.into(), range.map(Into::into))
                    .map(|(_, key)| key)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(table = self.table_name(), count = keys.len(), "Batch getting items");
        let items = self
            .repository
            .batch_get_item(self.table_name(), &keys)
            .await?;

        Ok(items
            .into_iter()
            .map(|item| Record::from_item(Arc::clone(&self.schema), item))
            .collect())
    }

    /// Puts the full current attribute set of each record in one bulk write.
    ///
    /// Records without a string hash key get a generated one.
    pub async fn batch_save(&self, records: &mut [Record]) -> Result<BatchWriteOutput> {
        for record in records.iter_mut() {
            record.ensure_hash_key();
        }
        write_records(self.repository.as_ref(), self.table_name(), records).await
    }

    // ------------------------------------------------------------------------
    // Batch queue
    // ------------------------------------------------------------------------

    /// Validates a new record and queues it for the next bulk write.
    ///
    /// Returns `Ok(false)` and queues nothing when validation fails. A
    /// candidate without a complete key fails with
    /// [`RecordError::MissingKey`] and is not queued. When the queue reaches
    /// the model's batch size limit it is flushed before this call returns.
    pub async fn enqueue_for_save<I, K, V>(&self, attrs: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = self.new_record(attrs)?;
        record.ensure_hash_key();

        if !record.is_valid() {
            tracing::debug!(model = self.name(), errors = %record.errors(), "Not enqueued");
            return Ok(false);
        }
        record.store_key()?;

        if self.schema.timestamps() {
            stamp_timestamps(&mut record)?;
        }

        if let Some(output) = self
            .queue
            .push(self.repository.as_ref(), self.table_name(), record)
            .await?
        {
            tracing::info!(
                table = self.table_name(),
                written = output.written,
                "Batch queue reached its limit"
            );
        }
        Ok(true)
    }

    /// Bulk-writes everything queued, even when the queue is empty.
    pub async fn flush_queue(&self) -> Result<BatchWriteOutput> {
        self.queue
            .flush(self.repository.as_ref(), self.table_name())
            .await
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.len().await
    }

    /// Drops queued records without writing them.
    pub async fn clear_queue(&self) -> usize {
        self.queue.clear().await
    }

    // ------------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------------

    /// Returns the key as requested and the key in store form.
    fn lookup_key(&self, hash: Value, range: Option<Value>) -> Result<(Key, Key)> {
        let hash_name = self.schema.hash_key();
        let mut requested = Key::new(KeyPart::new(hash_name, hash.clone()));
        let mut key = Key::new(self.key_part(hash_name, hash)?);

        match (self.schema.range_key(), range) {
            (Some(range_name), Some(range)) => {
                requested = requested.with_range(KeyPart::new(range_name, range.clone()));
                key = key.with_range(self.key_part(range_name, range)?);
            }
            (Some(range_name), None) => {
                return Err(RecordError::MissingKey(range_name.to_string()).into());
            }
            (None, Some(_)) => {
                tracing::debug!(model = self.name(), "Ignoring range value for hash-only model");
            }
            (None, None) => {}
        }

        Ok((requested, key))
    }

    fn key_part(&self, name: &str, value: Value) -> Result<KeyPart> {
        let raw = self
            .schema
            .registry()
            .write(name, value, CoercionMode::Strict)?;
        if raw.is_null() {
            return Err(RecordError::MissingKey(name.to_string()).into());
        }
        Ok(KeyPart::new(name, raw))
    }
}

/// `created_at` on first save if absent, `updated_at` always.
fn stamp_timestamps(record: &mut Record) -> Result<()> {
    let now = Utc::now();
    if record.is_new() && record.raw(CREATED_AT).is_none() {
        record.set(CREATED_AT, now)?;
    }
    record.set(UPDATED_AT, now)?;
    Ok(())
}
