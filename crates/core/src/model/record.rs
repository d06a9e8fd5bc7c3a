use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::attributes::AttributeStore;
use crate::storage::Item;
use crate::types::{CoercionMode, Format, Value};

use super::error::RecordError;
use super::key::{Key, KeyPart};
use super::schema::ModelSchema;
use super::validation::ValidationErrors;

/// A model instance: raw attributes, dirty state and persistence flags.
///
/// Typed values are produced on access by the schema's read rules.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<ModelSchema>,
    attributes: AttributeStore,
    new_record: bool,
    destroyed: bool,
    errors: ValidationErrors,
}

impl Record {
    /// Builds an unsaved record from an attribute payload.
    ///
    /// Key attributes are assigned without being marked dirty; every other
    /// provided attribute is dirty, in the order supplied.
    pub fn new<I, K, V>(schema: Arc<ModelSchema>, attrs: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Self {
            schema,
            attributes: AttributeStore::new(),
            new_record: true,
            destroyed: false,
            errors: ValidationErrors::new(),
        };

        for (name, value) in attrs {
            let name = name.as_ref();
            let value = value.into();
            if record.schema.is_key(name) {
                record.assign_key(name, value, CoercionMode::Lenient)?;
            } else {
                record
                    .attributes
                    .write(record.schema.registry(), name, value)?;
            }
        }

        Ok(record)
    }

    /// Wraps an item read from the store. The record is persisted and clean.
    pub fn from_item(schema: Arc<ModelSchema>, item: Item) -> Self {
        Self {
            schema,
            attributes: AttributeStore::from_raw(item),
            new_record: false,
            destroyed: false,
            errors: ValidationErrors::new(),
        }
    }

    /// Builds an unsaved record carrying only the given key.
    ///
    /// Key values are coerced strictly, as for lookups.
    pub fn with_key(schema: Arc<ModelSchema>, key: &Key) -> Result<Self, RecordError> {
        let mut record = Self::new(schema, std::iter::empty::<(&str, Value)>())?;
        for part in key.parts() {
            record.assign_key(&part.name, part.value.clone(), CoercionMode::Strict)?;
        }
        Ok(record)
    }

    fn assign_key(
        &mut self,
        name: &str,
        value: Value,
        mode: CoercionMode,
    ) -> Result<(), RecordError> {
        let raw = self.schema.registry().write(name, value, mode)?;
        self.attributes.put_raw(name, raw);
        Ok(())
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn model_name(&self) -> &str {
        self.schema.name()
    }

    /// Returns the typed value of `name`.
    pub fn get(&self, name: &str) -> Result<Value, RecordError> {
        Ok(self.attributes.read(self.schema.registry(), name)?)
    }

    /// Returns the raw wire value of `name`, if present.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.attributes.raw(name)
    }

    /// Sets `name` through its write rule and marks it dirty.
    ///
    /// Key attributes are write-once and fail with [`RecordError::ReadOnlyKey`].
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RecordError> {
        if self.schema.is_key(name) {
            return Err(RecordError::ReadOnlyKey(name.to_string()));
        }
        self.attributes
            .write(self.schema.registry(), name, value.into())?;
        Ok(())
    }

    /// Sets a non-key attribute without marking it dirty and returns the raw value stored.
    pub fn set_untracked(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Value, RecordError> {
        if self.schema.is_key(name) {
            return Err(RecordError::ReadOnlyKey(name.to_string()));
        }
        let raw = self
            .schema
            .registry()
            .write(name, value.into(), CoercionMode::Lenient)?;
        self.attributes.put_raw(name, raw.clone());
        Ok(raw)
    }

    /// Assigns a random UUID hash key if none is set and the hash key is string-typed.
    ///
    /// Returns true if a key was generated.
    pub fn ensure_hash_key(&mut self) -> bool {
        let hash_key = self.schema.hash_key().to_string();
        if self.attributes.contains(&hash_key) {
            return false;
        }
        match self.schema.registry().format_of(&hash_key) {
            Some(Format::String) | None => {
                self.attributes
                    .put_raw(&hash_key, Value::String(Uuid::new_v4().to_string()));
                true
            }
            Some(_) => false,
        }
    }

    fn key_with(
        &self,
        read: impl Fn(&str) -> Result<Value, RecordError>,
    ) -> Result<Key, RecordError> {
        let part = |name: &str| -> Result<KeyPart, RecordError> {
            if !self.attributes.contains(name) {
                return Err(RecordError::MissingKey(name.to_string()));
            }
            Ok(KeyPart::new(name, read(name)?))
        };

        let mut key = Key::new(part(self.schema.hash_key())?);
        if let Some(range_key) = self.schema.range_key() {
            key = key.with_range(part(range_key)?);
        }
        Ok(key)
    }

    /// The declared key attributes with their typed values.
    pub fn key(&self) -> Result<Key, RecordError> {
        self.key_with(|name| self.get(name))
    }

    /// The declared key attributes with their raw values, for addressing the store.
    pub fn store_key(&self) -> Result<Key, RecordError> {
        self.key_with(|name| Ok(self.attributes.raw(name).cloned().unwrap_or_default()))
    }

    /// Dirty attribute names in first-changed order.
    pub fn dirty(&self) -> &[String] {
        self.attributes.dirty()
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.attributes.is_dirty(name)
    }

    pub fn has_changes(&self) -> bool {
        self.attributes.has_changes()
    }

    /// Dirty names with their raw values; removed attributes are null.
    pub fn changes(&self) -> Vec<(&str, Value)> {
        self.attributes.changed()
    }

    pub fn clear_dirty(&mut self) {
        self.attributes.clear_dirty();
    }

    pub fn is_new(&self) -> bool {
        self.new_record
    }

    /// Marks the record as stored: clears dirty state and the new flag.
    pub fn mark_persisted(&mut self) {
        self.attributes.clear_dirty();
        self.new_record = false;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Runs the model's validator and keeps the collected failures.
    pub fn is_valid(&mut self) -> bool {
        self.errors = match self.schema.validate(self) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        self.errors.is_empty()
    }

    /// Failures from the last call to [`is_valid`](Self::is_valid).
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// All attributes with typed values, including declared defaults.
    ///
    /// Null values are omitted. A raw value that fails its read rule is
    /// reported as stored.
    pub fn attributes(&self) -> BTreeMap<String, Value> {
        let registry = self.schema.registry();
        let raw = self.attributes.raw_attributes();

        raw.keys()
            .map(String::as_str)
            .chain(registry.names().filter(|name| !raw.contains_key(*name)))
            .filter_map(|name| {
                let value = self
                    .attributes
                    .read(registry, name)
                    .unwrap_or_else(|_| raw.get(name).cloned().unwrap_or_default());
                (!value.is_null()).then(|| (name.to_string(), value))
            })
            .collect()
    }

    /// The full raw attribute set, as written by bulk puts.
    pub fn to_item(&self) -> Item {
        self.attributes.raw_attributes().clone()
    }

    /// Typed attributes as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.attributes()).unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.attributes() == other.attributes()
    }
}

impl Eq for Record {}
