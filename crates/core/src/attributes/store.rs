use std::collections::HashMap;

use crate::types::{CoercionError, CoercionMode, TypeRegistry, Value};

/// Raw attribute values of one record plus the names changed since the last save.
///
/// Values are kept in wire form. `dirty` holds each changed name once, in
/// first-changed order.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    raw: HashMap<String, Value>,
    dirty: Vec<String>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an item read from the store. Nothing is dirty.
    pub fn from_raw(raw: HashMap<String, Value>) -> Self {
        Self {
            raw,
            dirty: Vec::new(),
        }
    }

    /// Coerces `value` through the write rule for `name`, stores it and marks `name` dirty.
    ///
    /// A null that coerces to a null default removes the raw value.
    pub fn write(
        &mut self,
        registry: &TypeRegistry,
        name: &str,
        value: Value,
    ) -> Result<(), CoercionError> {
        let raw = registry.write(name, value, CoercionMode::Lenient)?;
        self.put_raw(name, raw);
        self.mark_dirty(name);
        Ok(())
    }

    /// Stores an already-coerced value without touching the dirty set.
    pub fn put_raw(&mut self, name: &str, raw: Value) {
        if raw.is_null() {
            self.raw.remove(name);
        } else {
            self.raw.insert(name.to_string(), raw);
        }
    }

    /// Returns the read-rule coercion of the raw value for `name`.
    pub fn read(&self, registry: &TypeRegistry, name: &str) -> Result<Value, CoercionError> {
        registry.read(name, self.raw.get(name))
    }

    /// Returns the stored wire value, if any.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }

    pub fn raw_attributes(&self) -> &HashMap<String, Value> {
        &self.raw
    }

    pub fn contains(&self, name: &str) -> bool {
        self.raw.contains_key(name)
    }

    fn mark_dirty(&mut self, name: &str) {
        if !self.is_dirty(name) {
            self.dirty.push(name.to_string());
        }
    }

    /// Dirty attribute names in first-changed order.
    pub fn dirty(&self) -> &[String] {
        &self.dirty
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.dirty.iter().any(|n| n == name)
    }

    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Dirty names paired with their current raw values (null when removed).
    pub fn changed(&self) -> Vec<(&str, Value)> {
        self.dirty
            .iter()
            .map(|name| {
                let raw = self.raw.get(name).cloned().unwrap_or_default();
                (name.as_str(), raw)
            })
            .collect()
    }

    /// Empties the dirty set. Raw values are kept.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}
