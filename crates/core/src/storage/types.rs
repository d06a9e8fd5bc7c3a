use std::collections::HashMap;

use crate::types::Value;

/// Maximum keys the store accepts in one bulk read.
pub const MAX_BATCH_GET_KEYS: usize = 100;
/// Maximum put requests the store accepts in one bulk write request.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// An item as exchanged with the store: attribute name to wire value.
pub type Item = HashMap<String, Value>;

/// What an update does to one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeAction {
    /// Replace the stored value.
    Put(Value),
    /// Remove the attribute from the item.
    Delete,
}

/// One entry of a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeUpdate {
    pub name: String,
    pub action: AttributeAction,
}

impl AttributeUpdate {
    pub fn put(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            action: AttributeAction::Put(value.into()),
        }
    }

    pub fn delete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: AttributeAction::Delete,
        }
    }
}

/// Result of a bulk write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchWriteOutput {
    /// Number of put requests the store accepted.
    pub written: usize,
    /// Items the store returned as unprocessed. They are not retried.
    pub unprocessed: Vec<Item>,
}

impl BatchWriteOutput {
    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_constructors() {
        assert_eq!(
            AttributeUpdate::put("name", "x").action,
            AttributeAction::Put(Value::from("x"))
        );
        assert_eq!(AttributeUpdate::delete("name").action, AttributeAction::Delete);
    }

    #[test]
    fn test_batch_output_completeness() {
        assert!(BatchWriteOutput::default().is_complete());
        let output = BatchWriteOutput {
            written: 1,
            unprocessed: vec![Item::new()],
        };
        assert!(!output.is_complete());
    }
}
