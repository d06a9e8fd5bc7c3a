//! Bulk writes and the per-model batch queue.

mod queue;

pub use queue::BatchQueue;

use dynarecord_core::model::{Key, Record};
use dynarecord_core::storage::{BatchWriteOutput, Item, ItemRepository};

use crate::persistence::Result;

/// Puts the full attribute set of every record in one bulk write.
///
/// Blank strings are dropped from the payloads. Records the store accepted
/// are marked persisted; records returned as unprocessed are left untouched.
pub(crate) async fn write_records<R>(
    repository: &R,
    table: &str,
    records: &mut [Record],
) -> Result<BatchWriteOutput>
where
    R: ItemRepository + ?Sized,
{
    let mut keys = Vec::with_capacity(records.len());
    let mut items = Vec::with_capacity(records.len());
    for record in records.iter() {
        keys.push(record.store_key()?);
        items.push(put_payload(record));
    }

    tracing::debug!(table, count = items.len(), "Batch writing items");
    let output = repository.batch_write_item(table, &items).await?;

    if !output.is_complete() {
        tracing::warn!(
            table,
            unprocessed = output.unprocessed.len(),
            "Store returned unprocessed items"
        );
    }

    for (record, key) in records.iter_mut().zip(&keys) {
        if !is_unprocessed(key, &output.unprocessed) {
            record.mark_persisted();
        }
    }

    Ok(output)
}

fn put_payload(record: &Record) -> Item {
    let mut item = record.to_item();
    item.retain(|_, value| !value.is_blank_string() && !value.is_null());
    item
}

fn is_unprocessed(key: &Key, unprocessed: &[Item]) -> bool {
    unprocessed
        .iter()
        .any(|item| key.parts().all(|part| item.get(&part.name) == Some(&part.value)))
}

#[cfg(test)]
mod tests {
    use dynarecord_core::model::{KeyPart, ModelSchema};
    use dynarecord_core::types::Value;

    use super::*;

    #[test]
    fn test_put_payload_drops_blank_strings() {
        let schema = ModelSchema::builder("User")
            .attribute("name", "string")
            .attribute("nickname", "string")
            .build()
            .unwrap();
        let record = Record::new(
            schema,
            [("id", "u1"), ("name", "Ada"), ("nickname", "")],
        )
        .unwrap();

        let item = put_payload(&record);

        assert_eq!(item.get("name"), Some(&Value::from("Ada")));
        assert_eq!(item.get("id"), Some(&Value::from("u1")));
        assert!(!item.contains_key("nickname"));
    }

    #[test]
    fn test_is_unprocessed_matches_key_parts() {
        let key = Key::new(KeyPart::new("id", "u1"));
        let unprocessed: Item = [("id".to_string(), Value::from("u1"))].into_iter().collect();
        let other: Item = [("id".to_string(), Value::from("u2"))].into_iter().collect();

        assert!(is_unprocessed(&key, &[unprocessed]));
        assert!(!is_unprocessed(&key, &[other]));
        assert!(!is_unprocessed(&key, &[]));
    }
}
