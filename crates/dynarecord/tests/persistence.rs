//! End-to-end flows against the in-memory store.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use dynarecord::storage::inmemory::{InMemoryRepository, StoreRequest};
use dynarecord::{Error, Format, Model, ModelSchema, SaveOptions, TypeOptions, Value, ValueSet};
use dynarecord_core::model::RecordError;
use dynarecord_core::types::CoercionError;

async fn model(schema: Arc<ModelSchema>) -> (Model<InMemoryRepository>, Arc<InMemoryRepository>) {
    let repository = Arc::new(InMemoryRepository::new());
    repository.create_table_for(&schema).await;
    (Model::new(schema, Arc::clone(&repository)), repository)
}

fn widget_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Widget")
        .attribute("bar", Format::Integer)
        .attribute("price", Format::Float)
        .attribute("kind", Format::Symbol)
        .attribute("active", Format::Boolean)
        .attribute("released_on", Format::Date)
        .attribute("checked_at", Format::Time)
        .attribute_with("sizes", Format::Set, TypeOptions::default().of(Format::Integer))
        .attribute_with("labels", Format::Array, TypeOptions::default().of(Format::String))
        .attribute_with("status", Format::String, TypeOptions::default().default_value("draft"))
        .batch_size_limit(3)
        .build()
        .unwrap()
}

fn integer_set(values: &[i64]) -> Value {
    Value::Set(values.iter().map(|v| Value::Integer(*v)).collect::<ValueSet>())
}

#[tokio::test]
async fn test_typed_values_survive_a_store_round_trip() {
    let (widgets, _) = model(widget_schema()).await;
    let checked_at = Utc.with_ymd_and_hms(2015, 1, 1, 12, 30, 0).unwrap();

    let created = widgets
        .create([
            ("bar", Value::from("2015")),
            ("price", Value::from("9.5")),
            ("kind", Value::from("gadget")),
            ("active", Value::from(true)),
            ("released_on", Value::from("2015-03-14")),
            ("checked_at", Value::from(checked_at)),
            (
                "sizes",
                Value::List(vec![Value::from(1), Value::from("2"), Value::from(3)]),
            ),
        ])
        .await
        .unwrap();

    let found = widgets.find(created.get("id").unwrap(), None).await.unwrap();

    assert_eq!(found.get("bar").unwrap(), Value::Integer(2015));
    assert_eq!(found.get("price").unwrap(), Value::Float(9.5));
    assert_eq!(found.get("kind").unwrap().as_symbol().unwrap().as_str(), "gadget");
    assert_eq!(found.get("active").unwrap(), Value::Bool(true));
    assert_eq!(
        found.get("released_on").unwrap(),
        Value::Date(NaiveDate::from_ymd_opt(2015, 3, 14).unwrap())
    );
    assert_eq!(found.get("checked_at").unwrap(), Value::Time(checked_at));
    assert_eq!(found.get("sizes").unwrap(), integer_set(&[1, 2, 3]));
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_null_writes_fall_back_to_defaults() {
    let (widgets, _) = model(widget_schema()).await;
    let mut widget = widgets.create([("status", "live"), ("bar", "1")]).await.unwrap();

    widget.set("status", Value::Null).unwrap();
    widget.set("bar", Value::Null).unwrap();
    widgets.save(&mut widget, SaveOptions::default()).await.unwrap();

    let found = widgets.find(widget.get("id").unwrap(), None).await.unwrap();
    assert_eq!(found.get("status").unwrap(), Value::from("draft"));
    assert_eq!(found.get("bar").unwrap(), Value::Null);
}

#[tokio::test]
async fn test_dirty_tracking_from_construction_to_save() {
    let (widgets, _) = model(widget_schema()).await;

    let mut widget = widgets
        .new_record([("id", "w1"), ("kind", "gadget"), ("bar", "7")])
        .unwrap();
    assert_eq!(widget.dirty(), ["kind", "bar"]);

    widget.set("bar", 8).unwrap();
    widget.set("bar", 9).unwrap();
    assert_eq!(widget.dirty(), ["kind", "bar"]);

    widgets.save(&mut widget, SaveOptions::default()).await.unwrap();
    assert!(widget.dirty().is_empty());

    let found = widgets.find("w1", None).await.unwrap();
    assert!(found.dirty().is_empty());
    assert_eq!(found.get("bar").unwrap(), Value::Integer(9));
}

#[tokio::test]
async fn test_key_attributes_are_read_only() {
    let (widgets, _) = model(widget_schema()).await;
    let mut widget = widgets.create([("id", "w1"), ("bar", "1")]).await.unwrap();

    let result = widget.set("id", "w2");

    assert!(matches!(result, Err(RecordError::ReadOnlyKey(name)) if name == "id"));
}

#[tokio::test]
async fn test_setter_wraps_scalars_but_lookups_are_strict() {
    let (widgets, _) = model(widget_schema()).await;
    let mut widget = widgets.new_record([("id", "w1")]).unwrap();

    widget.set("sizes", "4").unwrap();
    assert_eq!(widget.get("sizes").unwrap(), integer_set(&[4]));

    let tagged = ModelSchema::builder("Tagged")
        .hash_key("tags", Format::Set)
        .build()
        .unwrap();
    let (tagged, repository) = model(tagged).await;

    let result = tagged.find("solo", None).await;

    assert!(matches!(
        result,
        Err(Error::Record(RecordError::Coercion(
            CoercionError::InvalidEnumerableValue { .. }
        )))
    ));
    assert_eq!(repository.request_count().await, 0);
}

#[tokio::test]
async fn test_equality_ignores_dirty_state() {
    let (widgets, _) = model(widget_schema()).await;
    let attrs = [("id", "w1"), ("bar", "5"), ("kind", "gadget")];

    let first = widgets.new_record(attrs).unwrap();
    let mut second = widgets.new_record(attrs).unwrap();
    second.clear_dirty();
    assert_eq!(first, second);

    second.set("bar", 6).unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_range_keyed_model() {
    let schema = ModelSchema::builder("Message")
        .hash_key("room", Format::String)
        .range_key("seq", Format::Integer)
        .attribute("body", Format::String)
        .build()
        .unwrap();
    let (messages, _) = model(schema).await;

    messages
        .create([
            ("room", Value::from("lobby")),
            ("seq", Value::from("1")),
            ("body", Value::from("hello")),
        ])
        .await
        .unwrap();

    let found = messages
        .find("lobby", Some(Value::from(1)))
        .await
        .unwrap();
    assert_eq!(found.get("body").unwrap(), Value::from("hello"));

    let missing = messages.find("lobby", Some(Value::from(2))).await;
    assert!(matches!(missing, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn test_queue_flushes_once_at_the_limit() {
    let (widgets, repository) = model(widget_schema()).await;

    assert!(widgets.enqueue_for_save([("id", "a"), ("bar", "1")]).await.unwrap());
    assert!(widgets.enqueue_for_save([("id", "b"), ("bar", "2")]).await.unwrap());
    assert_eq!(widgets.queue_len().await, 2);
    assert_eq!(repository.request_count().await, 0);

    assert!(widgets.enqueue_for_save([("id", "c"), ("bar", "3")]).await.unwrap());

    assert_eq!(widgets.queue_len().await, 0);
    let writes: Vec<StoreRequest> = repository
        .requests()
        .await
        .into_iter()
        .filter(StoreRequest::is_write)
        .collect();
    assert_eq!(writes.len(), 1);
    assert!(matches!(
        &writes[0],
        StoreRequest::BatchWriteItem { items, .. } if items.len() == 3
    ));

    let found = widgets
        .batch_find([("a", None), ("b", None), ("c", None)])
        .await
        .unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|widget| widget.raw("created_at").is_some()));
}

#[tokio::test]
async fn test_invalid_payload_is_not_enqueued() {
    let schema = ModelSchema::builder("Widget")
        .attribute("bar", Format::Integer)
        .validator(|record: &dynarecord::Record| {
            let mut errors = dynarecord::ValidationErrors::new();
            if record.raw("bar").is_none() {
                errors.add("bar", "is required");
            }
            errors.into_result()
        })
        .build()
        .unwrap();
    let (widgets, repository) = model(schema).await;

    assert!(!widgets.enqueue_for_save([("kind", "gadget")]).await.unwrap());
    assert_eq!(widgets.queue_len().await, 0);

    assert!(widgets.enqueue_for_save([("bar", "1")]).await.unwrap());
    let output = widgets.flush_queue().await.unwrap();
    assert_eq!(output.written, 1);
    assert_eq!(repository.item_count("widgets").await, 1);
}

#[tokio::test]
async fn test_flushing_an_empty_queue_asks_the_store() {
    let (widgets, repository) = model(widget_schema()).await;

    let output = widgets.flush_queue().await.unwrap();

    assert_eq!(output.written, 0);
    assert!(output.unprocessed.is_empty());
    assert_eq!(repository.request_count().await, 1);
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let (widgets, repository) = model(widget_schema()).await;
    repository
        .set_failure(Some(
            dynarecord_core::storage::RepositoryError::QueryFailed("throttled".to_string()),
        ))
        .await;

    let result = widgets.create([("bar", "1")]).await;

    assert!(matches!(result, Err(Error::Repository(_))));
}
