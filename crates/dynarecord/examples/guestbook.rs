//! Guestbook demo: signs, edits and batch-imports entries in an in-memory store.
//!
//! ```bash
//! RUST_LOG=dynarecord=debug cargo run -p dynarecord --example guestbook
//! ```

use std::sync::Arc;

use anyhow::Result;
use dynarecord::storage::InMemoryRepository;
use dynarecord::{
    Config, Format, Model, Record, SaveOptions, TypeOptions, ValidationErrors, Value,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn require_author(record: &Record) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if record.raw("author").and_then(|v| v.as_str()).map_or(true, str::is_empty) {
        errors.add("author", "can't be blank");
    }
    errors.into_result()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynarecord=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let schema = config
        .schema("GuestbookEntry")
        .attribute("author", Format::String)
        .attribute("message", Format::String)
        .attribute("stars", Format::Integer)
        .attribute_with("tags", Format::Set, TypeOptions::default().of(Format::String))
        .validator(require_author)
        .build()?;

    let repository = Arc::new(InMemoryRepository::new());
    repository.create_table_for(&schema).await;
    let entries = Model::new(schema, repository);

    let mut entry = entries
        .create_strict([("author", "ada"), ("message", "Lovely place"), ("stars", "5")])
        .await?;
    tracing::info!(entry = %entry.to_json(), "Signed the guestbook");

    entry.set("tags", vec!["friendly", "quiet"])?;
    entries.save(&mut entry, SaveOptions::default()).await?;
    entries.touch(&mut entry).await?;

    let rejected = entries.create([("message", "anonymous")]).await?;
    tracing::info!(errors = %rejected.errors(), "Entry was not saved");

    for (author, stars) in [("bob", 4), ("carol", 3), ("dave", 5)] {
        entries
            .enqueue_for_save([("author", Value::from(author)), ("stars", Value::from(stars))])
            .await?;
    }
    let output = entries.flush_queue().await?;
    tracing::info!(written = output.written, "Imported queued entries");

    let id = entry.get("id")?;
    let reloaded = entries.find(id, None).await?;
    tracing::info!(entry = %reloaded.to_json(), "Reloaded entry");

    Ok(())
}
