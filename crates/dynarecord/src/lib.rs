//! dynarecord - typed records persisted to DynamoDB with partial updates.
//!
//! A [`Model`] binds a [`ModelSchema`](dynarecord_core::model::ModelSchema)
//! to an [`ItemRepository`](dynarecord_core::storage::ItemRepository). It
//! reads and writes single items, saves only dirty attributes, and batches
//! bulk writes through a per-model queue.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dynarecord::{Config, Model, SaveOptions};
//! use dynarecord::storage::InMemoryRepository;
//!
//! let schema = Config::from_env().schema("User").attribute("age", "integer").build()?;
//! let repository = Arc::new(InMemoryRepository::new());
//! repository.create_table_for(&schema).await;
//!
//! let users = Model::new(schema, repository);
//! let mut user = users.create([("name", "Ada"), ("age", "36")]).await?;
//! user.set("age", 37)?;
//! users.save(&mut user, SaveOptions::default()).await?;
//! ```

pub mod batch;
pub mod config;
pub mod persistence;
pub mod storage;

pub use config::Config;
pub use persistence::{Error, Model, Result, SaveOptions};

pub use dynarecord_core::model::{Key, KeyPart, ModelSchema, Record, ValidationErrors};
pub use dynarecord_core::types::{Format, TypeOptions, Value, ValueSet};
