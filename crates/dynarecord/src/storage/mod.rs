//! Storage backend implementations.
//!
//! This module provides concrete implementations of the `ItemRepository`
//! trait defined in `dynarecord_core::storage`, selected via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-memory backend with a request log, for tests
//! - `dynamodb`: AWS DynamoDB backend using `aws-sdk-dynamodb`
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p dynarecord --features dynamodb
//! ```

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryRepository;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbRepository;
