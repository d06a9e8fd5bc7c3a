//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of `ItemRepository`
//! using `aws-sdk-dynamodb`. Partial updates use `UpdateItem` with
//! `AttributeUpdates`; bulk writes are split into requests of 25 items.

mod client;
mod conversions;
mod error;
mod repository;

pub use client::{create_client, AwsConfig};
pub use repository::DynamoDbRepository;
