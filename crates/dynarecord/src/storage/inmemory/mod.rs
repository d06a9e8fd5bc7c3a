//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of [`ItemRepository`]
//! that keeps tables in HashMaps wrapped in `Arc<RwLock<_>>` and logs every
//! request it receives.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynarecord::storage::inmemory::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! repo.create_table("users", "id", None).await;
//! ```
//!
//! [`ItemRepository`]: dynarecord_core::storage::ItemRepository

mod repository;

pub use repository::{InMemoryRepository, StoreRequest};
