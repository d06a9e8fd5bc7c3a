//! dynarecord_core - typed, dirty-tracked records over a key-value store.
//!
//! Pure, synchronous building blocks: attribute formats and coercion rules,
//! the per-record attribute store, model schemas and records, and the store
//! client trait implemented by storage backends.

pub mod attributes;
pub mod model;
pub mod storage;
pub mod types;
