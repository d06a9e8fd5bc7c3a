//! Model-level persistence: single-item reads and writes, bulk operations
//! and the batch queue entry points.

mod error;
mod model;
mod options;

pub use error::{Error, Result};
pub use model::Model;
pub use options::SaveOptions;
