mod error;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use traits::ItemRepository;
pub use types::{
    AttributeAction, AttributeUpdate, BatchWriteOutput, Item, MAX_BATCH_GET_KEYS,
    MAX_BATCH_WRITE_ITEMS,
};
