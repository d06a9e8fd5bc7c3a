mod error;
mod key;
mod naming;
mod record;
mod schema;
mod validation;

pub use error::RecordError;
pub use key::{Key, KeyPart};
pub use naming::{pluralize, snake_case, table_name};
pub use record::Record;
pub use schema::{
    ModelSchema, ModelSchemaBuilder, CREATED_AT, DEFAULT_BATCH_SIZE_LIMIT, DEFAULT_HASH_KEY,
    UPDATED_AT,
};
pub use validation::{AlwaysValid, Validate, ValidationError, ValidationErrors};
