use std::env;

use dynarecord_core::model::{ModelSchema, ModelSchemaBuilder, DEFAULT_BATCH_SIZE_LIMIT};

/// Model defaults loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Table name prefix, applied as `<namespace>_<table>` (default: none)
    pub namespace: Option<String>,
    /// Batch queue flush threshold (default: 25)
    pub batch_size: usize,
    /// Automatic `created_at`/`updated_at` stamping (default: true)
    pub timestamps: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNARECORD_NAMESPACE` - Table name prefix (default: none)
    /// - `DYNARECORD_BATCH_SIZE` - Batch queue flush threshold (default: 25)
    /// - `DYNARECORD_TIMESTAMPS` - Set to `false` to disable timestamps (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            namespace: lookup("DYNARECORD_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            batch_size: lookup("DYNARECORD_BATCH_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_BATCH_SIZE_LIMIT),
            timestamps: lookup("DYNARECORD_TIMESTAMPS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }

    /// Starts a schema for `model` with these defaults applied.
    pub fn schema(&self, model: impl Into<String>) -> ModelSchemaBuilder {
        let builder = ModelSchema::builder(model)
            .batch_size_limit(self.batch_size)
            .timestamps(self.timestamps);

        match &self.namespace {
            Some(namespace) => builder.namespace(namespace.clone()),
            None => builder,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
