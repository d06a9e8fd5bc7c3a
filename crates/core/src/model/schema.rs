use std::fmt;
use std::sync::Arc;

use crate::types::{DeclarationError, Format, TypeOptions, TypeRegistry};

use super::naming;
use super::validation::{AlwaysValid, Validate, ValidationErrors};
use super::Record;

/// Hash key name used when a model does not declare one.
pub const DEFAULT_HASH_KEY: &str = "id";
/// Timestamp set on the first save.
pub const CREATED_AT: &str = "created_at";
/// Timestamp refreshed on every save and on touch.
pub const UPDATED_AT: &str = "updated_at";
/// Default batch queue flush threshold, the store's per-request write limit.
pub const DEFAULT_BATCH_SIZE_LIMIT: usize = 25;

/// Class-level description of a model, shared read-only by all its records.
pub struct ModelSchema {
    name: String,
    table_name: String,
    hash_key: String,
    range_key: Option<String>,
    registry: TypeRegistry,
    timestamps: bool,
    batch_size_limit: usize,
    validator: Arc<dyn Validate>,
}

impl ModelSchema {
    /// Starts declaring a model named `name`.
    pub fn builder(name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    pub fn range_key(&self) -> Option<&str> {
        self.range_key.as_deref()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn timestamps(&self) -> bool {
        self.timestamps
    }

    pub fn batch_size_limit(&self) -> usize {
        self.batch_size_limit
    }

    /// Returns true if `name` is the hash key or the range key.
    pub fn is_key(&self, name: &str) -> bool {
        self.hash_key == name || self.range_key.as_deref() == Some(name)
    }

    /// Runs the injected validator.
    pub fn validate(&self, record: &Record) -> Result<(), ValidationErrors> {
        self.validator.validate(record)
    }
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("hash_key", &self.hash_key)
            .field("range_key", &self.range_key)
            .field("registry", &self.registry)
            .field("timestamps", &self.timestamps)
            .field("batch_size_limit", &self.batch_size_limit)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ModelSchema`]. Declarations are checked in [`build`](Self::build).
pub struct ModelSchemaBuilder {
    name: String,
    table: Option<String>,
    namespace: Option<String>,
    hash_key: String,
    range_key: Option<String>,
    attributes: Vec<(String, String, TypeOptions)>,
    timestamps: bool,
    batch_size_limit: usize,
    validator: Arc<dyn Validate>,
}

impl ModelSchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            namespace: None,
            hash_key: DEFAULT_HASH_KEY.to_string(),
            range_key: None,
            attributes: Vec::new(),
            timestamps: true,
            batch_size_limit: DEFAULT_BATCH_SIZE_LIMIT,
            validator: Arc::new(AlwaysValid),
        }
    }

    /// Overrides the derived table name. The namespace is not applied.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Prefixes the derived table name with `<namespace>_`.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn hash_key(mut self, name: impl Into<String>, format: impl AsRef<str>) -> Self {
        let name = name.into();
        self.hash_key = name.clone();
        self.attribute(name, format)
    }

    pub fn range_key(mut self, name: impl Into<String>, format: impl AsRef<str>) -> Self {
        let name = name.into();
        self.range_key = Some(name.clone());
        self.attribute(name, format)
    }

    pub fn attribute(self, name: impl Into<String>, format: impl AsRef<str>) -> Self {
        self.attribute_with(name, format, TypeOptions::default())
    }

    pub fn attribute_with(
        mut self,
        name: impl Into<String>,
        format: impl AsRef<str>,
        options: TypeOptions,
    ) -> Self {
        self.attributes
            .push((name.into(), format.as_ref().to_string(), options));
        self
    }

    /// Enables or disables automatic `created_at`/`updated_at` (on by default).
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Sets the batch queue flush threshold. Values below 1 are raised to 1.
    pub fn batch_size_limit(mut self, limit: usize) -> Self {
        self.batch_size_limit = limit.max(1);
        self
    }

    pub fn validator(mut self, validator: impl Validate + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn build(self) -> Result<Arc<ModelSchema>, DeclarationError> {
        let mut registry = TypeRegistry::new();

        for (name, format, options) in self.attributes {
            registry.declare(name, format, options)?;
        }

        if !registry.contains(&self.hash_key) {
            registry.declare(&self.hash_key, Format::String, TypeOptions::default())?;
        }

        if self.timestamps {
            for name in [CREATED_AT, UPDATED_AT] {
                if !registry.contains(name) {
                    registry.declare(name, Format::Time, TypeOptions::default())?;
                }
            }
        }

        let table_name = self
            .table
            .unwrap_or_else(|| naming::table_name(&self.name, self.namespace.as_deref()));

        Ok(Arc::new(ModelSchema {
            name: self.name,
            table_name,
            hash_key: self.hash_key,
            range_key: self.range_key,
            registry,
            timestamps: self.timestamps,
            batch_size_limit: self.batch_size_limit,
            validator: self.validator,
        }))
    }
}
