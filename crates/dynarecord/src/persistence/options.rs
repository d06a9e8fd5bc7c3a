use serde::{Deserialize, Serialize};

/// Options accepted by `save` and `create_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// Run the model's validator before writing (default: true).
    pub validate: bool,
    /// Leave `created_at`/`updated_at` untouched (default: false).
    pub skip_timestamps: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            validate: true,
            skip_timestamps: false,
        }
    }
}

impl SaveOptions {
    pub fn without_validation() -> Self {
        Self {
            validate: false,
            ..Self::default()
        }
    }

    pub fn without_timestamps() -> Self {
        Self {
            skip_timestamps: true,
            ..Self::default()
        }
    }
}
