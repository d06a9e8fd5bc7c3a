use std::fmt;

use crate::storage::Item;
use crate::types::Value;

/// One component of a primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    pub name: String,
    pub value: Value,
}

impl KeyPart {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A primary key: the hash key plus an optional range key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub hash: KeyPart,
    pub range: Option<KeyPart>,
}

impl Key {
    pub fn new(hash: KeyPart) -> Self {
        Self { hash, range: None }
    }

    pub fn with_range(mut self, range: KeyPart) -> Self {
        self.range = Some(range);
        self
    }

    /// Iterates over the hash part, then the range part if present.
    pub fn parts(&self) -> impl Iterator<Item = &KeyPart> {
        std::iter::once(&self.hash).chain(self.range.as_ref())
    }

    /// Returns the key as an attribute map.
    pub fn to_item(&self) -> Item {
        self.parts()
            .map(|part| (part.name.clone(), part.value.clone()))
            .collect()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.hash.name, self.hash.value)?;
        if let Some(range) = &self.range {
            write!(f, ", {}={}", range.name, range.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_only_key() {
        let key = Key::new(KeyPart::new("id", "abc"));
        assert_eq!(key.to_string(), "id=abc");
        assert_eq!(key.to_item().len(), 1);
    }

    #[test]
    fn test_composite_key() {
        let key = Key::new(KeyPart::new("user_id", "u1")).with_range(KeyPart::new("seq", 3));
        assert_eq!(key.to_string(), "user_id=u1, seq=3");
        let item = key.to_item();
        assert_eq!(item.get("seq"), Some(&Value::Integer(3)));
        assert_eq!(key.parts().count(), 2);
    }
}
