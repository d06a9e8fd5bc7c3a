use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Serialize, Serializer};

/// An interned name, the typed form of `symbol` attributes.
///
/// Interning the same text twice yields handles to the same allocation.
/// Interned text lives for the rest of the process; the table never shrinks.
#[derive(Clone, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

fn interner() -> &'static Mutex<HashSet<Arc<str>>> {
    static TABLE: OnceLock<Mutex<HashSet<Arc<str>>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashSet::new()))
}

impl Symbol {
    /// Returns the interned symbol for `name`.
    pub fn intern(name: &str) -> Self {
        let mut table = interner().lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = table.get(name) {
            return Self(Arc::clone(existing));
        }
        let interned: Arc<str> = Arc::from(name);
        table.insert(Arc::clone(&interned));
        Self(interned)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if both handles point at the same interned allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::intern(name)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
