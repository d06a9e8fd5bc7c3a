mod coercion;
mod declaration;
mod error;
mod format;
mod registry;
mod symbol;
mod value;

pub use coercion::{Accessor, CoercionMode, Rule};
pub use declaration::{TypeDeclaration, TypeOptions};
pub use error::{CoercionError, DeclarationError};
pub use format::Format;
pub use registry::TypeRegistry;
pub use symbol::Symbol;
pub use value::{Value, ValueSet};
