mod store;

pub use store::AttributeStore;
