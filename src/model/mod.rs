//! Persistent model: the static schema queries are compiled against.
//!
//! - [`PersistentEntity`] - a mapped type with its table, identity and properties
//! - [`PersistentProperty`] / [`Association`] - typed attributes and relations
//! - [`EntityRegistry`] - shared cache of entities keyed by qualified name

pub mod entity;
pub mod naming;
pub mod property;
pub mod registry;
pub mod types;

pub use entity::{Identity, PersistentEntity};
pub use naming::NamingStrategy;
pub use property::{Association, PersistentProperty, Relation};
pub use registry::EntityRegistry;
pub use types::DataType;
