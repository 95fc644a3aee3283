//! Persistent entities.

use serde::{Deserialize, Serialize};

use super::naming::{self, NamingStrategy};
use super::property::PersistentProperty;

/// Identity of an entity.
///
/// Exactly one of the three shapes holds; the enum makes the other two
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    #[default]
    None,
    Single(PersistentProperty),
    /// Ordered components of a composite key.
    Composite(Vec<PersistentProperty>),
}

impl Identity {
    /// Identity properties in key order.
    pub fn properties(&self) -> &[PersistentProperty] {
        match self {
            Identity::None => &[],
            Identity::Single(prop) => std::slice::from_ref(prop),
            Identity::Composite(props) => props,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Identity::None)
    }
}

/// A mapped persistent type.
///
/// Built once per type and treated as immutable afterwards; the registry hands
/// out shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentEntity {
    /// Qualified type name, unique within a registry.
    pub name: String,

    /// Explicit table mapping; overrides the naming strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default)]
    pub naming: NamingStrategy,

    #[serde(default)]
    pub identity: Identity,

    /// Version property for optimistic locking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<PersistentProperty>,

    /// Declared properties, excluding identity and version.
    #[serde(default)]
    pub properties: Vec<PersistentProperty>,
}

impl PersistentEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            naming: NamingStrategy::default(),
            identity: Identity::None,
            version: None,
            properties: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Declare a single identity property.
    pub fn id(mut self, property: PersistentProperty) -> Self {
        self.identity = Identity::Single(property);
        self
    }

    /// Declare a composite identity.
    pub fn composite_id(mut self, properties: Vec<PersistentProperty>) -> Self {
        self.identity = Identity::Composite(properties);
        self
    }

    pub fn version(mut self, property: PersistentProperty) -> Self {
        self.version = Some(property);
        self
    }

    pub fn property(mut self, property: PersistentProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Unqualified type name.
    pub fn simple_name(&self) -> &str {
        naming::simple_name(&self.name)
    }

    /// Default query alias: the decapitalized simple name.
    pub fn alias_name(&self) -> String {
        naming::decapitalize(&self.name)
    }

    /// Table name under the entity's naming strategy.
    pub fn table_name(&self) -> String {
        match &self.table {
            Some(table) => table.clone(),
            None => self.naming.map_name(self.simple_name()),
        }
    }

    pub fn column_name(&self, property: &PersistentProperty) -> String {
        property.column_name(self.naming)
    }

    /// Look up a property by name, including identity and version properties.
    pub fn property_named(&self, name: &str) -> Option<&PersistentProperty> {
        self.identity
            .properties()
            .iter()
            .chain(self.version.iter())
            .chain(self.properties.iter())
            .find(|p| p.name == name)
    }

    /// Identity, version and declared properties, in that order.
    pub fn all_properties(&self) -> impl Iterator<Item = &PersistentProperty> {
        self.identity
            .properties()
            .iter()
            .chain(self.version.iter())
            .chain(self.properties.iter())
    }

    pub fn is_version(&self, name: &str) -> bool {
        self.version.as_ref().is_some_and(|v| v.name == name)
    }

    pub fn is_identity(&self, name: &str) -> bool {
        self.identity.properties().iter().any(|p| p.name == name)
    }
}
