//! Persistent properties and associations.

use serde::{Deserialize, Serialize};

use super::naming::NamingStrategy;
use super::types::DataType;

/// Kind of relation an association expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    Embedded,
}

impl Relation {
    /// Whether the association refers to a collection of rows.
    pub fn is_collection(&self) -> bool {
        matches!(self, Relation::OneToMany | Relation::ManyToMany)
    }
}

/// Association metadata attached to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub kind: Relation,

    /// Qualified name of the associated entity.
    pub entity: String,

    /// Property on the associated entity that owns the relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_by: Option<String>,

    /// Explicit join table for many-to-many (and unidirectional one-to-many).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_table: Option<String>,
}

impl Association {
    pub fn new(kind: Relation, entity: impl Into<String>) -> Self {
        Self {
            kind,
            entity: entity.into(),
            mapped_by: None,
            join_table: None,
        }
    }

    pub fn one_to_one(entity: impl Into<String>) -> Self {
        Self::new(Relation::OneToOne, entity)
    }

    pub fn one_to_many(entity: impl Into<String>) -> Self {
        Self::new(Relation::OneToMany, entity)
    }

    pub fn many_to_one(entity: impl Into<String>) -> Self {
        Self::new(Relation::ManyToOne, entity)
    }

    pub fn many_to_many(entity: impl Into<String>) -> Self {
        Self::new(Relation::ManyToMany, entity)
    }

    pub fn embedded(entity: impl Into<String>) -> Self {
        Self::new(Relation::Embedded, entity)
    }

    pub fn mapped_by(mut self, property: impl Into<String>) -> Self {
        self.mapped_by = Some(property.into());
        self
    }

    pub fn join_table(mut self, table: impl Into<String>) -> Self {
        self.join_table = Some(table.into());
        self
    }

    /// Whether the owning entity's table holds the foreign key.
    pub fn is_foreign_key_owner(&self) -> bool {
        matches!(self.kind, Relation::OneToOne | Relation::ManyToOne) && self.mapped_by.is_none()
    }

    /// Whether traversing this association goes through a join table.
    pub fn uses_join_table(&self) -> bool {
        match self.kind {
            Relation::ManyToMany => true,
            Relation::OneToMany => self.mapped_by.is_none(),
            _ => false,
        }
    }
}

/// A typed, named attribute of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentProperty {
    pub name: String,

    #[serde(rename = "type", default)]
    pub data_type: DataType,

    /// Explicit column mapping; overrides the naming strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default)]
    pub nullable: bool,

    /// Value is generated by the database (identity columns).
    #[serde(default)]
    pub generated: bool,

    /// Value is populated by the runtime (timestamps, versions).
    #[serde(default)]
    pub auto_populated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association: Option<Association>,
}

impl PersistentProperty {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            column: None,
            nullable: false,
            generated: false,
            auto_populated: false,
            association: None,
        }
    }

    /// An association-valued property.
    pub fn association(name: impl Into<String>, association: Association) -> Self {
        Self {
            association: Some(association),
            ..Self::new(name, DataType::Entity)
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub fn auto_populated(mut self) -> Self {
        self.auto_populated = true;
        self
    }

    /// Column name under the given naming strategy.
    pub fn column_name(&self, naming: NamingStrategy) -> String {
        match &self.column {
            Some(column) => column.clone(),
            None => naming.map_name(&self.name),
        }
    }

    pub fn is_association(&self) -> bool {
        self.association.is_some()
    }

    pub fn is_embedded(&self) -> bool {
        matches!(
            self.association,
            Some(Association {
                kind: Relation::Embedded,
                ..
            })
        )
    }
}
