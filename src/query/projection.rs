//! Projections: the expressions a query selects.

use serde::{Deserialize, Serialize};

/// A selected expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Row count; syntax is supplied by the dialect.
    Count,
    /// `SELECT DISTINCT` over the entity.
    Distinct,
    /// `DISTINCT(alias.column)`.
    DistinctProperty { property: String },
    /// The identity column(s).
    Id,
    /// A single property, optionally aliased.
    Property {
        property: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    CountDistinct { property: String },
    Avg { property: String },
    Sum { property: String },
    Min { property: String },
    Max { property: String },
}

impl Projection {
    pub fn property(property: &str) -> Self {
        Projection::Property {
            property: property.into(),
            alias: None,
        }
    }

    pub fn property_as(property: &str, alias: &str) -> Self {
        Projection::Property {
            property: property.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn distinct_property(property: &str) -> Self {
        Projection::DistinctProperty {
            property: property.into(),
        }
    }

    pub fn count_distinct(property: &str) -> Self {
        Projection::CountDistinct {
            property: property.into(),
        }
    }

    pub fn avg(property: &str) -> Self {
        Projection::Avg {
            property: property.into(),
        }
    }

    pub fn sum(property: &str) -> Self {
        Projection::Sum {
            property: property.into(),
        }
    }

    pub fn min(property: &str) -> Self {
        Projection::Min {
            property: property.into(),
        }
    }

    pub fn max(property: &str) -> Self {
        Projection::Max {
            property: property.into(),
        }
    }

    /// Aggregate function name, for aggregate projections.
    pub fn function_name(&self) -> Option<&'static str> {
        match self {
            Projection::Avg { .. } => Some("AVG"),
            Projection::Sum { .. } => Some("SUM"),
            Projection::Min { .. } => Some("MIN"),
            Projection::Max { .. } => Some("MAX"),
            Projection::CountDistinct { .. } => Some("COUNT"),
            _ => None,
        }
    }

    /// Whether the projection aggregates over all matched rows.
    pub fn is_aggregate(&self) -> bool {
        *self == Projection::Count || self.function_name().is_some()
    }
}
