//! Criteria: the clauses of a WHERE condition.
//!
//! A criterion tree is a closed sum type; the builder matches on it
//! exhaustively. Extension criteria go through [`Criterion::Custom`] and a
//! handler registered on the builder.

use serde::{Deserialize, Serialize};

use super::QueryModel;

/// A literal value supplied in the query model.
///
/// Literals are never inlined into SQL; they are bound as parameters that carry
/// the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int(n.into())
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

/// Reference to a runtime parameter (typically a repository method argument).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,

    /// Position of the argument, when the parameter is a direct argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// The right-hand side of a criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryValue {
    Parameter(QueryParameter),
    Literal(Literal),
    Subquery(Box<QueryModel>),
    /// A property of the enclosing query's entity, read inside a subquery.
    OuterProperty(String),
}

/// A named parameter with no argument index.
pub fn param(name: &str) -> QueryValue {
    QueryValue::Parameter(QueryParameter {
        name: name.to_string(),
        index: None,
    })
}

/// A named parameter bound to a method argument position.
pub fn arg(name: &str, index: usize) -> QueryValue {
    QueryValue::Parameter(QueryParameter {
        name: name.to_string(),
        index: Some(index),
    })
}

/// A literal value.
pub fn lit(value: impl Into<Literal>) -> QueryValue {
    QueryValue::Literal(value.into())
}

/// A subquery value.
pub fn subquery(query: QueryModel) -> QueryValue {
    QueryValue::Subquery(Box::new(query))
}

/// A property of the enclosing query, correlating a subquery with it.
pub fn outer(property: &str) -> QueryValue {
    QueryValue::OuterProperty(property.to_string())
}

/// One clause of a WHERE condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Criterion {
    // === Comparisons against a value ===
    Equals {
        property: String,
        value: QueryValue,
        #[serde(default)]
        ignore_case: bool,
    },
    NotEquals {
        property: String,
        value: QueryValue,
        #[serde(default)]
        ignore_case: bool,
    },
    GreaterThan {
        property: String,
        value: QueryValue,
    },
    GreaterThanEquals {
        property: String,
        value: QueryValue,
    },
    LessThan {
        property: String,
        value: QueryValue,
    },
    LessThanEquals {
        property: String,
        value: QueryValue,
    },
    Between {
        property: String,
        from: QueryValue,
        to: QueryValue,
    },

    // === Pattern matching ===
    Like {
        property: String,
        value: QueryValue,
    },
    #[serde(rename = "ilike")]
    ILike {
        property: String,
        value: QueryValue,
    },
    StartsWith {
        property: String,
        value: QueryValue,
    },
    Contains {
        property: String,
        value: QueryValue,
    },
    EndsWith {
        property: String,
        value: QueryValue,
    },

    // === Membership ===
    In {
        property: String,
        value: QueryValue,
    },
    NotIn {
        property: String,
        value: QueryValue,
    },

    // === Unary checks ===
    IsNull {
        property: String,
    },
    IsNotNull {
        property: String,
    },
    IsEmpty {
        property: String,
    },
    IsNotEmpty {
        property: String,
    },
    IsTrue {
        property: String,
    },
    IsFalse {
        property: String,
    },
    IdEquals {
        value: QueryValue,
    },

    // === Property-to-property comparisons ===
    EqualsProperty {
        property: String,
        other: String,
    },
    NotEqualsProperty {
        property: String,
        other: String,
    },
    GreaterThanProperty {
        property: String,
        other: String,
    },
    GreaterThanEqualsProperty {
        property: String,
        other: String,
    },
    LessThanProperty {
        property: String,
        other: String,
    },
    LessThanEqualsProperty {
        property: String,
        other: String,
    },

    /// Criteria scoped to a joined association.
    Association {
        association: String,
        #[serde(default)]
        criteria: Vec<Criterion>,
    },

    // === Logical composites ===
    Conjunction {
        criteria: Vec<Criterion>,
    },
    Disjunction {
        criteria: Vec<Criterion>,
    },
    Negation {
        criteria: Vec<Criterion>,
    },

    /// Criterion rendered by a handler registered on the builder under `name`.
    Custom {
        name: String,
        property: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<QueryValue>,
    },
}

impl Criterion {
    /// Name of the criterion kind, as used in error messages.
    pub fn kind(&self) -> &str {
        match self {
            Criterion::Equals { .. } => "Equals",
            Criterion::NotEquals { .. } => "NotEquals",
            Criterion::GreaterThan { .. } => "GreaterThan",
            Criterion::GreaterThanEquals { .. } => "GreaterThanEquals",
            Criterion::LessThan { .. } => "LessThan",
            Criterion::LessThanEquals { .. } => "LessThanEquals",
            Criterion::Between { .. } => "Between",
            Criterion::Like { .. } => "Like",
            Criterion::ILike { .. } => "ILike",
            Criterion::StartsWith { .. } => "StartsWith",
            Criterion::Contains { .. } => "Contains",
            Criterion::EndsWith { .. } => "EndsWith",
            Criterion::In { .. } => "In",
            Criterion::NotIn { .. } => "NotIn",
            Criterion::IsNull { .. } => "IsNull",
            Criterion::IsNotNull { .. } => "IsNotNull",
            Criterion::IsEmpty { .. } => "IsEmpty",
            Criterion::IsNotEmpty { .. } => "IsNotEmpty",
            Criterion::IsTrue { .. } => "IsTrue",
            Criterion::IsFalse { .. } => "IsFalse",
            Criterion::IdEquals { .. } => "IdEquals",
            Criterion::EqualsProperty { .. } => "EqualsProperty",
            Criterion::NotEqualsProperty { .. } => "NotEqualsProperty",
            Criterion::GreaterThanProperty { .. } => "GreaterThanProperty",
            Criterion::GreaterThanEqualsProperty { .. } => "GreaterThanEqualsProperty",
            Criterion::LessThanProperty { .. } => "LessThanProperty",
            Criterion::LessThanEqualsProperty { .. } => "LessThanEqualsProperty",
            Criterion::Association { .. } => "AssociationQuery",
            Criterion::Conjunction { .. } => "Conjunction",
            Criterion::Disjunction { .. } => "Disjunction",
            Criterion::Negation { .. } => "Negation",
            Criterion::Custom { name, .. } => name,
        }
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn eq(property: &str, value: QueryValue) -> Self {
        Criterion::Equals {
            property: property.into(),
            value,
            ignore_case: false,
        }
    }

    pub fn eq_ignore_case(property: &str, value: QueryValue) -> Self {
        Criterion::Equals {
            property: property.into(),
            value,
            ignore_case: true,
        }
    }

    pub fn ne(property: &str, value: QueryValue) -> Self {
        Criterion::NotEquals {
            property: property.into(),
            value,
            ignore_case: false,
        }
    }

    pub fn ne_ignore_case(property: &str, value: QueryValue) -> Self {
        Criterion::NotEquals {
            property: property.into(),
            value,
            ignore_case: true,
        }
    }

    pub fn gt(property: &str, value: QueryValue) -> Self {
        Criterion::GreaterThan {
            property: property.into(),
            value,
        }
    }

    pub fn gte(property: &str, value: QueryValue) -> Self {
        Criterion::GreaterThanEquals {
            property: property.into(),
            value,
        }
    }

    pub fn lt(property: &str, value: QueryValue) -> Self {
        Criterion::LessThan {
            property: property.into(),
            value,
        }
    }

    pub fn lte(property: &str, value: QueryValue) -> Self {
        Criterion::LessThanEquals {
            property: property.into(),
            value,
        }
    }

    pub fn between(property: &str, from: QueryValue, to: QueryValue) -> Self {
        Criterion::Between {
            property: property.into(),
            from,
            to,
        }
    }

    pub fn like(property: &str, value: QueryValue) -> Self {
        Criterion::Like {
            property: property.into(),
            value,
        }
    }

    pub fn ilike(property: &str, value: QueryValue) -> Self {
        Criterion::ILike {
            property: property.into(),
            value,
        }
    }

    pub fn starts_with(property: &str, value: QueryValue) -> Self {
        Criterion::StartsWith {
            property: property.into(),
            value,
        }
    }

    pub fn contains(property: &str, value: QueryValue) -> Self {
        Criterion::Contains {
            property: property.into(),
            value,
        }
    }

    pub fn ends_with(property: &str, value: QueryValue) -> Self {
        Criterion::EndsWith {
            property: property.into(),
            value,
        }
    }

    pub fn is_in(property: &str, value: QueryValue) -> Self {
        Criterion::In {
            property: property.into(),
            value,
        }
    }

    pub fn not_in(property: &str, value: QueryValue) -> Self {
        Criterion::NotIn {
            property: property.into(),
            value,
        }
    }

    pub fn is_null(property: &str) -> Self {
        Criterion::IsNull {
            property: property.into(),
        }
    }

    pub fn is_not_null(property: &str) -> Self {
        Criterion::IsNotNull {
            property: property.into(),
        }
    }

    pub fn is_empty(property: &str) -> Self {
        Criterion::IsEmpty {
            property: property.into(),
        }
    }

    pub fn is_not_empty(property: &str) -> Self {
        Criterion::IsNotEmpty {
            property: property.into(),
        }
    }

    pub fn is_true(property: &str) -> Self {
        Criterion::IsTrue {
            property: property.into(),
        }
    }

    pub fn is_false(property: &str) -> Self {
        Criterion::IsFalse {
            property: property.into(),
        }
    }

    pub fn id_eq(value: QueryValue) -> Self {
        Criterion::IdEquals { value }
    }

    pub fn eq_property(property: &str, other: &str) -> Self {
        Criterion::EqualsProperty {
            property: property.into(),
            other: other.into(),
        }
    }

    pub fn ne_property(property: &str, other: &str) -> Self {
        Criterion::NotEqualsProperty {
            property: property.into(),
            other: other.into(),
        }
    }

    pub fn gt_property(property: &str, other: &str) -> Self {
        Criterion::GreaterThanProperty {
            property: property.into(),
            other: other.into(),
        }
    }

    pub fn gte_property(property: &str, other: &str) -> Self {
        Criterion::GreaterThanEqualsProperty {
            property: property.into(),
            other: other.into(),
        }
    }

    pub fn lt_property(property: &str, other: &str) -> Self {
        Criterion::LessThanProperty {
            property: property.into(),
            other: other.into(),
        }
    }

    pub fn lte_property(property: &str, other: &str) -> Self {
        Criterion::LessThanEqualsProperty {
            property: property.into(),
            other: other.into(),
        }
    }

    pub fn association(association: &str, criteria: Vec<Criterion>) -> Self {
        Criterion::Association {
            association: association.into(),
            criteria,
        }
    }

    pub fn and(criteria: Vec<Criterion>) -> Self {
        Criterion::Conjunction { criteria }
    }

    pub fn or(criteria: Vec<Criterion>) -> Self {
        Criterion::Disjunction { criteria }
    }

    pub fn not(criteria: Vec<Criterion>) -> Self {
        Criterion::Negation { criteria }
    }

    pub fn custom(name: &str, property: &str, value: Option<QueryValue>) -> Self {
        Criterion::Custom {
            name: name.into(),
            property: property.into(),
            value,
        }
    }
}

/// Logical operator joining the criteria of a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionKind {
    #[default]
    And,
    Or,
    Not,
}

/// The root logical grouping of a query's criteria.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Junction {
    #[serde(default)]
    pub kind: JunctionKind,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

impl Junction {
    pub fn new(kind: JunctionKind) -> Self {
        Self {
            kind,
            criteria: Vec::new(),
        }
    }

    pub fn add(&mut self, criterion: Criterion) -> &mut Self {
        self.criteria.push(criterion);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}
