//! Query model: an abstract, type-safe description of a query.
//!
//! A [`QueryModel`] is bound to a root entity and holds a criteria
//! [`Junction`], projections, a [`Sort`], declared joins and pagination. It is
//! built incrementally by the caller and compiled once by the builder, which
//! never mutates it.
//!
//! # Example
//!
//! ```ignore
//! use entity_sql::query::{param, Criterion, QueryModel};
//!
//! let query = QueryModel::from("Person")
//!     .filter(Criterion::eq("name", param("name")))
//!     .filter(Criterion::gt("age", param("age")));
//! ```

pub mod criteria;
pub mod join;
pub mod projection;
pub mod sort;

pub use criteria::{
    arg, lit, outer, param, subquery, Criterion, Junction, JunctionKind, Literal, QueryParameter,
    QueryValue,
};
pub use join::{JoinSpec, JoinType};
pub use projection::Projection;
pub use sort::{Order, Sort, SortDir};

use serde::{Deserialize, Serialize};

/// A query specification bound to a root entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use = "builders have no effect until used"]
pub struct QueryModel {
    /// Qualified name of the root entity.
    pub entity: String,

    #[serde(default)]
    pub criteria: Junction,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projections: Vec<Projection>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinSpec>,

    #[serde(default)]
    pub sort: Sort,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl QueryModel {
    /// A query over `entity` with a conjunction root and no criteria.
    pub fn from(entity: &str) -> Self {
        Self {
            entity: entity.into(),
            criteria: Junction::default(),
            projections: Vec::new(),
            joins: Vec::new(),
            sort: Sort::default(),
            max: None,
            offset: None,
        }
    }

    /// Replace the root junction kind (AND, OR or NOT).
    pub fn junction(mut self, kind: JunctionKind) -> Self {
        self.criteria.kind = kind;
        self
    }

    pub fn filter(mut self, criterion: Criterion) -> Self {
        self.criteria.add(criterion);
        self
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.projections.push(projection);
        self
    }

    /// Declare a join on an association path.
    ///
    /// Re-declaring a path replaces its join type.
    pub fn join(mut self, path: &str, join_type: JoinType) -> Self {
        match self.joins.iter_mut().find(|j| j.path == path) {
            Some(existing) => existing.join_type = join_type,
            None => self.joins.push(JoinSpec {
                path: path.into(),
                join_type,
            }),
        }
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.sort.orders.push(order);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn max(mut self, max: u64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Join type declared for an association path, if any.
    pub fn join_type(&self, path: &str) -> Option<JoinType> {
        self.joins
            .iter()
            .find(|j| j.path == path)
            .map(|j| j.join_type)
    }
}
