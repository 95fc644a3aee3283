//! # entity-sql
//!
//! Compiles typed entity query models into dialect-specific SQL plus a
//! parameter-binding plan.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Persistent Model (entities, associations)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │   Query Model (criteria tree, projections, sort, joins)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder + dialect hooks]
//! ┌─────────────────────────────────────────────────────────┐
//! │        QueryResult (SQL text + parameter bindings)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Executing statements and mapping rows are left to the caller.

pub mod builder;
pub mod compile;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::builder::{CriterionHandler, QueryParameterBinding, QueryResult, SqlQueryBuilder};
    pub use crate::error::{BuildError, BuildResult};
    pub use crate::model::{
        Association, DataType, EntityRegistry, Identity, NamingStrategy, PersistentEntity,
        PersistentProperty, Relation,
    };
    pub use crate::query::{
        arg, lit, outer, param, subquery, Criterion, JoinType, Junction, JunctionKind, Literal, Order,
        Projection, QueryModel, QueryValue, Sort, SortDir,
    };
    pub use crate::sql::{Dialect, PlaceholderStyle, SqlDialect};
}

// Also export at crate root for convenience
pub use builder::{QueryResult, SqlQueryBuilder};
pub use error::{BuildError, BuildResult};
pub use sql::Dialect;
