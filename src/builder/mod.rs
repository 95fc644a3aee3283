//! Query model to SQL compilation.
//!
//! [`SqlQueryBuilder`] walks a [`QueryModel`] against the entities of an
//! [`EntityRegistry`] and produces a [`QueryResult`]: the statement text plus
//! one binding per placeholder, in placeholder order.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use entity_sql::builder::SqlQueryBuilder;
//! use entity_sql::query::{param, Criterion, QueryModel};
//! use entity_sql::sql::Dialect;
//!
//! let builder = SqlQueryBuilder::new(Arc::new(registry), Dialect::Ansi);
//! let result = builder.build_query(
//!     &QueryModel::from("Person").filter(Criterion::eq("name", param("name"))),
//! )?;
//! assert_eq!(result.query, "SELECT person.* FROM person AS person WHERE (person.name = :p1)");
//! ```
//!
//! A builder holds no per-build state and can be shared across threads; every
//! `build_*` call starts from a fresh placeholder counter.

mod criteria;
mod joins;
mod mutation;
mod order;
mod path;
mod result;
mod select;
mod state;
mod subquery;

pub use result::{QueryParameterBinding, QueryResult};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::BuilderSettings;
use crate::error::BuildResult;
use crate::model::{EntityRegistry, PersistentEntity};
use crate::query::{QueryModel, Sort};
use crate::sql::{Dialect, PlaceholderStyle, SqlDialect};

/// Renders a [`Criterion::Custom`](crate::query::Criterion::Custom) criterion.
///
/// `column` is the rendered column reference and `placeholder` the rendered
/// placeholder of the bound value, when the criterion has one. The returned
/// fragment is inserted verbatim.
pub trait CriterionHandler: Send + Sync + fmt::Debug {
    fn render(&self, column: &str, placeholder: Option<&str>) -> String;
}

/// Compiles query models into SQL for one dialect.
pub struct SqlQueryBuilder {
    pub(crate) registry: Arc<EntityRegistry>,
    pub(crate) dialect: Dialect,
    pub(crate) placeholder: PlaceholderStyle,
    pub(crate) escape_identifiers: bool,
    pub(crate) handlers: HashMap<String, Box<dyn CriterionHandler>>,
}

impl fmt::Debug for SqlQueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("SqlQueryBuilder")
            .field("dialect", &self.dialect)
            .field("placeholder", &self.placeholder)
            .field("escape_identifiers", &self.escape_identifiers)
            .field("entities", &self.registry.len())
            .field("handlers", &handlers)
            .finish()
    }
}

impl SqlQueryBuilder {
    /// A builder using the dialect's native placeholder style.
    pub fn new(registry: Arc<EntityRegistry>, dialect: Dialect) -> Self {
        Self {
            registry,
            dialect,
            placeholder: dialect.placeholder_style(),
            escape_identifiers: false,
            handlers: HashMap::new(),
        }
    }

    pub fn with_settings(registry: Arc<EntityRegistry>, settings: &BuilderSettings) -> Self {
        Self::new(registry, settings.dialect)
            .placeholders(settings.placeholder_style())
            .escape_identifiers(settings.escape_identifiers)
    }

    /// Override the placeholder style.
    pub fn placeholders(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder = style;
        self
    }

    /// Quote every table, column and alias with the dialect's quote character.
    pub fn escape_identifiers(mut self, escape: bool) -> Self {
        self.escape_identifiers = escape;
        self
    }

    /// Register the handler for custom criteria named `name`.
    pub fn register_handler(
        mut self,
        name: impl Into<String>,
        handler: impl CriterionHandler + 'static,
    ) -> Self {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.placeholder
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Compile a SELECT.
    pub fn build_query(&self, model: &QueryModel) -> BuildResult<QueryResult> {
        self.traced("SELECT", &model.entity, select::build(self, model))
    }

    /// Compile an UPDATE setting `properties` of the model's entity, restricted
    /// by the model's criteria.
    pub fn build_update(&self, model: &QueryModel, properties: &[&str]) -> BuildResult<QueryResult> {
        self.traced(
            "UPDATE",
            &model.entity,
            mutation::build_update(self, model, properties),
        )
    }

    /// Compile a DELETE restricted by the model's criteria.
    pub fn build_delete(&self, model: &QueryModel) -> BuildResult<QueryResult> {
        self.traced("DELETE", &model.entity, mutation::build_delete(self, model))
    }

    /// Compile an INSERT of every insertable column of `entity`.
    pub fn build_insert(&self, entity: &str) -> BuildResult<QueryResult> {
        self.traced("INSERT", entity, mutation::build_insert(self, entity))
    }

    /// Compile a standalone ` ORDER BY ...` clause.
    pub fn build_order_by(&self, entity: &PersistentEntity, sort: &Sort) -> BuildResult<QueryResult> {
        self.traced("ORDER BY", &entity.name, order::build(self, entity, sort))
    }

    fn traced(
        &self,
        statement: &'static str,
        entity: &str,
        result: BuildResult<QueryResult>,
    ) -> BuildResult<QueryResult> {
        match &result {
            Ok(compiled) => debug!(
                dialect = %self.dialect,
                statement,
                entity,
                sql = %compiled.query,
                bindings = compiled.bindings.len(),
                "compiled statement"
            ),
            Err(err) => debug!(
                dialect = %self.dialect,
                statement,
                entity,
                error = %err,
                "compilation failed"
            ),
        }
        result
    }
}
