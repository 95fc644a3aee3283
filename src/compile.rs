//! File-driven compilation of named queries.
//!
//! A [`Catalog`] holds entity definitions and named query definitions, read
//! from TOML or JSON:
//!
//! ```toml
//! [[entities]]
//! name = "Person"
//! identity = { single = { name = "id", type = "long" } }
//! properties = [
//!     { name = "name", type = "string" },
//!     { name = "age", type = "integer" },
//! ]
//!
//! [queries.adults.query]
//! entity = "Person"
//!
//! [[queries.adults.query.criteria.criteria]]
//! op = "greater_than_equals"
//! property = "age"
//! value = { parameter = { name = "age" } }
//!
//! [queries.rename]
//! statement = "update"
//! set = ["name"]
//!
//! [queries.rename.query]
//! entity = "Person"
//!
//! [[queries.rename.query.criteria.criteria]]
//! op = "id_equals"
//! value = { parameter = { name = "id" } }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use entity_sql::compile::{compile_query, Catalog};
//! use entity_sql::config::BuilderSettings;
//!
//! let catalog = Catalog::from_file("catalog.toml")?;
//! let output = compile_query(&catalog, "adults", &BuilderSettings::default())?;
//! println!("{}", output.result.query);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::{QueryResult, SqlQueryBuilder};
use crate::config::BuilderSettings;
use crate::error::BuildError;
use crate::model::{EntityRegistry, PersistentEntity};
use crate::query::QueryModel;
use crate::sql::Dialect;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while loading or compiling a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported catalog format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(#[from] BuildError),

    #[error("Query '{name}' failed to compile: {source}")]
    Build {
        name: String,
        #[source]
        source: BuildError,
    },

    #[error("Query not found: {0}")]
    QueryNotFound(String),

    #[error("No queries defined in catalog")]
    NoQueries,
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Catalog
// ============================================================================

/// Kind of statement a query definition compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    #[default]
    Select,
    Update,
    Delete,
    Insert,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StatementKind::Select => "select",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Insert => "insert",
        };
        f.write_str(name)
    }
}

/// A named query in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDefinition {
    #[serde(default)]
    pub statement: StatementKind,

    pub query: QueryModel,

    /// Properties assigned by an UPDATE.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<String>,
}

/// Entities plus named queries over them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub entities: Vec<PersistentEntity>,

    #[serde(default)]
    pub queries: BTreeMap<String, QueryDefinition>,
}

impl Catalog {
    /// Load a catalog, choosing the format from the file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CompileResult<Self> {
        let path = path.as_ref();
        let format = path.extension().and_then(|e| e.to_str());
        if !matches!(format, Some("toml" | "json")) {
            return Err(CompileError::UnsupportedFormat(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match format {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> CompileResult<Self> {
        toml::from_str(content).map_err(|e| CompileError::ParseError(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> CompileResult<Self> {
        serde_json::from_str(content).map_err(|e| CompileError::ParseError(e.to_string()))
    }

    /// Names of the defined queries, sorted.
    pub fn query_names(&self) -> Vec<&str> {
        self.queries.keys().map(String::as_str).collect()
    }

    /// Build and validate the entity registry.
    pub fn registry(&self) -> CompileResult<EntityRegistry> {
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(BuildError::InvalidModel(format!(
                    "entity '{}' is defined more than once",
                    entity.name
                ))
                .into());
            }
        }

        let registry = EntityRegistry::with_entities(self.entities.iter().cloned());
        registry.validate()?;
        Ok(registry)
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// A compiled query definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileOutput {
    pub name: String,
    pub statement: StatementKind,
    pub dialect: Dialect,
    #[serde(flatten)]
    pub result: QueryResult,
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile one named query of the catalog.
pub fn compile_query(
    catalog: &Catalog,
    name: &str,
    settings: &BuilderSettings,
) -> CompileResult<CompileOutput> {
    let definition = catalog
        .queries
        .get(name)
        .ok_or_else(|| CompileError::QueryNotFound(name.to_string()))?;
    let builder = SqlQueryBuilder::with_settings(Arc::new(catalog.registry()?), settings);
    compile_definition(&builder, name, definition)
}

/// Compile every query of the catalog, in name order.
pub fn compile_all(catalog: &Catalog, settings: &BuilderSettings) -> CompileResult<Vec<CompileOutput>> {
    if catalog.queries.is_empty() {
        return Err(CompileError::NoQueries);
    }
    let builder = SqlQueryBuilder::with_settings(Arc::new(catalog.registry()?), settings);
    catalog
        .queries
        .iter()
        .map(|(name, definition)| compile_definition(&builder, name, definition))
        .collect()
}

fn compile_definition(
    builder: &SqlQueryBuilder,
    name: &str,
    definition: &QueryDefinition,
) -> CompileResult<CompileOutput> {
    let query = &definition.query;
    let result = match definition.statement {
        StatementKind::Select => builder.build_query(query),
        StatementKind::Update => {
            let set: Vec<&str> = definition.set.iter().map(String::as_str).collect();
            builder.build_update(query, &set)
        }
        StatementKind::Delete => builder.build_delete(query),
        StatementKind::Insert => builder.build_insert(&query.entity),
    }
    .map_err(|source| CompileError::Build {
        name: name.to_string(),
        source,
    })?;

    Ok(CompileOutput {
        name: name.to_string(),
        statement: definition.statement,
        dialect: builder.dialect(),
        result,
    })
}
