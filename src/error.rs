//! Errors raised while compiling queries.
//!
//! Every failure is synchronous and final: a build either returns a complete
//! `QueryResult` or one of these errors, never a partial statement.

/// Result type for query compilation.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors that can occur while compiling a query model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Unknown entity: '{0}'")]
    UnknownEntity(String),

    #[error("Cannot use property '{property}' on entity '{entity}': property does not exist")]
    UnknownProperty { entity: String, property: String },

    #[error("Unsupported criterion: {0}")]
    UnsupportedCriterion(String),

    #[error("Association '{association}' requires a join, but joins cannot be used in a DELETE or UPDATE operation ({statement})")]
    IllegalJoin {
        association: String,
        statement: &'static str,
    },

    #[error("No properties specified to update")]
    EmptyUpdate,

    #[error("No orders specified in sort")]
    EmptySort,

    #[error("Entity '{0}' does not declare an identity")]
    MissingIdentity(String),

    #[error("Invalid criterion: {0}")]
    InvalidCriterion(String),

    #[error("Join type {join_type} is not supported by dialect {dialect}")]
    UnsupportedJoin {
        join_type: String,
        dialect: &'static str,
    },

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

impl BuildError {
    pub(crate) fn unknown_property(entity: &str, property: &str) -> Self {
        BuildError::UnknownProperty {
            entity: entity.to_string(),
            property: property.to_string(),
        }
    }
}
