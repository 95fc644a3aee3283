//! Property path resolution.
//!
//! A dotted path such as `department.name` is resolved against the context's
//! entity. Embedded values stay in the same table under a column prefix,
//! `assoc.id` on an owning to-one reads the foreign key column, and any other
//! association is joined (subject to the state's [`JoinMode`]).
//!
//! [`JoinMode`]: super::state::JoinMode

use crate::error::{BuildError, BuildResult};
use crate::model::{Association, PersistentEntity, PersistentProperty, Relation};
use crate::sql::SqlDialect;

use super::joins;
use super::state::{Context, QueryState, Statement};

/// A resolved column and the property it maps.
#[derive(Debug, Clone)]
pub(crate) struct ColumnRef {
    pub alias: String,
    pub qualify: bool,
    pub column: String,
    /// The mapped property; for a foreign key column, the referenced identity.
    pub property: PersistentProperty,
    /// Binding path: association names followed by the property name.
    pub path: Vec<String>,
}

fn lookup(root: &Context, ctx: &Context, segment: &str, path: &str) -> BuildResult<PersistentProperty> {
    ctx.entity
        .property_named(segment)
        .cloned()
        .ok_or_else(|| BuildError::unknown_property(&root.entity.name, path))
}

/// Resolve every segment but the last to a context, returning that context and
/// the property named by the last segment.
pub(crate) fn resolve_property(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    path: &str,
) -> BuildResult<(Context, PersistentProperty)> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = ctx.clone();
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            let property = lookup(ctx, &current, segment, path)?;
            let Some(association) = property.association.clone() else {
                return Err(BuildError::unknown_property(&ctx.entity.name, path));
            };
            current = joins::join_association(state, stmt, &current, &property, &association)?;
        }
    }

    let property = lookup(ctx, &current, leaf, path)?;
    Ok((current, property))
}

/// Resolve a property path to the column(s) it maps to.
pub(crate) fn resolve(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    path: &str,
) -> BuildResult<Vec<ColumnRef>> {
    let (owner, property) = match path.rsplit_once('.') {
        None => (ctx.clone(), lookup(ctx, ctx, path, path)?),
        Some((parents, leaf)) => {
            let (parent_owner, parent) = resolve_property(state, stmt, ctx, parents)?;
            let Some(association) = parent.association.clone() else {
                return Err(BuildError::unknown_property(&ctx.entity.name, path));
            };

            // `assoc.id` reads the foreign key without joining.
            if association.is_foreign_key_owner() {
                let target = state.registry().require(&association.entity)?;
                if target.is_identity(leaf) {
                    let columns = foreign_key_columns(state, &parent_owner, &parent, &target)?;
                    return Ok(columns
                        .into_iter()
                        .filter(|c| c.property.name == leaf)
                        .collect());
                }
            }

            let owner =
                joins::join_association(state, stmt, &parent_owner, &parent, &association)?;
            let property = lookup(ctx, &owner, leaf, path)?;
            (owner, property)
        }
    };

    match property.association.clone() {
        None => Ok(vec![column_ref(state, &owner, &property)]),
        Some(association) => association_columns(state, &owner, &property, &association, path),
    }
}

/// Resolve a path that must map to exactly one column.
pub(crate) fn resolve_single(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    path: &str,
) -> BuildResult<ColumnRef> {
    let mut columns = resolve(state, stmt, ctx, path)?;
    if columns.len() != 1 {
        return Err(BuildError::InvalidCriterion(format!(
            "property '{}' maps to {} columns where one is required",
            path,
            columns.len()
        )));
    }
    Ok(columns.remove(0))
}

pub(crate) fn column_ref(state: &QueryState, ctx: &Context, property: &PersistentProperty) -> ColumnRef {
    ColumnRef {
        alias: ctx.alias.clone(),
        qualify: ctx.qualify,
        column: ctx.prefixed(state.dialect().column_name(&ctx.entity, property)),
        property: property.clone(),
        path: ctx.path_to(&property.name),
    }
}

/// Columns compared when an association is the last segment of a path.
fn association_columns(
    state: &QueryState,
    ctx: &Context,
    property: &PersistentProperty,
    association: &Association,
    path: &str,
) -> BuildResult<Vec<ColumnRef>> {
    if association.kind == Relation::Embedded {
        let entity = state.registry().require(&association.entity)?;
        let column = state.dialect().column_name(&ctx.entity, property);
        return persisted_columns(state, &ctx.embedded(&property.name, column, entity), true);
    }
    if association.is_foreign_key_owner() {
        let target = state.registry().require(&association.entity)?;
        return foreign_key_columns(state, ctx, property, &target);
    }
    Err(BuildError::InvalidCriterion(format!(
        "association '{}' of '{}' has no column of its own",
        path, ctx.entity.name
    )))
}

/// Names of the foreign key columns `fk_property` stores on `owner`, one per
/// identity property of `referenced`, unprefixed.
pub(crate) fn foreign_key_names(
    state: &QueryState,
    owner: &PersistentEntity,
    fk_property: &PersistentProperty,
    referenced: &PersistentEntity,
) -> BuildResult<Vec<(String, PersistentProperty)>> {
    let ids = referenced.identity.properties();
    if ids.is_empty() {
        return Err(BuildError::MissingIdentity(referenced.name.clone()));
    }
    let dialect = state.dialect();
    let base = dialect.column_name(owner, fk_property);
    if ids.len() == 1 && fk_property.column.is_some() {
        return Ok(vec![(base, ids[0].clone())]);
    }
    Ok(ids
        .iter()
        .map(|id| {
            (
                format!("{}_{}", base, dialect.column_name(referenced, id)),
                id.clone(),
            )
        })
        .collect())
}

/// Foreign key columns of an owning to-one association in `ctx`.
pub(crate) fn foreign_key_columns(
    state: &QueryState,
    ctx: &Context,
    property: &PersistentProperty,
    target: &PersistentEntity,
) -> BuildResult<Vec<ColumnRef>> {
    Ok(foreign_key_names(state, &ctx.entity, property, target)?
        .into_iter()
        .map(|(column, id)| {
            let mut path = ctx.path_to(&property.name);
            path.push(id.name.clone());
            ColumnRef {
                alias: ctx.alias.clone(),
                qualify: ctx.qualify,
                column: ctx.prefixed(column),
                property: id,
                path,
            }
        })
        .collect())
}

/// Every column stored in the context's table for its entity: scalar
/// properties, embedded values and owning foreign keys.
pub(crate) fn persisted_columns(
    state: &QueryState,
    ctx: &Context,
    include_generated: bool,
) -> BuildResult<Vec<ColumnRef>> {
    let mut columns = Vec::new();
    for property in ctx.entity.all_properties() {
        match &property.association {
            None => {
                if include_generated || !property.generated {
                    columns.push(column_ref(state, ctx, property));
                }
            }
            Some(association) if association.kind == Relation::Embedded => {
                let entity = state.registry().require(&association.entity)?;
                let column = state.dialect().column_name(&ctx.entity, property);
                let nested = ctx.embedded(&property.name, column, entity);
                columns.extend(persisted_columns(state, &nested, include_generated)?);
            }
            Some(association) if association.is_foreign_key_owner() => {
                let target = state.registry().require(&association.entity)?;
                columns.extend(foreign_key_columns(state, ctx, property, &target)?);
            }
            Some(_) => {}
        }
    }
    Ok(columns)
}
