//! Join materialization.
//!
//! Every association path is joined at most once per SELECT level; later
//! references reuse the recorded alias. Each level of a nested path gets its
//! own JOIN, so `profile.detail` joins `profile` and then `detail`.

use std::sync::Arc;

use tracing::trace;

use crate::error::{BuildError, BuildResult};
use crate::model::{Association, PersistentEntity, PersistentProperty, Relation};
use crate::query::JoinType;
use crate::sql::{SqlDialect, Token, TokenStream};

use super::path;
use super::state::{Context, JoinMode, QueryState, Statement};

/// Join (or embed) `property` of the context's entity and return the context
/// of the associated entity.
pub(crate) fn join_association(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &PersistentProperty,
    association: &Association,
) -> BuildResult<Context> {
    let target = state.registry().require(&association.entity)?;

    if association.kind == Relation::Embedded {
        let column = state.dialect().column_name(&ctx.entity, property);
        return Ok(ctx.embedded(&property.name, column, target));
    }

    let path = ctx.join_key(&property.name);
    if let Some(alias) = stmt.joined_alias(&path) {
        return Ok(ctx.joined(&property.name, alias.to_string(), target));
    }

    let alias = stmt.join_alias(&path);
    match state.mode {
        JoinMode::Forbid(statement) => {
            return Err(BuildError::IllegalJoin {
                association: path,
                statement,
            });
        }
        JoinMode::Reference => {}
        JoinMode::Emit => {
            let join_type = stmt.join_type(&path);
            let keyword = join_keyword(state, join_type)?;
            emit_join(state, stmt, &keyword, ctx, property, association, &target, &alias)?;
            if join_type.is_fetch() {
                stmt.fetched.push((target.clone(), alias.clone()));
            }
            trace!(path = %path, alias = %alias, join_type = %join_type, "join materialized");
        }
    }

    stmt.record(path, alias.clone());
    Ok(ctx.joined(&property.name, alias, target))
}

/// Join every association along a dotted path.
pub(crate) fn join_path(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    path: &str,
) -> BuildResult<Context> {
    let mut current = ctx.clone();
    for segment in path.split('.') {
        let property = current
            .entity
            .property_named(segment)
            .cloned()
            .ok_or_else(|| BuildError::unknown_property(&ctx.entity.name, path))?;
        let Some(association) = property.association.clone() else {
            return Err(BuildError::InvalidCriterion(format!(
                "'{}' of '{}' is not an association",
                path, ctx.entity.name
            )));
        };
        current = join_association(state, stmt, &current, &property, &association)?;
    }
    Ok(current)
}

/// Materialize the joins declared on the statement's query model.
pub(crate) fn declare(state: &mut QueryState, stmt: &mut Statement, ctx: &Context) -> BuildResult<()> {
    let declared = stmt.declared;
    for spec in declared {
        join_path(state, stmt, ctx, &spec.path)?;
    }
    Ok(())
}

fn join_keyword(state: &QueryState, join_type: JoinType) -> BuildResult<TokenStream> {
    let mut ts = TokenStream::new();
    match join_type {
        JoinType::Default => {}
        JoinType::Inner | JoinType::Fetch => {
            ts.push(Token::Inner).space();
        }
        JoinType::Left | JoinType::LeftFetch => {
            ts.push(Token::Left).space();
        }
        JoinType::Right | JoinType::RightFetch => {
            ts.push(Token::Right).space();
        }
        JoinType::Outer => {
            let dialect = state.dialect();
            if !dialect.supports_full_outer_join() {
                return Err(BuildError::UnsupportedJoin {
                    join_type: join_type.to_string(),
                    dialect: dialect.name(),
                });
            }
            ts.push(Token::Full).space().push(Token::Outer).space();
        }
    }
    ts.push(Token::Join);
    Ok(ts)
}

/// Append ` <keyword> <table> <alias> ON l1 = r1 AND ...` to the statement.
fn push_join(
    state: &QueryState,
    stmt: &mut Statement,
    keyword: &TokenStream,
    table: &str,
    alias: &str,
    on: &[(TokenStream, TokenStream)],
) {
    stmt.joins
        .space()
        .append(keyword)
        .space()
        .push(state.ident(table))
        .space()
        .push(state.ident(alias))
        .space()
        .push(Token::On)
        .space();
    for (i, (left, right)) in on.iter().enumerate() {
        if i > 0 {
            stmt.joins.space().push(Token::And).space();
        }
        stmt.joins
            .append(left)
            .space()
            .push(Token::Eq)
            .space()
            .append(right);
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_join(
    state: &QueryState,
    stmt: &mut Statement,
    keyword: &TokenStream,
    ctx: &Context,
    property: &PersistentProperty,
    association: &Association,
    target: &Arc<PersistentEntity>,
    alias: &str,
) -> BuildResult<()> {
    let dialect = state.dialect();
    let target_table = dialect.table_name(target);

    if association.uses_join_table() {
        let link = JoinTable::resolve(state, &ctx.entity, property, association, target)?;
        let link_alias = format!("{}jt", alias);

        let on_link: Vec<_> = link
            .owner_columns
            .iter()
            .map(|(column, id)| {
                (
                    state.qualified(&link_alias, column),
                    state.qualified(&ctx.alias, &dialect.column_name(&ctx.entity, id)),
                )
            })
            .collect();
        push_join(state, stmt, keyword, &link.table, &link_alias, &on_link);

        let on_target: Vec<_> = link
            .target_columns
            .iter()
            .map(|(column, id)| {
                (
                    state.qualified(alias, &dialect.column_name(target, id)),
                    state.qualified(&link_alias, column),
                )
            })
            .collect();
        push_join(state, stmt, keyword, &target_table, alias, &on_target);
        return Ok(());
    }

    let on: Vec<_> = if association.is_foreign_key_owner() {
        path::foreign_key_columns(state, ctx, property, target)?
            .iter()
            .map(|fk| {
                (
                    state.column_tokens(fk),
                    state.qualified(alias, &dialect.column_name(target, &fk.property)),
                )
            })
            .collect()
    } else {
        inverse_foreign_key(state, &ctx.entity, association, target)?
            .into_iter()
            .map(|(column, id)| {
                (
                    state.qualified(alias, &column),
                    state.qualified(&ctx.alias, &dialect.column_name(&ctx.entity, &id)),
                )
            })
            .collect()
    };
    push_join(state, stmt, keyword, &target_table, alias, &on);
    Ok(())
}

/// Foreign key columns on `target` pointing back at `owner`, through the
/// `mapped_by` property, paired with the owner identity they reference.
pub(crate) fn inverse_foreign_key(
    state: &QueryState,
    owner: &PersistentEntity,
    association: &Association,
    target: &PersistentEntity,
) -> BuildResult<Vec<(String, PersistentProperty)>> {
    let mapped_by = association.mapped_by.as_deref().ok_or_else(|| {
        BuildError::InvalidModel(format!(
            "inverse association to '{}' has no mapped_by",
            target.name
        ))
    })?;
    let inverse = target
        .property_named(mapped_by)
        .ok_or_else(|| BuildError::unknown_property(&target.name, mapped_by))?;
    path::foreign_key_names(state, target, inverse, owner)
}

/// A link table of a many-to-many (or unidirectional one-to-many) association.
pub(crate) struct JoinTable {
    pub table: String,
    /// Link columns referencing the owner, with the owner identity they match.
    pub owner_columns: Vec<(String, PersistentProperty)>,
    /// Link columns referencing the target, with the target identity they match.
    pub target_columns: Vec<(String, PersistentProperty)>,
}

impl JoinTable {
    /// Link columns are named `<table>_<id>` after the entity they reference.
    /// When both sides map to the same table, the target side is named after
    /// the owning property instead: `person_friends` links `person_id` to
    /// `friends_id`.
    pub(crate) fn resolve(
        state: &QueryState,
        owner: &PersistentEntity,
        property: &PersistentProperty,
        association: &Association,
        target: &PersistentEntity,
    ) -> BuildResult<Self> {
        let dialect = state.dialect();
        let owner_table = dialect.table_name(owner);
        let target_table = dialect.table_name(target);
        let self_referential = owner_table == target_table;

        // The owning side names the table; the inverse side borrows it.
        match &association.mapped_by {
            Some(mapped_by) => {
                let owning = target
                    .property_named(mapped_by)
                    .ok_or_else(|| BuildError::unknown_property(&target.name, mapped_by))?;
                let owning_column = dialect.column_name(target, owning);
                let table = owning
                    .association
                    .as_ref()
                    .and_then(|a| a.join_table.clone())
                    .unwrap_or_else(|| format!("{}_{}", target_table, owning_column));
                let owner_prefix = if self_referential {
                    owning_column
                } else {
                    owner_table
                };
                Ok(Self {
                    table,
                    owner_columns: link_columns(state, owner, &owner_prefix)?,
                    target_columns: link_columns(state, target, &target_table)?,
                })
            }
            None => {
                let property_column = dialect.column_name(owner, property);
                let table = association
                    .join_table
                    .clone()
                    .unwrap_or_else(|| format!("{}_{}", owner_table, property_column));
                let target_prefix = if self_referential {
                    property_column
                } else {
                    target_table
                };
                Ok(Self {
                    table,
                    owner_columns: link_columns(state, owner, &owner_table)?,
                    target_columns: link_columns(state, target, &target_prefix)?,
                })
            }
        }
    }
}

fn link_columns(
    state: &QueryState,
    entity: &PersistentEntity,
    prefix: &str,
) -> BuildResult<Vec<(String, PersistentProperty)>> {
    let ids = entity.identity.properties();
    if ids.is_empty() {
        return Err(BuildError::MissingIdentity(entity.name.clone()));
    }
    Ok(ids
        .iter()
        .map(|id| {
            (
                format!("{}_{}", prefix, state.dialect().column_name(entity, id)),
                id.clone(),
            )
        })
        .collect())
}
