//! UPDATE, DELETE and INSERT compilation.
//!
//! UPDATE and DELETE run in [`JoinMode::Forbid`]: any property path or
//! association criterion that needs a join fails the build. Dialects without
//! table aliases in mutations get unqualified column references.

use std::sync::Arc;

use crate::error::{BuildError, BuildResult};
use crate::model::PersistentEntity;
use crate::query::QueryModel;
use crate::sql::{SqlDialect, Token, TokenStream};

use super::criteria;
use super::joins;
use super::path::{self, ColumnRef};
use super::result::{QueryParameterBinding, QueryResult};
use super::state::{Context, JoinMode, QueryState, Statement};
use super::SqlQueryBuilder;

/// Root context of a mutation: aliased where the dialect allows it.
fn mutation_context(state: &QueryState, entity: Arc<PersistentEntity>) -> Context {
    let dialect = state.dialect();
    if dialect.supports_mutation_alias() {
        Context::root(entity.alias_name(), entity)
    } else {
        Context::root(dialect.table_name(&entity), entity).unqualified()
    }
}

/// `UPDATE <table> <target> ...`/`DELETE FROM <table> <target> ...`: the table
/// and, when qualified, `AS <alias>`.
fn target(state: &QueryState, ctx: &Context) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(state.ident(&state.dialect().table_name(&ctx.entity)));
    if ctx.qualify {
        ts.space()
            .push(Token::As)
            .space()
            .push(state.ident(&ctx.alias));
    }
    ts
}

/// Whether a written column is generated at write time.
fn is_auto_populated(ctx: &Context, column: &ColumnRef) -> bool {
    column.property.auto_populated
        || (column.path.len() == 1 && ctx.entity.is_version(&column.property.name))
}

fn binding_for(ctx: &Context, column: &ColumnRef) -> QueryParameterBinding {
    QueryParameterBinding::new(column.path.clone(), column.property.data_type)
        .auto_populated(is_auto_populated(ctx, column))
}

fn where_clause(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    model: &QueryModel,
) -> BuildResult<TokenStream> {
    joins::declare(state, stmt, ctx)?;
    let mut conditions = TokenStream::new();
    criteria::render_junction(
        state,
        stmt,
        ctx,
        model.criteria.kind,
        &model.criteria.criteria,
        &mut conditions,
    )?;
    Ok(conditions)
}

pub(crate) fn build_update(
    builder: &SqlQueryBuilder,
    model: &QueryModel,
    properties: &[&str],
) -> BuildResult<QueryResult> {
    if properties.is_empty() {
        return Err(BuildError::EmptyUpdate);
    }

    let mut state = QueryState::new(builder, JoinMode::Forbid("UPDATE"));
    let dialect = state.dialect();
    let entity = state.registry().require(&model.entity)?;
    let ctx = mutation_context(&state, entity);
    let mut stmt = Statement::new(ctx.alias.clone(), &model.joins);
    state.enter_scope(&ctx);

    // SET precedes WHERE in the text, so its placeholders come first.
    let mut assignments = TokenStream::new();
    let mut first = true;
    for property in properties {
        for column in path::resolve(&mut state, &mut stmt, &ctx, property)? {
            if !first {
                assignments.comma().space();
            }
            first = false;
            let placeholder = state.bind(binding_for(&ctx, &column));
            assignments
                .append(&state.column_tokens(&column))
                .space()
                .push(Token::Eq)
                .space()
                .push(placeholder);
        }
    }

    let conditions = where_clause(&mut state, &mut stmt, &ctx, model)?;

    let mut ts = TokenStream::new();
    ts.push(Token::Update)
        .space()
        .append(&target(&state, &ctx))
        .space()
        .push(Token::Set)
        .space()
        .append(&assignments);
    if !conditions.is_empty() {
        ts.space().push(Token::Where).space().append(&conditions);
    }

    Ok(QueryResult {
        query: ts.serialize(dialect),
        update: Some(assignments.serialize(dialect)),
        join_paths: stmt.paths,
        bindings: state.into_bindings(),
    })
}

pub(crate) fn build_delete(builder: &SqlQueryBuilder, model: &QueryModel) -> BuildResult<QueryResult> {
    let mut state = QueryState::new(builder, JoinMode::Forbid("DELETE"));
    let dialect = state.dialect();
    let entity = state.registry().require(&model.entity)?;
    let ctx = mutation_context(&state, entity);
    let mut stmt = Statement::new(ctx.alias.clone(), &model.joins);
    state.enter_scope(&ctx);

    let conditions = where_clause(&mut state, &mut stmt, &ctx, model)?;

    let mut ts = TokenStream::new();
    ts.push(Token::Delete)
        .space()
        .push(Token::From)
        .space()
        .append(&target(&state, &ctx));
    if !conditions.is_empty() {
        ts.space().push(Token::Where).space().append(&conditions);
    }

    Ok(QueryResult {
        query: ts.serialize(dialect),
        update: None,
        join_paths: stmt.paths,
        bindings: state.into_bindings(),
    })
}

/// `INSERT INTO <table> (<columns>) VALUES (<placeholders>)`.
///
/// Database-generated properties are skipped; embedded values and owning
/// foreign keys contribute their columns.
pub(crate) fn build_insert(builder: &SqlQueryBuilder, entity: &str) -> BuildResult<QueryResult> {
    let mut state = QueryState::new(builder, JoinMode::Forbid("INSERT"));
    let dialect = state.dialect();
    let entity = state.registry().require(entity)?;
    let table = dialect.table_name(&entity);
    let ctx = Context::root(table.clone(), entity).unqualified();

    let columns = path::persisted_columns(&state, &ctx, false)?;
    if columns.is_empty() {
        return Err(BuildError::InvalidModel(format!(
            "entity '{}' has no insertable columns",
            ctx.entity.name
        )));
    }

    let mut names = TokenStream::new();
    let mut values = TokenStream::new();
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            names.comma().space();
            values.comma().space();
        }
        names.append(&state.column_tokens(column));
        values.push(state.bind(binding_for(&ctx, column)));
    }

    let mut ts = TokenStream::new();
    ts.push(Token::Insert)
        .space()
        .push(Token::Into)
        .space()
        .push(state.ident(&table))
        .space()
        .lparen()
        .append(&names)
        .rparen()
        .space()
        .push(Token::Values)
        .space()
        .lparen()
        .append(&values)
        .rparen();

    Ok(QueryResult {
        query: ts.serialize(dialect),
        update: None,
        join_paths: Default::default(),
        bindings: state.into_bindings(),
    })
}
