//! ORDER BY compilation.

use std::sync::Arc;

use crate::error::{BuildError, BuildResult};
use crate::model::PersistentEntity;
use crate::query::{Sort, SortDir};
use crate::sql::{Token, TokenStream};

use super::path;
use super::result::QueryResult;
use super::state::{Context, JoinMode, QueryState, Statement};
use super::SqlQueryBuilder;

/// Compile a standalone ` ORDER BY ...` clause for `entity`.
///
/// Association paths are referenced through their conventional join aliases
/// without emitting joins; the paths the caller must join are reported in
/// `join_paths`.
pub(crate) fn build(
    builder: &SqlQueryBuilder,
    entity: &PersistentEntity,
    sort: &Sort,
) -> BuildResult<QueryResult> {
    if !sort.is_sorted() {
        return Err(BuildError::EmptySort);
    }

    let mut state = QueryState::new(builder, JoinMode::Reference);
    let entity = state
        .registry()
        .get(&entity.name)
        .unwrap_or_else(|| Arc::new(entity.clone()));
    let alias = entity.alias_name();
    let ctx = Context::root(alias.clone(), entity);
    let mut stmt = Statement::new(alias, &[]);

    let order_by = order_by(&mut state, &mut stmt, &ctx, sort)?;
    let mut ts = TokenStream::new();
    ts.space().append(&order_by);

    Ok(QueryResult {
        query: ts.serialize(state.dialect()),
        update: None,
        join_paths: stmt.paths,
        bindings: state.into_bindings(),
    })
}

/// `ORDER BY a ASC, lower(b) DESC, ...` in declared order.
///
/// Every path must resolve against the context's entity.
pub(crate) fn order_by(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    sort: &Sort,
) -> BuildResult<TokenStream> {
    let mut ts = TokenStream::new();
    ts.push(Token::OrderBy).space();

    let mut first = true;
    for order in &sort.orders {
        for column in path::resolve(state, stmt, ctx, &order.property)? {
            if !first {
                ts.comma().space();
            }
            first = false;

            let column_ts = state.column_tokens(&column);
            if order.ignore_case {
                ts.push(Token::Lower).lparen().append(&column_ts).rparen();
            } else {
                ts.append(&column_ts);
            }
            ts.space().push(match order.direction {
                SortDir::Asc => Token::Asc,
                SortDir::Desc => Token::Desc,
            });
        }
    }

    Ok(ts)
}
