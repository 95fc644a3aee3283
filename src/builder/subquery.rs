//! Nested SELECTs used as criterion values.

use crate::error::{BuildError, BuildResult};
use crate::query::{Projection, QueryModel};
use crate::sql::{SqlDialect, Token, TokenStream};

use super::criteria;
use super::joins;
use super::order;
use super::select;
use super::state::{Context, JoinMode, QueryState, Statement};

/// The clauses of a compiled subquery, in text order.
struct Clauses {
    projection: TokenStream,
    conditions: TokenStream,
    order_by: Option<TokenStream>,
    pagination: Option<TokenStream>,
}

/// Render `(SELECT <projection> FROM <table> <alias> [WHERE ...] [ORDER BY ...]
/// [pagination])`.
///
/// The subquery gets an alias of its own (`<entity>_<n>`) and its own join
/// bookkeeping; it shares the placeholder counter with the enclosing statement.
/// [`QueryValue::OuterProperty`](crate::query::QueryValue::OuterProperty)
/// values inside it resolve against the enclosing statement's root entity.
pub(crate) fn render(
    state: &mut QueryState,
    query: &QueryModel,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let entity = state.registry().require(&query.entity)?;
    let alias = state.next_subquery_alias(&entity.alias_name());
    let ctx = Context::root(alias.clone(), entity.clone());
    let mut stmt = Statement::new(alias.clone(), &query.joins);

    // Joins are always emitted inside a subquery, even under UPDATE or DELETE.
    let outer_mode = std::mem::replace(&mut state.mode, JoinMode::Emit);
    state.enter_scope(&ctx);
    let compiled = compile(state, &mut stmt, &ctx, query);
    state.leave_scope();
    state.mode = outer_mode;
    let clauses = compiled?;

    out.lparen()
        .push(Token::Select)
        .space()
        .append(&clauses.projection)
        .space()
        .push(Token::From)
        .space()
        .push(state.ident(&state.dialect().table_name(&entity)))
        .space()
        .push(state.ident(&alias))
        .append(&stmt.joins);
    if !clauses.conditions.is_empty() {
        out.space()
            .push(Token::Where)
            .space()
            .append(&clauses.conditions);
    }
    if let Some(order_by) = &clauses.order_by {
        out.space().append(order_by);
    }
    if let Some(pagination) = &clauses.pagination {
        out.space().append(pagination);
    }
    out.rparen();
    Ok(())
}

fn compile(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    query: &QueryModel,
) -> BuildResult<Clauses> {
    joins::declare(state, stmt, ctx)?;

    let mut conditions = TokenStream::new();
    criteria::render_junction(
        state,
        stmt,
        ctx,
        query.criteria.kind,
        &query.criteria.criteria,
        &mut conditions,
    )?;

    let projection = projection(state, stmt, ctx, &query.projections)?;

    let paginated = query.max.is_some() || query.offset.is_some();
    if query.sort.is_sorted() && !paginated {
        return Err(BuildError::InvalidCriterion(format!(
            "subquery over '{}' is sorted but has no max or offset",
            ctx.entity.name
        )));
    }

    let dialect = state.dialect();
    let order_by = if query.sort.is_sorted() {
        Some(order::order_by(state, stmt, ctx, &query.sort)?)
    } else if paginated && dialect.requires_order_by_for_offset() {
        Some(select::stable_order(state, ctx, &query.projections))
    } else {
        None
    };
    let pagination = paginated.then(|| dialect.emit_limit_offset(query.max, query.offset));

    Ok(Clauses {
        projection,
        conditions,
        order_by,
        pagination,
    })
}

/// The single column a subquery selects, `DISTINCT` when asked for.
///
/// Without an explicit projection the entity's identity column is selected.
fn projection(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    projections: &[Projection],
) -> BuildResult<TokenStream> {
    let distinct = projections.contains(&Projection::Distinct);
    let explicit: Vec<&Projection> = projections
        .iter()
        .filter(|p| **p != Projection::Distinct)
        .collect();

    let column = match explicit.as_slice() {
        [] => {
            let mut ids = ctx.entity.identity.properties().iter();
            match (ids.next(), ids.next()) {
                (Some(id), None) => {
                    let column = super::path::column_ref(state, ctx, id);
                    state.column_tokens(&column)
                }
                (None, _) => return Err(BuildError::MissingIdentity(ctx.entity.name.clone())),
                (Some(_), Some(_)) => {
                    return Err(BuildError::InvalidCriterion(format!(
                        "subquery over '{}' needs a projection: its identity is composite",
                        ctx.entity.name
                    )));
                }
            }
        }
        [projection] => select::projection(state, stmt, ctx, projection)?,
        _ => {
            return Err(BuildError::InvalidCriterion(format!(
                "subquery over '{}' must select exactly one column",
                ctx.entity.name
            )));
        }
    };

    let mut ts = TokenStream::new();
    if distinct {
        ts.push(Token::Distinct).space();
    }
    ts.append(&column);
    Ok(ts)
}
