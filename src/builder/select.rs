//! SELECT compilation.

use crate::error::{BuildError, BuildResult};
use crate::query::{Projection, QueryModel};
use crate::sql::{SqlDialect, Token, TokenStream};

use super::criteria;
use super::joins;
use super::order;
use super::path;
use super::result::QueryResult;
use super::state::{Context, JoinMode, QueryState, Statement};
use super::SqlQueryBuilder;

/// Compile `SELECT <projections> FROM <table> AS <alias> [joins] [WHERE ...]
/// [ORDER BY ...] [pagination]`.
///
/// Placeholders are allocated in text order: the select list and the joins
/// never bind values, so the WHERE clause is rendered first.
pub(crate) fn build(builder: &SqlQueryBuilder, model: &QueryModel) -> BuildResult<QueryResult> {
    let mut state = QueryState::new(builder, JoinMode::Emit);
    let dialect = state.dialect();
    let entity = state.registry().require(&model.entity)?;
    let alias = entity.alias_name();
    let ctx = Context::root(alias.clone(), entity.clone());
    let mut stmt = Statement::new(alias.clone(), &model.joins);
    state.enter_scope(&ctx);

    joins::declare(&mut state, &mut stmt, &ctx)?;

    let mut conditions = TokenStream::new();
    criteria::render_junction(
        &mut state,
        &mut stmt,
        &ctx,
        model.criteria.kind,
        &model.criteria.criteria,
        &mut conditions,
    )?;

    let columns = select_list(&mut state, &mut stmt, &ctx, &model.projections)?;

    let paginated = model.max.is_some() || model.offset.is_some();
    let order_by = if model.sort.is_sorted() {
        Some(order::order_by(&mut state, &mut stmt, &ctx, &model.sort)?)
    } else if paginated && dialect.requires_order_by_for_offset() {
        Some(stable_order(&state, &ctx, &model.projections))
    } else {
        None
    };

    let mut ts = TokenStream::new();
    ts.push(Token::Select)
        .space()
        .append(&columns)
        .space()
        .push(Token::From)
        .space()
        .push(state.ident(&dialect.table_name(&entity)))
        .space()
        .push(Token::As)
        .space()
        .push(state.ident(&alias))
        .append(&stmt.joins);
    if !conditions.is_empty() {
        ts.space().push(Token::Where).space().append(&conditions);
    }
    if let Some(order_by) = order_by {
        ts.space().append(&order_by);
    }
    if paginated {
        ts.space()
            .append(&dialect.emit_limit_offset(model.max, model.offset));
    }

    Ok(QueryResult {
        query: ts.serialize(dialect),
        update: None,
        join_paths: stmt.paths,
        bindings: state.into_bindings(),
    })
}

/// `ORDER BY <identity>` for dialects that cannot paginate unsorted results,
/// or `ORDER BY (SELECT NULL)` when there is no identity to sort on or the
/// select list only aggregates.
pub(crate) fn stable_order(
    state: &QueryState,
    ctx: &Context,
    projections: &[Projection],
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::OrderBy).space();

    let ids = ctx.entity.identity.properties();
    if ids.is_empty() || aggregate_only(projections) {
        ts.lparen()
            .push(Token::Select)
            .space()
            .push(Token::Null)
            .rparen();
        return ts;
    }
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.append(&state.column_tokens(&path::column_ref(state, ctx, id)));
    }
    ts
}

fn aggregate_only(projections: &[Projection]) -> bool {
    let mut explicit = projections
        .iter()
        .filter(|p| **p != Projection::Distinct)
        .peekable();
    explicit.peek().is_some() && explicit.all(Projection::is_aggregate)
}

/// The comma separated select list.
///
/// With no projection (or only [`Projection::Distinct`]) every column of the
/// entity is selected, followed by the columns of FETCH-joined entities.
pub(crate) fn select_list(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    projections: &[Projection],
) -> BuildResult<TokenStream> {
    let mut ts = TokenStream::new();
    if projections.contains(&Projection::Distinct) {
        ts.push(Token::Distinct).space();
    }

    let explicit: Vec<&Projection> = projections
        .iter()
        .filter(|p| **p != Projection::Distinct)
        .collect();

    if explicit.is_empty() {
        ts.append(&all_columns(state, ctx));
        let fetched = stmt.fetched.clone();
        for (entity, alias) in &fetched {
            ts.comma()
                .space()
                .append(&state.dialect().select_all_columns(entity, &state.ident(alias)));
        }
        return Ok(ts);
    }

    for (i, projection) in explicit.into_iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.append(&self::projection(state, stmt, ctx, projection)?);
    }
    Ok(ts)
}

fn all_columns(state: &QueryState, ctx: &Context) -> TokenStream {
    state
        .dialect()
        .select_all_columns(&ctx.entity, &state.ident(&ctx.alias))
}

/// Render a single projection.
pub(crate) fn projection(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    projection: &Projection,
) -> BuildResult<TokenStream> {
    let mut ts = TokenStream::new();
    match projection {
        Projection::Count => {
            let alias = state.ident(&ctx.alias);
            state.dialect().append_row_count(&mut ts, &alias);
        }
        Projection::Distinct => {
            ts.push(Token::Distinct).space().append(&all_columns(state, ctx));
        }
        Projection::DistinctProperty { property } => {
            let column = path::resolve_single(state, stmt, ctx, property)?;
            ts.push(Token::Distinct)
                .lparen()
                .append(&state.column_tokens(&column))
                .rparen();
        }
        Projection::Id => {
            let ids = ctx.entity.identity.properties();
            if ids.is_empty() {
                return Err(BuildError::MissingIdentity(ctx.entity.name.clone()));
            }
            for (i, id) in ids.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&state.column_tokens(&path::column_ref(state, ctx, id)));
            }
        }
        Projection::Property { property, alias } => {
            let columns = path::resolve(state, stmt, ctx, property)?;
            if alias.is_some() && columns.len() != 1 {
                return Err(BuildError::InvalidCriterion(format!(
                    "property '{}' maps to {} columns and cannot be aliased",
                    property,
                    columns.len()
                )));
            }
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&state.column_tokens(column));
            }
            if let Some(alias) = alias {
                ts.space().push(Token::As).space().push(state.ident(alias));
            }
        }
        Projection::CountDistinct { property } => {
            let column = path::resolve_single(state, stmt, ctx, property)?;
            ts.push(Token::FunctionName("count".into()))
                .lparen()
                .push(Token::Distinct)
                .lparen()
                .append(&state.column_tokens(&column))
                .rparen()
                .rparen();
        }
        Projection::Avg { property }
        | Projection::Sum { property }
        | Projection::Min { property }
        | Projection::Max { property } => {
            let column = path::resolve_single(state, stmt, ctx, property)?;
            let function = projection.function_name().unwrap_or_default();
            ts.push(Token::FunctionName(function.into()))
                .lparen()
                .append(&state.column_tokens(&column))
                .rparen();
        }
    }
    Ok(ts)
}
