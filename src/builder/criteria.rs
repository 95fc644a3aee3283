//! WHERE-clause compilation.
//!
//! Every criterion renders into its own token stream; a junction only inserts
//! `AND`/`OR` between children that produced output, so an association
//! criterion with no nested criteria never leaves a dangling operator.

use crate::error::{BuildError, BuildResult};
use crate::query::{Criterion, JunctionKind, Literal, QueryValue};
use crate::sql::{SqlDialect, Token, TokenStream};

use super::joins::{self, JoinTable};
use super::path::{self, ColumnRef};
use super::result::QueryParameterBinding;
use super::state::{Context, JoinMode, QueryState, Statement};
use super::subquery;

/// Render `criteria` joined by the junction's operator, parenthesized.
///
/// Nothing is written when no child produces output.
pub(crate) fn render_junction(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    kind: JunctionKind,
    criteria: &[Criterion],
    out: &mut TokenStream,
) -> BuildResult<()> {
    let connective = match kind {
        JunctionKind::Or => Token::Or,
        JunctionKind::And | JunctionKind::Not => Token::And,
    };

    let mut body = TokenStream::new();
    let mut first = true;
    for criterion in criteria {
        let mut part = TokenStream::new();
        render_criterion(state, stmt, ctx, criterion, &mut part)?;
        if part.is_empty() {
            continue;
        }
        if !first {
            body.space().push(connective.clone()).space();
        }
        body.append(&part);
        first = false;
    }

    if body.is_empty() {
        return Ok(());
    }
    if kind == JunctionKind::Not {
        out.push(Token::Not).space();
    }
    out.lparen().append(&body).rparen();
    Ok(())
}

fn render_criterion(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    criterion: &Criterion,
    out: &mut TokenStream,
) -> BuildResult<()> {
    match criterion {
        Criterion::Equals {
            property,
            value,
            ignore_case,
        } => equality(state, stmt, ctx, property, Token::Eq, value, *ignore_case, out),
        Criterion::NotEquals {
            property,
            value,
            ignore_case,
        } => equality(state, stmt, ctx, property, Token::Ne, value, *ignore_case, out),
        Criterion::GreaterThan { property, value } => {
            comparison(state, stmt, ctx, property, Token::Gt, value, out)
        }
        Criterion::GreaterThanEquals { property, value } => {
            comparison(state, stmt, ctx, property, Token::Gte, value, out)
        }
        Criterion::LessThan { property, value } => {
            comparison(state, stmt, ctx, property, Token::Lt, value, out)
        }
        Criterion::LessThanEquals { property, value } => {
            comparison(state, stmt, ctx, property, Token::Lte, value, out)
        }
        Criterion::Between { property, from, to } => {
            let column = path::resolve_single(state, stmt, ctx, property)?;
            out.lparen();
            compare_column(state, &column, Token::Gte, from, false, out)?;
            out.space().push(Token::And).space();
            compare_column(state, &column, Token::Lte, to, false, out)?;
            out.rparen();
            Ok(())
        }
        Criterion::Like { property, value } => {
            comparison(state, stmt, ctx, property, Token::Like, value, out)
        }
        Criterion::ILike { property, value } => {
            let column = path::resolve_single(state, stmt, ctx, property)?;
            compare_column(state, &column, Token::LowerLike, value, true, out)
        }
        Criterion::StartsWith { property, value } => {
            pattern(state, stmt, ctx, property, value, false, true, out)
        }
        Criterion::Contains { property, value } => {
            pattern(state, stmt, ctx, property, value, true, true, out)
        }
        Criterion::EndsWith { property, value } => {
            pattern(state, stmt, ctx, property, value, true, false, out)
        }
        Criterion::In { property, value } => {
            membership(state, stmt, ctx, property, value, false, out)
        }
        Criterion::NotIn { property, value } => {
            membership(state, stmt, ctx, property, value, true, out)
        }
        Criterion::IsNull { property } => null_check(state, stmt, ctx, property, false, out),
        Criterion::IsNotNull { property } => null_check(state, stmt, ctx, property, true, out),
        Criterion::IsEmpty { property } => emptiness(state, stmt, ctx, property, false, out),
        Criterion::IsNotEmpty { property } => emptiness(state, stmt, ctx, property, true, out),
        Criterion::IsTrue { property } => boolean(state, stmt, ctx, property, true, out),
        Criterion::IsFalse { property } => boolean(state, stmt, ctx, property, false, out),
        Criterion::IdEquals { value } => {
            let ids = ctx.entity.identity.properties();
            if ids.is_empty() {
                return Err(BuildError::MissingIdentity(ctx.entity.name.clone()));
            }
            let columns: Vec<_> = ids.iter().map(|id| path::column_ref(state, ctx, id)).collect();
            compare_columns(state, &columns, Token::Eq, value, false, out)
        }
        Criterion::EqualsProperty { property, other } => {
            property_comparison(state, stmt, ctx, property, Token::Eq, other, out)
        }
        Criterion::NotEqualsProperty { property, other } => {
            property_comparison(state, stmt, ctx, property, Token::Ne, other, out)
        }
        Criterion::GreaterThanProperty { property, other } => {
            property_comparison(state, stmt, ctx, property, Token::Gt, other, out)
        }
        Criterion::GreaterThanEqualsProperty { property, other } => {
            property_comparison(state, stmt, ctx, property, Token::Gte, other, out)
        }
        Criterion::LessThanProperty { property, other } => {
            property_comparison(state, stmt, ctx, property, Token::Lt, other, out)
        }
        Criterion::LessThanEqualsProperty { property, other } => {
            property_comparison(state, stmt, ctx, property, Token::Lte, other, out)
        }
        Criterion::Association {
            association,
            criteria,
        } => {
            let joined = joins::join_path(state, stmt, ctx, association)?;
            render_junction(state, stmt, &joined, JunctionKind::And, criteria, out)
        }
        Criterion::Conjunction { criteria } => {
            render_junction(state, stmt, ctx, JunctionKind::And, criteria, out)
        }
        Criterion::Disjunction { criteria } => {
            render_junction(state, stmt, ctx, JunctionKind::Or, criteria, out)
        }
        Criterion::Negation { criteria } => {
            render_junction(state, stmt, ctx, JunctionKind::Not, criteria, out)
        }
        Criterion::Custom {
            name,
            property,
            value,
        } => custom(state, stmt, ctx, name, property, value.as_ref(), out),
    }
}

/// Bind a value, or render a subquery or an outer column reference, into `out`.
fn bind_value(
    state: &mut QueryState,
    column: &ColumnRef,
    value: &QueryValue,
    expandable: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let binding = QueryParameterBinding::new(column.path.clone(), column.property.data_type);
    match value {
        QueryValue::Parameter(parameter) => {
            let token = state.bind(binding.parameter(parameter).expandable(expandable));
            out.push(token);
        }
        QueryValue::Literal(literal) => {
            let list = matches!(literal, Literal::List(_));
            let token = state.bind(binding.value(literal.clone()).expandable(expandable || list));
            out.push(token);
        }
        QueryValue::Subquery(query) => subquery::render(state, query, out)?,
        QueryValue::OuterProperty(property) => {
            let column = outer_column(state, property)?;
            out.append(&state.column_tokens(&column));
        }
    }
    Ok(())
}

/// Resolve `property` against the root entity of the enclosing query.
///
/// The reference is always qualified, with the table name when the outer
/// statement has no alias, and must not need a join of its own.
fn outer_column(state: &mut QueryState, property: &str) -> BuildResult<ColumnRef> {
    let outer = state
        .outer_scope()
        .cloned()
        .ok_or_else(|| {
            BuildError::InvalidCriterion(format!(
                "outer property '{}' is only valid inside a subquery",
                property
            ))
        })?
        .qualified();

    let mut stmt = Statement::new(outer.alias.clone(), &[]);
    let mode = std::mem::replace(&mut state.mode, JoinMode::Forbid("SELECT"));
    let resolved = path::resolve_single(state, &mut stmt, &outer, property);
    state.mode = mode;

    resolved.map_err(|err| match err {
        BuildError::IllegalJoin { association, .. } => BuildError::InvalidCriterion(format!(
            "outer property '{}' needs a join on '{}'",
            property, association
        )),
        other => other,
    })
}

fn lower(inner: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Lower).lparen().append(inner).rparen();
    ts
}

/// `column <op> value`, both sides wrapped in `lower(...)` when `ignore_case`.
fn compare_column(
    state: &mut QueryState,
    column: &ColumnRef,
    op: Token,
    value: &QueryValue,
    ignore_case: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let left = state.column_tokens(column);
    let mut right = TokenStream::new();
    bind_value(state, column, value, false, &mut right)?;

    if ignore_case {
        out.append(&lower(&left))
            .space()
            .push(op)
            .space()
            .append(&lower(&right));
    } else {
        out.append(&left).space().push(op).space().append(&right);
    }
    Ok(())
}

/// Compare one or more columns against the same value.
///
/// Multi-column keys compare every component: `=` joins them with AND, `<>`
/// with OR.
fn compare_columns(
    state: &mut QueryState,
    columns: &[ColumnRef],
    op: Token,
    value: &QueryValue,
    ignore_case: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    if let [column] = columns {
        return compare_column(state, column, op, value, ignore_case, out);
    }
    if matches!(value, QueryValue::Subquery(_) | QueryValue::OuterProperty(_)) {
        return Err(BuildError::InvalidCriterion(
            "a multi-column key cannot be compared to a subquery or an outer property".to_string(),
        ));
    }

    let connective = if op == Token::Ne { Token::Or } else { Token::And };
    out.lparen();
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.space().push(connective.clone()).space();
        }
        compare_column(state, column, op.clone(), value, ignore_case, out)?;
    }
    out.rparen();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn equality(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &str,
    op: Token,
    value: &QueryValue,
    ignore_case: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let columns = path::resolve(state, stmt, ctx, property)?;
    compare_columns(state, &columns, op.clone(), value, ignore_case, out)?;

    // Optimistic locking: the statement matches on the version read earlier.
    let locks_version = op == Token::Eq
        && matches!(state.mode, JoinMode::Forbid(_))
        && ctx.entity.is_version(property)
        && matches!(value, QueryValue::Parameter(_));
    if locks_version {
        if let Some(binding) = state.last_binding_mut() {
            binding.requires_previous_populated_value = true;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn comparison(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &str,
    op: Token,
    value: &QueryValue,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let column = path::resolve_single(state, stmt, ctx, property)?;
    compare_column(state, &column, op, value, false, out)
}

/// `column LIKE <pattern>` with `%` wildcards concatenated around the value.
#[allow(clippy::too_many_arguments)]
fn pattern(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &str,
    value: &QueryValue,
    leading: bool,
    trailing: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let column = path::resolve_single(state, stmt, ctx, property)?;
    let mut bound = TokenStream::new();
    bind_value(state, &column, value, false, &mut bound)?;

    let wildcard = || {
        let mut ts = TokenStream::new();
        ts.push(Token::LitString("%".to_string()));
        ts
    };
    let mut parts = Vec::with_capacity(3);
    if leading {
        parts.push(wildcard());
    }
    parts.push(bound);
    if trailing {
        parts.push(wildcard());
    }

    out.append(&state.column_tokens(&column))
        .space()
        .push(Token::Like)
        .space();

    if state.dialect().supports_concat_operator() {
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.space().push(Token::Concat).space();
            }
            out.append(part);
        }
    } else {
        out.push(Token::FunctionName("concat".to_string())).lparen();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.comma().space();
            }
            out.append(part);
        }
        out.rparen();
    }
    Ok(())
}

fn membership(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &str,
    value: &QueryValue,
    negated: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let column = path::resolve_single(state, stmt, ctx, property)?;
    out.append(&state.column_tokens(&column)).space();
    if negated {
        out.push(Token::Not).space();
    }
    out.push(Token::In).space();

    match value {
        QueryValue::Subquery(query) => subquery::render(state, query, out),
        _ => {
            out.lparen();
            bind_value(state, &column, value, true, out)?;
            out.rparen();
            Ok(())
        }
    }
}

fn null_check(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &str,
    negated: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let columns = path::resolve(state, stmt, ctx, property)?;
    let check = if negated { Token::IsNotNull } else { Token::IsNull };
    let composite = columns.len() > 1;

    if composite {
        out.lparen();
    }
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.space().push(Token::And).space();
        }
        out.append(&state.column_tokens(column))
            .space()
            .push(check.clone());
    }
    if composite {
        out.rparen();
    }
    Ok(())
}

fn boolean(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &str,
    expected: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let column = path::resolve_single(state, stmt, ctx, property)?;
    out.append(&state.column_tokens(&column))
        .space()
        .push(Token::Eq)
        .space()
        .push(Token::LitBool(expected));
    Ok(())
}

fn property_comparison(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &str,
    op: Token,
    other: &str,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let left = path::resolve_single(state, stmt, ctx, property)?;
    let right = path::resolve_single(state, stmt, ctx, other)?;
    out.append(&state.column_tokens(&left))
        .space()
        .push(op)
        .space()
        .append(&state.column_tokens(&right));
    Ok(())
}

/// Textual properties test for NULL or `''` through the dialect; to-many
/// associations test for related rows with a correlated EXISTS.
fn emptiness(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    property: &str,
    negated: bool,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let (owner, prop) = path::resolve_property(state, stmt, ctx, property)?;

    match &prop.association {
        Some(association) if association.kind.is_collection() => {
            let target = state.registry().require(&association.entity)?;
            let dialect = state.dialect();

            let (table, alias, correlation) = if association.uses_join_table() {
                let link = JoinTable::resolve(state, &owner.entity, &prop, association, &target)?;
                let alias = state.next_subquery_alias(&link.table);
                (link.table, alias, link.owner_columns)
            } else {
                let columns = joins::inverse_foreign_key(state, &owner.entity, association, &target)?;
                let alias = state.next_subquery_alias(&target.alias_name());
                (dialect.table_name(&target), alias, columns)
            };

            // Empty means no related row.
            if !negated {
                out.push(Token::Not).space();
            }
            out.push(Token::Exists)
                .space()
                .lparen()
                .push(Token::Select)
                .space()
                .push(Token::LitInt(1))
                .space()
                .push(Token::From)
                .space()
                .push(state.ident(&table))
                .space()
                .push(state.ident(&alias))
                .space()
                .push(Token::Where)
                .space();
            for (i, (column, id)) in correlation.iter().enumerate() {
                if i > 0 {
                    out.space().push(Token::And).space();
                }
                out.append(&state.qualified(&alias, column))
                    .space()
                    .push(Token::Eq)
                    .space()
                    .append(&state.qualified(
                        &owner.alias,
                        &dialect.column_name(&owner.entity, id),
                    ));
            }
            out.rparen();
            Ok(())
        }
        Some(association) => Err(BuildError::InvalidCriterion(format!(
            "'{}' is a {:?} association; emptiness applies to collections",
            property, association.kind
        ))),
        None if prop.data_type.is_textual() => {
            let column = path::column_ref(state, &owner, &prop);
            let condition = state
                .dialect()
                .empty_text_condition(&state.column_tokens(&column), negated);
            out.append(&condition);
            Ok(())
        }
        None => Err(BuildError::InvalidCriterion(format!(
            "'{}' of type {:?} cannot be tested for emptiness",
            property, prop.data_type
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
fn custom(
    state: &mut QueryState,
    stmt: &mut Statement,
    ctx: &Context,
    name: &str,
    property: &str,
    value: Option<&QueryValue>,
    out: &mut TokenStream,
) -> BuildResult<()> {
    let handler = state
        .handler(name)
        .ok_or_else(|| BuildError::UnsupportedCriterion(name.to_string()))?;
    let column = path::resolve_single(state, stmt, ctx, property)?;
    let dialect = state.dialect();
    let column_sql = state.column_tokens(&column).serialize(dialect);

    let placeholder = match value {
        None => None,
        Some(QueryValue::Subquery(_)) => {
            return Err(BuildError::InvalidCriterion(format!(
                "custom criterion '{}' does not accept a subquery",
                name
            )));
        }
        Some(value) => {
            let mut bound = TokenStream::new();
            bind_value(state, &column, value, false, &mut bound)?;
            Some(bound.serialize(dialect))
        }
    };

    out.push(Token::Raw(handler.render(&column_sql, placeholder.as_deref())));
    Ok(())
}
