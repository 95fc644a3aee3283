//! Integration tests for SELECT compilation: projections, fetch joins and
//! pagination.

#[path = "../common/mod.rs"]
mod common;

use common::{ansi, binding_paths, builder, validate_sql};
use entity_sql::prelude::*;

// ============================================================================
// Select list
// ============================================================================

#[test]
fn test_select_all_without_criteria() {
    let result = ansi().build_query(&QueryModel::from("Person")).unwrap();
    assert_eq!(result.query, "SELECT person.* FROM person AS person");
    assert!(result.bindings.is_empty());
    assert!(result.join_paths.is_empty());
}

#[test]
fn test_conjunction_binds_in_order() {
    let model = QueryModel::from("Person")
        .filter(Criterion::eq("name", param("name")))
        .filter(Criterion::gt("age", param("age")));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.name = :p1 AND person.age > :p2)"
    );
    assert_eq!(
        binding_paths(&result),
        vec![
            ("p1".to_string(), "name".to_string()),
            ("p2".to_string(), "age".to_string())
        ]
    );
    assert_eq!(result.bindings[0].data_type, DataType::String);
    assert_eq!(result.bindings[1].data_type, DataType::Integer);
    validate_sql(&result.query, Dialect::Ansi).unwrap();
}

#[test]
fn test_count_projection() {
    let model = QueryModel::from("Person").project(Projection::Count);
    let result = ansi().build_query(&model).unwrap();
    insta::assert_snapshot!(result.query, @"SELECT COUNT(*) FROM person AS person");
}

#[test]
fn test_count_projection_tsql() {
    let model = QueryModel::from("Person").project(Projection::Count);
    let result = builder(Dialect::TSql).build_query(&model).unwrap();
    assert_eq!(result.query, "SELECT COUNT_BIG(*) FROM person AS person");
    validate_sql(&result.query, Dialect::TSql).unwrap();
}

#[test]
fn test_property_projection_with_alias() {
    let model = QueryModel::from("Person").project(Projection::property_as("name", "n"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(result.query, "SELECT person.name AS n FROM person AS person");
}

#[test]
fn test_aggregate_projections() {
    let model = QueryModel::from("Person")
        .project(Projection::sum("age"))
        .project(Projection::avg("age"))
        .project(Projection::min("age"))
        .project(Projection::max("age"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT SUM(person.age), AVG(person.age), MIN(person.age), MAX(person.age) FROM person AS person"
    );
    validate_sql(&result.query, Dialect::Ansi).unwrap();
}

#[test]
fn test_distinct_projections() {
    let model = QueryModel::from("Person").project(Projection::count_distinct("name"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT COUNT(DISTINCT(person.name)) FROM person AS person"
    );

    let model = QueryModel::from("Person").project(Projection::distinct_property("name"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(result.query, "SELECT DISTINCT(person.name) FROM person AS person");

    let model = QueryModel::from("Person").project(Projection::Distinct);
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(result.query, "SELECT DISTINCT person.* FROM person AS person");

    let model = QueryModel::from("Person")
        .project(Projection::Distinct)
        .project(Projection::property("name"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(result.query, "SELECT DISTINCT person.name FROM person AS person");
}

#[test]
fn test_id_projection() {
    let model = QueryModel::from("Person").project(Projection::Id);
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(result.query, "SELECT person.id FROM person AS person");

    let model = QueryModel::from("Enrollment").project(Projection::Id);
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT enrollment.student_id, enrollment.course_id FROM enrollment AS enrollment"
    );
}

#[test]
fn test_id_projection_without_identity() {
    let model = QueryModel::from("Address").project(Projection::Id);
    let err = ansi().build_query(&model).unwrap_err();
    assert_eq!(err, BuildError::MissingIdentity("Address".into()));
}

#[test]
fn test_embedded_projection() {
    let model = QueryModel::from("Person").project(Projection::property("address.city"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(result.query, "SELECT person.address_city FROM person AS person");

    let model = QueryModel::from("Person").project(Projection::property("address"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.address_street, person.address_city FROM person AS person"
    );
}

#[test]
fn test_multi_column_projection_cannot_be_aliased() {
    let model = QueryModel::from("Person").project(Projection::property_as("address", "a"));
    let err = ansi().build_query(&model).unwrap_err();
    assert!(matches!(err, BuildError::InvalidCriterion(_)));
}

#[test]
fn test_projection_through_association_joins() {
    let model = QueryModel::from("Person").project(Projection::property("department.name"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person_department_.name FROM person AS person \
         JOIN department person_department_ ON person.department_id = person_department_.id"
    );
    assert!(result.join_paths.contains("department"));
}

#[test]
fn test_unknown_projection_property() {
    let model = QueryModel::from("Person").project(Projection::property("nickname"));
    let err = ansi().build_query(&model).unwrap_err();
    assert_eq!(
        err,
        BuildError::UnknownProperty {
            entity: "Person".into(),
            property: "nickname".into()
        }
    );
}

// ============================================================================
// Fetch joins
// ============================================================================

#[test]
fn test_fetch_join_selects_joined_columns() {
    let model = QueryModel::from("Person").join("department", JoinType::Fetch);
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.*, person_department_.* FROM person AS person \
         INNER JOIN department person_department_ ON person.department_id = person_department_.id"
    );
    validate_sql(&result.query, Dialect::Ansi).unwrap();
}

#[test]
fn test_fetch_join_ignored_with_explicit_projection() {
    let model = QueryModel::from("Person")
        .join("department", JoinType::LeftFetch)
        .project(Projection::Count);
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT COUNT(*) FROM person AS person \
         LEFT JOIN department person_department_ ON person.department_id = person_department_.id"
    );
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn test_pagination_per_dialect() {
    let model = QueryModel::from("Person").max(10).offset(20);

    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person OFFSET 20 ROWS FETCH FIRST 10 ROWS ONLY"
    );

    let result = builder(Dialect::Postgres).build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person LIMIT 10 OFFSET 20"
    );
    validate_sql(&result.query, Dialect::Postgres).unwrap();
}

#[test]
fn test_tsql_pagination_orders_by_identity() {
    let model = QueryModel::from("Person").max(10).offset(20);
    let result = builder(Dialect::TSql).build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person ORDER BY person.id OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
    validate_sql(&result.query, Dialect::TSql).unwrap();
}

#[test]
fn test_tsql_paginated_aggregate_orders_by_constant() {
    let model = QueryModel::from("Person").project(Projection::Count).max(5);
    let result = builder(Dialect::TSql).build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT COUNT_BIG(*) FROM person AS person ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
    );
    validate_sql(&result.query, Dialect::TSql).unwrap();

    let model = QueryModel::from("Person")
        .project(Projection::max("age"))
        .project(Projection::property("name"))
        .max(5);
    let result = builder(Dialect::TSql).build_query(&model).unwrap();
    assert!(result.query.contains(" ORDER BY person.id OFFSET 0 ROWS"));
}

#[test]
fn test_tsql_pagination_without_identity() {
    let model = QueryModel::from("Address").max(5);
    let result = builder(Dialect::TSql).build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT address.* FROM address AS address ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
    );
}

#[test]
fn test_unknown_entity() {
    let err = ansi().build_query(&QueryModel::from("Ghost")).unwrap_err();
    assert_eq!(err, BuildError::UnknownEntity("Ghost".into()));
}

#[test]
fn test_compiling_twice_is_identical() {
    let model = QueryModel::from("Person")
        .filter(Criterion::eq("department.name", param("dept")))
        .filter(Criterion::is_in(
            "age",
            subquery(QueryModel::from("Person").project(Projection::max("age"))),
        ))
        .order_by(Order::asc("name"));
    let builder = ansi();
    let first = builder.build_query(&model).unwrap();
    let second = builder.build_query(&model).unwrap();
    assert_eq!(first.query, second.query);
    assert_eq!(first.bindings, second.bindings);
}
