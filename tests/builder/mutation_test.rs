//! Integration tests for UPDATE, DELETE and INSERT compilation.

#[path = "../common/mod.rs"]
mod common;

use common::{ansi, binding_paths, builder, validate_sql};
use entity_sql::prelude::*;

fn by_id() -> QueryModel {
    QueryModel::from("Person").filter(Criterion::id_eq(param("id")))
}

// ============================================================================
// UPDATE
// ============================================================================

#[test]
fn test_update_binds_set_before_where() {
    let result = ansi().build_update(&by_id(), &["name"]).unwrap();

    assert_eq!(
        result.query,
        "UPDATE person AS person SET person.name = :p1 WHERE (person.id = :p2)"
    );
    assert_eq!(result.update.as_deref(), Some("person.name = :p1"));
    assert_eq!(
        binding_paths(&result),
        vec![
            ("p1".to_string(), "name".to_string()),
            ("p2".to_string(), "id".to_string())
        ]
    );
    assert_eq!(result.bindings[0].parameter_name, None);
    assert_eq!(result.bindings[1].parameter_name.as_deref(), Some("id"));
}

#[test]
fn test_update_without_mutation_alias() {
    let result = builder(Dialect::Postgres)
        .build_update(&by_id(), &["name", "age"])
        .unwrap();
    assert_eq!(
        result.query,
        "UPDATE person SET name = $1, age = $2 WHERE (id = $3)"
    );
    assert_eq!(result.update.as_deref(), Some("name = $1, age = $2"));
    validate_sql(&result.query, Dialect::Postgres).unwrap();
}

#[test]
fn test_update_embedded_sets_every_column() {
    let result = ansi().build_update(&by_id(), &["address"]).unwrap();
    assert_eq!(
        result.query,
        "UPDATE person AS person SET person.address_street = :p1, person.address_city = :p2 \
         WHERE (person.id = :p3)"
    );
    assert_eq!(result.bindings[0].path(), "address.street");
}

#[test]
fn test_update_without_properties() {
    let err = ansi().build_update(&by_id(), &[]).unwrap_err();
    assert_eq!(err, BuildError::EmptyUpdate);
}

#[test]
fn test_update_with_optimistic_lock() {
    let model = QueryModel::from("Person")
        .filter(Criterion::id_eq(param("id")))
        .filter(Criterion::eq("version", param("version")));
    let result = ansi()
        .build_update(&model, &["name", "version", "lastUpdated"])
        .unwrap();

    assert_eq!(
        result.query,
        "UPDATE person AS person \
         SET person.name = :p1, person.version = :p2, person.last_updated = :p3 \
         WHERE (person.id = :p4 AND person.version = :p5)"
    );

    let flags: Vec<_> = result
        .bindings
        .iter()
        .map(|b| (b.auto_populated, b.requires_previous_populated_value))
        .collect();
    assert_eq!(
        flags,
        vec![
            (false, false),
            (true, false),
            (true, false),
            (false, false),
            (false, true)
        ]
    );
}

#[test]
fn test_update_rejects_joins() {
    let model = QueryModel::from("Person").filter(Criterion::eq("department.name", param("dept")));
    let err = ansi().build_update(&model, &["name"]).unwrap_err();

    assert_eq!(
        err,
        BuildError::IllegalJoin {
            association: "department".into(),
            statement: "UPDATE",
        }
    );
    assert!(err
        .to_string()
        .contains("joins cannot be used in a DELETE or UPDATE operation"));
}

#[test]
fn test_update_rejects_declared_joins() {
    let model = by_id().join("department", JoinType::Inner);
    let err = ansi().build_update(&model, &["name"]).unwrap_err();
    assert!(matches!(err, BuildError::IllegalJoin { statement: "UPDATE", .. }));
}

// ============================================================================
// DELETE
// ============================================================================

#[test]
fn test_delete() {
    let model = QueryModel::from("Person").filter(Criterion::lt("age", param("age")));

    let result = ansi().build_delete(&model).unwrap();
    assert_eq!(
        result.query,
        "DELETE FROM person AS person WHERE (person.age < :p1)"
    );
    assert_eq!(result.update, None);

    let result = builder(Dialect::Postgres).build_delete(&model).unwrap();
    assert_eq!(result.query, "DELETE FROM person WHERE (age < $1)");
    validate_sql(&result.query, Dialect::Postgres).unwrap();
}

#[test]
fn test_delete_everything() {
    let result = ansi().build_delete(&QueryModel::from("Person")).unwrap();
    assert_eq!(result.query, "DELETE FROM person AS person");
    assert!(result.bindings.is_empty());
}

#[test]
fn test_delete_by_foreign_key() {
    let model = QueryModel::from("Person").filter(Criterion::eq("department.id", param("dept")));
    let result = ansi().build_delete(&model).unwrap();
    assert_eq!(
        result.query,
        "DELETE FROM person AS person WHERE (person.department_id = :p1)"
    );
}

#[test]
fn test_delete_rejects_association_criterion() {
    let model = QueryModel::from("Person").filter(Criterion::association(
        "pets",
        vec![Criterion::eq("name", param("pet"))],
    ));
    let err = ansi().build_delete(&model).unwrap_err();
    assert_eq!(
        err,
        BuildError::IllegalJoin {
            association: "pets".into(),
            statement: "DELETE",
        }
    );
}

#[test]
fn test_delete_with_collection_emptiness() {
    let model = QueryModel::from("Person").filter(Criterion::is_empty("pets"));
    let result = ansi().build_delete(&model).unwrap();
    assert_eq!(
        result.query,
        "DELETE FROM person AS person \
         WHERE (NOT EXISTS (SELECT 1 FROM pet pet_1 WHERE pet_1.owner_id = person.id))"
    );
}

// ============================================================================
// INSERT
// ============================================================================

#[test]
fn test_insert_skips_generated_identity() {
    let result = ansi().build_insert("Person").unwrap();

    assert_eq!(
        result.query,
        "INSERT INTO person (version, name, age, active, last_updated, address_street, \
         address_city, department_id, profile_id) \
         VALUES (:p1, :p2, :p3, :p4, :p5, :p6, :p7, :p8, :p9)"
    );
    let auto: Vec<_> = result
        .bindings
        .iter()
        .filter(|b| b.auto_populated)
        .map(|b| b.path())
        .collect();
    assert_eq!(auto, vec!["version", "lastUpdated"]);
    assert_eq!(result.bindings[7].path(), "department.id");
    validate_sql(&result.query, Dialect::Ansi).unwrap();
}

#[test]
fn test_insert_composite_identity() {
    let result = builder(Dialect::MySql).build_insert("Enrollment").unwrap();
    assert_eq!(
        result.query,
        "INSERT INTO enrollment (student_id, course_id, grade) VALUES (?, ?, ?)"
    );
    validate_sql(&result.query, Dialect::MySql).unwrap();
}

#[test]
fn test_insert_unknown_entity() {
    let err = ansi().build_insert("Ghost").unwrap_err();
    assert_eq!(err, BuildError::UnknownEntity("Ghost".into()));
}
