//! Integration tests for ORDER BY, both inside queries and standalone.

#[path = "../common/mod.rs"]
mod common;

use common::{ansi, builder};
use entity_sql::prelude::*;

fn person(builder: &SqlQueryBuilder) -> std::sync::Arc<PersistentEntity> {
    builder.registry().get("Person").unwrap()
}

#[test]
fn test_standalone_order_by() {
    let builder = ansi();
    let sort = Sort::new(vec![Order::asc("name"), Order::desc("age")]);
    let result = builder.build_order_by(&person(&builder), &sort).unwrap();

    assert_eq!(result.query, " ORDER BY person.name ASC, person.age DESC");
    assert!(result.bindings.is_empty());
    assert!(result.join_paths.is_empty());
}

#[test]
fn test_standalone_order_by_reports_join_paths() {
    let builder = ansi();
    let sort = Sort::new(vec![Order::desc("department.name")]);
    let result = builder.build_order_by(&person(&builder), &sort).unwrap();

    assert_eq!(result.query, " ORDER BY person_department_.name DESC");
    assert_eq!(
        result.join_paths.iter().collect::<Vec<_>>(),
        vec!["department"]
    );
}

#[test]
fn test_standalone_order_by_ignore_case() {
    let builder = ansi();
    let sort = Sort::unsorted().then(Order::asc("name").ignore_case());
    let result = builder.build_order_by(&person(&builder), &sort).unwrap();
    assert_eq!(result.query, " ORDER BY lower(person.name) ASC");
}

#[test]
fn test_standalone_order_by_unregistered_entity() {
    let entity = PersistentEntity::new("Ledger")
        .id(PersistentProperty::new("id", DataType::Long))
        .property(PersistentProperty::new("postedAt", DataType::Timestamp));
    let sort = Sort::new(vec![Order::desc("postedAt")]);
    let result = ansi().build_order_by(&entity, &sort).unwrap();
    assert_eq!(result.query, " ORDER BY ledger.posted_at DESC");
}

#[test]
fn test_empty_sort() {
    let builder = ansi();
    let err = builder
        .build_order_by(&person(&builder), &Sort::unsorted())
        .unwrap_err();
    assert_eq!(err, BuildError::EmptySort);
}

#[test]
fn test_order_by_unknown_property() {
    let builder = ansi();
    let sort = Sort::new(vec![Order::asc("nickname")]);
    let err = builder.build_order_by(&person(&builder), &sort).unwrap_err();
    assert!(matches!(err, BuildError::UnknownProperty { .. }));
}

#[test]
fn test_query_order_by() {
    let model = QueryModel::from("Person")
        .filter(Criterion::is_true("active"))
        .order_by(Order::asc("name"))
        .order_by(Order::desc("age").ignore_case());
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.active = TRUE) \
         ORDER BY person.name ASC, lower(person.age) DESC"
    );
}

#[test]
fn test_query_order_by_association_joins() {
    let model = QueryModel::from("Person").order_by(Order::asc("department.name"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN department person_department_ ON person.department_id = person_department_.id \
         ORDER BY person_department_.name ASC"
    );
}

#[test]
fn test_query_order_by_embedded() {
    let model = QueryModel::from("Person").order_by(Order::asc("address"));
    let result = builder(Dialect::Postgres).build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         ORDER BY person.address_street ASC, person.address_city ASC"
    );
}
