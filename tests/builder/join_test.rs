//! Integration tests for association joins.

#[path = "../common/mod.rs"]
mod common;

use common::{ansi, builder, validate_sql};
use entity_sql::prelude::*;

#[test]
fn test_to_one_property_joins_target() {
    let model = QueryModel::from("Person").filter(Criterion::eq("department.name", param("dept")));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN department person_department_ ON person.department_id = person_department_.id \
         WHERE (person_department_.name = :p1)"
    );
    assert_eq!(result.join_paths.iter().collect::<Vec<_>>(), vec!["department"]);
    assert_eq!(result.bindings[0].path(), "department.name");
    validate_sql(&result.query, Dialect::Ansi).unwrap();
}

#[test]
fn test_foreign_key_identity_needs_no_join() {
    let model = QueryModel::from("Person").filter(Criterion::eq("department.id", param("dept")));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.department_id = :p1)"
    );
    assert!(result.join_paths.is_empty());
    assert_eq!(result.bindings[0].data_type, DataType::Long);
}

#[test]
fn test_whole_association_compares_foreign_key() {
    let model = QueryModel::from("Person").filter(Criterion::eq("department", param("dept")));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.department_id = :p1)"
    );
}

#[test]
fn test_repeated_path_joins_once() {
    let model = QueryModel::from("Person")
        .filter(Criterion::eq("department.name", param("dept")))
        .filter(Criterion::is_true("department.active"));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(result.query.matches(" JOIN ").count(), 1);
    assert!(result.query.ends_with(
        "WHERE (person_department_.name = :p1 AND person_department_.active = TRUE)"
    ));
}

#[test]
fn test_association_criterion_on_inverse_collection() {
    let model = QueryModel::from("Person").filter(Criterion::association(
        "pets",
        vec![Criterion::eq("name", param("pet"))],
    ));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN pet person_pets_ ON person_pets_.owner_id = person.id \
         WHERE ((person_pets_.name = :p1))"
    );
    assert_eq!(result.bindings[0].path(), "pets.name");
    validate_sql(&result.query, Dialect::Ansi).unwrap();
}

#[test]
fn test_empty_association_criterion_still_joins() {
    let model = QueryModel::from("Person").filter(Criterion::association("pets", vec![]));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN pet person_pets_ ON person_pets_.owner_id = person.id"
    );
    assert!(result.join_paths.contains("pets"));
}

#[test]
fn test_empty_association_criterion_leaves_no_operator() {
    for (kind, connective) in [(JunctionKind::And, "AND"), (JunctionKind::Or, "OR")] {
        let model = QueryModel::from("Person")
            .junction(kind)
            .filter(Criterion::association("department", vec![]))
            .filter(Criterion::eq("name", param("name")))
            .filter(Criterion::eq("department.name", param("dept")));
        let result = ansi().build_query(&model).unwrap();

        assert_eq!(
            result.query,
            format!(
                "SELECT person.* FROM person AS person \
                 JOIN department person_department_ ON person.department_id = person_department_.id \
                 WHERE (person.name = :p1 {} person_department_.name = :p2)",
                connective
            )
        );
        assert_eq!(result.query.matches(" JOIN ").count(), 1);
        validate_sql(&result.query, Dialect::Ansi).unwrap();
    }
}

#[test]
fn test_empty_association_criterion_between_siblings() {
    let model = QueryModel::from("Person")
        .filter(Criterion::or(vec![
            Criterion::is_true("active"),
            Criterion::association("pets", vec![]),
            Criterion::is_null("name"),
        ]));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN pet person_pets_ ON person_pets_.owner_id = person.id \
         WHERE ((person.active = TRUE OR person.name IS NULL))"
    );
}

#[test]
fn test_many_to_many_joins_through_link_table() {
    let model = QueryModel::from("Person").filter(Criterion::eq("roles.name", param("role")));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN person_roles person_roles_jt ON person_roles_jt.person_id = person.id \
         JOIN role person_roles_ ON person_roles_.id = person_roles_jt.role_id \
         WHERE (person_roles_.name = :p1)"
    );
    validate_sql(&result.query, Dialect::Ansi).unwrap();
}

fn friends_registry() -> std::sync::Arc<EntityRegistry> {
    std::sync::Arc::new(EntityRegistry::with_entities([PersistentEntity::new("Person")
        .id(PersistentProperty::new("id", DataType::Long))
        .property(PersistentProperty::new("name", DataType::String))
        .property(PersistentProperty::association(
            "friends",
            Association::many_to_many("Person"),
        ))
        .property(PersistentProperty::association(
            "admirers",
            Association::many_to_many("Person").mapped_by("friends"),
        ))]))
}

#[test]
fn test_self_referential_link_columns_are_distinct() {
    let builder = SqlQueryBuilder::new(friends_registry(), Dialect::Ansi);

    let model = QueryModel::from("Person").filter(Criterion::eq("friends.name", param("name")));
    let result = builder.build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN person_friends person_friends_jt ON person_friends_jt.person_id = person.id \
         JOIN person person_friends_ ON person_friends_.id = person_friends_jt.friends_id \
         WHERE (person_friends_.name = :p1)"
    );
    validate_sql(&result.query, Dialect::Ansi).unwrap();

    let model = QueryModel::from("Person").filter(Criterion::eq("admirers.name", param("name")));
    let result = builder.build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN person_friends person_admirers_jt ON person_admirers_jt.friends_id = person.id \
         JOIN person person_admirers_ ON person_admirers_.id = person_admirers_jt.person_id \
         WHERE (person_admirers_.name = :p1)"
    );
}

#[test]
fn test_self_referential_emptiness_uses_owning_column() {
    let builder = SqlQueryBuilder::new(friends_registry(), Dialect::Ansi);
    let model = QueryModel::from("Person").filter(Criterion::is_empty("admirers"));
    let result = builder.build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (NOT EXISTS \
         (SELECT 1 FROM person_friends person_friends_1 WHERE person_friends_1.friends_id = person.id))"
    );
}

#[test]
fn test_nested_path_joins_each_level() {
    let model = QueryModel::from("Person").filter(Criterion::eq(
        "profile.detail.preference.locale",
        param("locale"),
    ));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         JOIN profile person_profile_ ON person.profile_id = person_profile_.id \
         JOIN profile_detail person_profile_detail_ ON person_profile_.detail_id = person_profile_detail_.id \
         JOIN preference person_profile_detail_preference_ ON person_profile_detail_.preference_id = person_profile_detail_preference_.id \
         WHERE (person_profile_detail_preference_.locale = :p1)"
    );
    assert_eq!(
        result.join_paths.iter().collect::<Vec<_>>(),
        vec!["profile", "profile.detail", "profile.detail.preference"]
    );
    assert_eq!(
        result.bindings[0].property_path,
        vec!["profile", "detail", "preference", "locale"]
    );
}

#[test]
fn test_one_to_many_mapped_by_many_to_one() {
    let model =
        QueryModel::from("Department").filter(Criterion::eq("staff.name", param("name")));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT department.* FROM department AS department \
         JOIN person department_staff_ ON department_staff_.department_id = department.id \
         WHERE (department_staff_.name = :p1)"
    );
}

#[test]
fn test_declared_join_type_applies_to_criteria_path() {
    let model = QueryModel::from("Person")
        .join("department", JoinType::Left)
        .filter(Criterion::eq("department.name", param("dept")));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         LEFT JOIN department person_department_ ON person.department_id = person_department_.id \
         WHERE (person_department_.name = :p1)"
    );
}

#[test]
fn test_right_join() {
    let model = QueryModel::from("Person").join("department", JoinType::Right);
    let result = ansi().build_query(&model).unwrap();
    assert!(result
        .query
        .contains(" RIGHT JOIN department person_department_ ON "));
}

#[test]
fn test_full_outer_join() {
    let model = QueryModel::from("Person").join("department", JoinType::Outer);
    let result = builder(Dialect::Postgres).build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         FULL OUTER JOIN department person_department_ ON person.department_id = person_department_.id"
    );
    validate_sql(&result.query, Dialect::Postgres).unwrap();
}

#[test]
fn test_full_outer_join_unsupported() {
    let model = QueryModel::from("Person").join("department", JoinType::Outer);
    let err = builder(Dialect::MySql).build_query(&model).unwrap_err();
    assert_eq!(
        err,
        BuildError::UnsupportedJoin {
            join_type: "OUTER".into(),
            dialect: "mysql",
        }
    );
}

#[test]
fn test_join_on_plain_property_is_rejected() {
    let model = QueryModel::from("Person").join("name", JoinType::Inner);
    let err = ansi().build_query(&model).unwrap_err();
    assert!(matches!(err, BuildError::InvalidCriterion(_)));
}

#[test]
fn test_unknown_association() {
    let model = QueryModel::from("Person").filter(Criterion::eq("team.name", param("t")));
    let err = ansi().build_query(&model).unwrap_err();
    assert!(matches!(
        err,
        BuildError::UnknownProperty { entity, .. } if entity == "Person"
    ));
}

#[test]
fn test_escaped_join_identifiers() {
    let builder = builder(Dialect::Postgres).escape_identifiers(true);
    let model = QueryModel::from("Person").filter(Criterion::eq("department.name", param("dept")));
    let result = builder.build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT \"person\".* FROM \"person\" AS \"person\" \
         JOIN \"department\" \"person_department_\" ON \"person\".\"department_id\" = \"person_department_\".\"id\" \
         WHERE (\"person_department_\".\"name\" = $1)"
    );
    validate_sql(&result.query, Dialect::Postgres).unwrap();
}
