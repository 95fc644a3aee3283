//! Integration tests for WHERE-clause compilation.

#[path = "../common/mod.rs"]
mod common;

use common::{ansi, binding_paths, builder, registry, validate_sql};
use entity_sql::prelude::*;

fn where_of(criterion: Criterion) -> String {
    let model = QueryModel::from("Person").filter(criterion);
    let query = ansi().build_query(&model).unwrap().query;
    query
        .strip_prefix("SELECT person.* FROM person AS person WHERE ")
        .unwrap_or(&query)
        .to_string()
}

// ============================================================================
// Comparisons
// ============================================================================

#[test]
fn test_comparison_operators() {
    assert_eq!(where_of(Criterion::eq("age", param("a"))), "(person.age = :p1)");
    assert_eq!(where_of(Criterion::ne("age", param("a"))), "(person.age <> :p1)");
    assert_eq!(where_of(Criterion::gt("age", param("a"))), "(person.age > :p1)");
    assert_eq!(where_of(Criterion::gte("age", param("a"))), "(person.age >= :p1)");
    assert_eq!(where_of(Criterion::lt("age", param("a"))), "(person.age < :p1)");
    assert_eq!(where_of(Criterion::lte("age", param("a"))), "(person.age <= :p1)");
}

#[test]
fn test_between_allocates_two_placeholders() {
    let model = QueryModel::from("Person")
        .filter(Criterion::between("age", param("from"), param("to")));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE ((person.age >= :p1 AND person.age <= :p2))"
    );
    let names: Vec<_> = result
        .bindings
        .iter()
        .map(|b| b.parameter_name.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["from", "to"]);
    assert_ne!(result.bindings[0].placeholder, result.bindings[1].placeholder);
    validate_sql(&result.query, Dialect::Ansi).unwrap();
}

#[test]
fn test_case_insensitive_comparisons() {
    assert_eq!(
        where_of(Criterion::ilike("name", param("n"))),
        "(lower(person.name) like lower(:p1))"
    );
    assert_eq!(
        where_of(Criterion::eq_ignore_case("name", param("n"))),
        "(lower(person.name) = lower(:p1))"
    );
    assert_eq!(
        where_of(Criterion::ne_ignore_case("name", param("n"))),
        "(lower(person.name) <> lower(:p1))"
    );
}

#[test]
fn test_like_patterns() {
    assert_eq!(where_of(Criterion::like("name", param("n"))), "(person.name LIKE :p1)");
    assert_eq!(
        where_of(Criterion::starts_with("name", param("n"))),
        "(person.name LIKE :p1 || '%')"
    );
    assert_eq!(
        where_of(Criterion::contains("name", param("n"))),
        "(person.name LIKE '%' || :p1 || '%')"
    );
    assert_eq!(
        where_of(Criterion::ends_with("name", param("n"))),
        "(person.name LIKE '%' || :p1)"
    );
}

#[test]
fn test_like_patterns_without_concat_operator() {
    let model = QueryModel::from("Person").filter(Criterion::contains("name", param("n")));
    let result = builder(Dialect::MySql).build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.name LIKE CONCAT('%', ?, '%'))"
    );
    validate_sql(&result.query, Dialect::MySql).unwrap();
}

#[test]
fn test_like_patterns_tsql_concat() {
    let model = QueryModel::from("Person").filter(Criterion::starts_with("name", param("n")));
    let result = builder(Dialect::TSql).build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.name LIKE @p1 + '%')"
    );
}

// ============================================================================
// Membership and null checks
// ============================================================================

#[test]
fn test_in_is_expandable() {
    let model = QueryModel::from("Person").filter(Criterion::is_in("age", param("ages")));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.age IN (:p1))"
    );
    assert!(result.bindings[0].expandable);

    assert_eq!(
        where_of(Criterion::not_in("age", param("ages"))),
        "(person.age NOT IN (:p1))"
    );
}

#[test]
fn test_literal_values_are_bound() {
    let model = QueryModel::from("Person")
        .filter(Criterion::eq("name", lit("Fred")))
        .filter(Criterion::is_in(
            "age",
            QueryValue::Literal(Literal::List(vec![30.into(), 40.into()])),
        ));
    let result = ansi().build_query(&model).unwrap();

    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.name = :p1 AND person.age IN (:p2))"
    );
    assert_eq!(result.bindings[0].value, Some(Literal::String("Fred".into())));
    assert_eq!(result.bindings[0].parameter_name, None);
    assert!(result.bindings[1].expandable);
    assert_eq!(result.parameters().get("p1").map(String::as_str), Some("name"));
}

#[test]
fn test_argument_index_is_recorded() {
    let model = QueryModel::from("Person").filter(Criterion::eq("name", arg("name", 2)));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(result.bindings[0].parameter_index, Some(2));
    assert_eq!(result.bindings[0].parameter_name.as_deref(), Some("name"));
}

#[test]
fn test_null_checks() {
    assert_eq!(where_of(Criterion::is_null("name")), "(person.name IS NULL)");
    assert_eq!(where_of(Criterion::is_not_null("name")), "(person.name IS NOT NULL)");
    assert_eq!(
        where_of(Criterion::is_null("department")),
        "(person.department_id IS NULL)"
    );
    assert_eq!(
        where_of(Criterion::is_null("address")),
        "((person.address_street IS NULL AND person.address_city IS NULL))"
    );
}

#[test]
fn test_boolean_literals_per_dialect() {
    assert_eq!(where_of(Criterion::is_true("active")), "(person.active = TRUE)");
    assert_eq!(where_of(Criterion::is_false("active")), "(person.active = FALSE)");

    let model = QueryModel::from("Person").filter(Criterion::is_true("active"));
    let result = builder(Dialect::Postgres).build_query(&model).unwrap();
    assert!(result.query.ends_with("(person.active = true)"));
    let result = builder(Dialect::MySql).build_query(&model).unwrap();
    assert!(result.query.ends_with("(person.active = 1)"));
    assert!(result.bindings.is_empty());
}

// ============================================================================
// Emptiness
// ============================================================================

#[test]
fn test_text_emptiness() {
    assert_eq!(
        where_of(Criterion::is_empty("name")),
        "((person.name IS NULL OR person.name = ''))"
    );
    assert_eq!(
        where_of(Criterion::is_not_empty("name")),
        "((person.name IS NOT NULL AND person.name <> ''))"
    );
}

#[test]
fn test_collection_emptiness() {
    let query = ansi()
        .build_query(&QueryModel::from("Person").filter(Criterion::is_empty("pets")))
        .unwrap()
        .query;
    assert_eq!(
        query,
        "SELECT person.* FROM person AS person WHERE \
         (NOT EXISTS (SELECT 1 FROM pet pet_1 WHERE pet_1.owner_id = person.id))"
    );
    validate_sql(&query, Dialect::Ansi).unwrap();

    assert_eq!(
        where_of(Criterion::is_not_empty("roles")),
        "(EXISTS (SELECT 1 FROM person_roles person_roles_1 WHERE person_roles_1.person_id = person.id))"
    );
}

#[test]
fn test_emptiness_rejects_scalars() {
    let model = QueryModel::from("Person").filter(Criterion::is_empty("age"));
    let err = ansi().build_query(&model).unwrap_err();
    assert!(matches!(err, BuildError::InvalidCriterion(_)));
}

// ============================================================================
// Identity and property comparisons
// ============================================================================

#[test]
fn test_id_equals() {
    assert_eq!(where_of(Criterion::id_eq(param("id"))), "(person.id = :p1)");

    let model = QueryModel::from("Enrollment").filter(Criterion::id_eq(param("id")));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT enrollment.* FROM enrollment AS enrollment \
         WHERE ((enrollment.student_id = :p1 AND enrollment.course_id = :p2))"
    );
    assert_eq!(
        binding_paths(&result),
        vec![
            ("p1".to_string(), "studentId".to_string()),
            ("p2".to_string(), "courseId".to_string())
        ]
    );
}

#[test]
fn test_id_equals_without_identity() {
    let model = QueryModel::from("Address").filter(Criterion::id_eq(param("id")));
    let err = ansi().build_query(&model).unwrap_err();
    assert_eq!(err, BuildError::MissingIdentity("Address".into()));
}

#[test]
fn test_property_comparisons() {
    assert_eq!(
        where_of(Criterion::eq_property("name", "address.city")),
        "(person.name = person.address_city)"
    );
    assert_eq!(
        where_of(Criterion::gt_property("age", "version")),
        "(person.age > person.version)"
    );
    assert_eq!(
        where_of(Criterion::lte_property("age", "version")),
        "(person.age <= person.version)"
    );
}

// ============================================================================
// Junctions
// ============================================================================

#[test]
fn test_nested_junctions() {
    let model = QueryModel::from("Person")
        .filter(Criterion::or(vec![
            Criterion::eq("name", param("name")),
            Criterion::eq("age", param("age")),
        ]))
        .filter(Criterion::is_true("active"));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person \
         WHERE ((person.name = :p1 OR person.age = :p2) AND person.active = TRUE)"
    );
}

#[test]
fn test_negation() {
    assert_eq!(
        where_of(Criterion::not(vec![
            Criterion::eq("name", param("name")),
            Criterion::gt("age", param("age")),
        ])),
        "(NOT (person.name = :p1 AND person.age > :p2))"
    );

    let model = QueryModel::from("Person")
        .junction(JunctionKind::Not)
        .filter(Criterion::eq("name", param("name")));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE NOT (person.name = :p1)"
    );
}

#[test]
fn test_empty_junctions_leave_no_operator() {
    let model = QueryModel::from("Person")
        .filter(Criterion::and(vec![]))
        .filter(Criterion::eq("name", param("name")))
        .filter(Criterion::or(vec![]));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.name = :p1)"
    );

    let model = QueryModel::from("Person").filter(Criterion::not(vec![]));
    let result = ansi().build_query(&model).unwrap();
    assert_eq!(result.query, "SELECT person.* FROM person AS person");
}

// ============================================================================
// Custom criteria
// ============================================================================

#[derive(Debug)]
struct JsonContains;

impl CriterionHandler for JsonContains {
    fn render(&self, column: &str, placeholder: Option<&str>) -> String {
        format!("{} @> {}", column, placeholder.unwrap_or("'{}'"))
    }
}

#[test]
fn test_custom_criterion_uses_handler() {
    let builder = SqlQueryBuilder::new(registry(), Dialect::Postgres)
        .register_handler("json_contains", JsonContains);
    let model = QueryModel::from("Person")
        .filter(Criterion::eq("age", param("age")))
        .filter(Criterion::custom("json_contains", "name", Some(param("doc"))));
    let result = builder.build_query(&model).unwrap();
    assert_eq!(
        result.query,
        "SELECT person.* FROM person AS person WHERE (person.age = $1 AND person.name @> $2)"
    );
    assert_eq!(result.bindings[1].parameter_name.as_deref(), Some("doc"));
}

#[test]
fn test_unregistered_custom_criterion() {
    let model =
        QueryModel::from("Person").filter(Criterion::custom("json_contains", "name", None));
    let err = ansi().build_query(&model).unwrap_err();
    assert_eq!(err, BuildError::UnsupportedCriterion("json_contains".into()));
}

#[test]
fn test_version_match_outside_mutation_is_plain() {
    let model = QueryModel::from("Person").filter(Criterion::eq("version", param("v")));
    let result = ansi().build_query(&model).unwrap();
    assert!(!result.bindings[0].requires_previous_populated_value);
}
