//! Naming strategies mapping entity and property names to SQL identifiers.

use inflector::Inflector;
use serde::{Deserialize, Serialize};

/// How unmapped entity and property names become table and column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// `PersonDetail` → `person_detail`, `dateCreated` → `date_created`.
    #[default]
    UnderScoreSeparatedLowerCase,
    /// `PersonDetail` → `PERSON_DETAIL`.
    UnderScoreSeparatedUpperCase,
    /// Names are used as declared.
    Raw,
}

impl NamingStrategy {
    /// Map a declared name to an identifier.
    pub fn map_name(&self, name: &str) -> String {
        match self {
            NamingStrategy::UnderScoreSeparatedLowerCase => name.to_snake_case(),
            NamingStrategy::UnderScoreSeparatedUpperCase => name.to_screaming_snake_case(),
            NamingStrategy::Raw => name.to_string(),
        }
    }
}

/// Strip any module or package qualifier from a type name.
///
/// `app::model::Person` and `com.example.Person` both yield `Person`.
pub fn simple_name(qualified: &str) -> &str {
    let after_path = qualified.rsplit("::").next().unwrap_or(qualified);
    after_path.rsplit('.').next().unwrap_or(after_path)
}

/// The decapitalized simple type name, used as the default query alias.
pub fn decapitalize(name: &str) -> String {
    let simple = simple_name(name);
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
