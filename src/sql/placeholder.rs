//! Parameter placeholder styles.

use serde::{Deserialize, Serialize};

/// How a bound parameter appears in SQL text.
///
/// Every binding is keyed `p<N>` regardless of style; the style only controls
/// the rendered placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `:p1`, `:p2`, ...
    #[default]
    Named,
    /// `?` - ordering is carried by the binding list.
    Positional,
    /// `$1`, `$2`, ...
    Numbered,
    /// `@p1`, `@p2`, ...
    AtNamed,
}

impl PlaceholderStyle {
    /// Binding key for the parameter at 1-based `position`.
    pub fn key(position: usize) -> String {
        format!("p{}", position)
    }

    /// Render the placeholder for the parameter at 1-based `position`.
    pub fn render(&self, position: usize) -> String {
        match self {
            PlaceholderStyle::Named => format!(":p{}", position),
            PlaceholderStyle::Positional => "?".to_string(),
            PlaceholderStyle::Numbered => format!("${}", position),
            PlaceholderStyle::AtNamed => format!("@p{}", position),
        }
    }
}
