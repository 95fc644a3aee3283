//! Join types and declared joins.

use serde::{Deserialize, Serialize};

/// How an association is joined.
///
/// `*Fetch` variants additionally select the joined entity's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    /// Plain `JOIN`.
    #[default]
    Default,
    Inner,
    Left,
    LeftFetch,
    Right,
    RightFetch,
    Fetch,
    Outer,
}

impl JoinType {
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            JoinType::Fetch | JoinType::LeftFetch | JoinType::RightFetch
        )
    }
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JoinType::Default => "DEFAULT",
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::LeftFetch => "LEFT_FETCH",
            JoinType::Right => "RIGHT",
            JoinType::RightFetch => "RIGHT_FETCH",
            JoinType::Fetch => "FETCH",
            JoinType::Outer => "OUTER",
        };
        f.write_str(name)
    }
}

/// An association path joined with a specific join type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Dotted association path from the root entity.
    pub path: String,
    #[serde(default, rename = "type")]
    pub join_type: JoinType,
}
