//! Property data types.

use serde::{Deserialize, Serialize};

/// The data type of a persistent property.
///
/// Carried through to parameter bindings so the executing layer knows how to
/// bind each value. `Entity` marks association-valued properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigDecimal,
    Character,
    String,
    Date,
    Time,
    Timestamp,
    Uuid,
    Json,
    ByteArray,
    Entity,
    #[default]
    Object,
}

impl DataType {
    /// Whether values of this type are textual (eligible for empty-string checks).
    pub fn is_textual(&self) -> bool {
        matches!(self, DataType::String | DataType::Character)
    }

    /// Whether this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Byte
                | DataType::Short
                | DataType::Integer
                | DataType::Long
                | DataType::Float
                | DataType::Double
                | DataType::BigDecimal
        )
    }
}
