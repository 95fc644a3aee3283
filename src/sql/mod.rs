//! SQL generation primitives.
//!
//! The query builder never concatenates dialect-specific text itself; it emits
//! [`Token`]s which the selected [`Dialect`] serializes.
//!
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations
//! - [`placeholder`] - Parameter placeholder styles

pub mod dialect;
pub mod placeholder;
pub mod token;


// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use placeholder::PlaceholderStyle;
pub use token::{Token, TokenStream};
