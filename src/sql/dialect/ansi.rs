//! ANSI SQL dialect - base reference implementation.
//!
//! This provides the ANSI SQL standard behavior and is the builder's default.
//! Identifiers are double-quoted, parameters use `:pN` named placeholders and
//! pagination uses `OFFSET ... ROWS FETCH FIRST ... ROWS ONLY`.

use super::super::token::TokenStream;

use super::helpers;
use super::SqlDialect;

/// ANSI SQL dialect (reference implementation).
#[derive(Debug, Clone, Copy)]
pub struct Ansi;

impl SqlDialect for Ansi {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_keyword(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_fetch_first(limit, offset)
    }

    fn supports_mutation_alias(&self) -> bool {
        true
    }
}
