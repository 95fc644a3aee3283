//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! The query builder is dialect-agnostic; everything that varies between
//! databases goes through `SqlDialect`:
//!
//! - Naming: `table_name`, `column_name`
//! - Select-all and row-count rendering: `select_all_columns`, `append_row_count`
//! - Identifier quoting: `"` (ANSI/PG/DuckDB), `` ` `` (MySQL), `[]` (T-SQL)
//! - Placeholders: `:p1` (ANSI), `$1` (PG/DuckDB), `?` (MySQL), `@p1` (T-SQL)
//! - Pagination: FETCH FIRST vs LIMIT/OFFSET vs OFFSET FETCH
//! - Boolean literals: TRUE/true vs 1/0
//! - String concatenation for LIKE patterns: `||` vs `+` vs CONCAT()
//!
//! # Usage
//!
//! ```ignore
//! use entity_sql::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("user");  // "user"
//! ```

mod ansi;
mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod tsql;

pub use ansi::Ansi;
pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use tsql::TSql;

use serde::{Deserialize, Serialize};

use super::placeholder::PlaceholderStyle;
use super::token::{Token, TokenStream};
use crate::model::{PersistentEntity, PersistentProperty};

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Naming
    // =========================================================================

    /// Table name for an entity.
    fn table_name(&self, entity: &PersistentEntity) -> String {
        entity.table_name()
    }

    /// Column name for a property of an entity.
    fn column_name(&self, entity: &PersistentEntity, property: &PersistentProperty) -> String {
        entity.column_name(property)
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// Select every column of `entity` under `alias`.
    ///
    /// Default: `alias.*`.
    fn select_all_columns(&self, entity: &PersistentEntity, alias: &Token) -> TokenStream {
        let _ = entity;
        let mut ts = TokenStream::new();
        ts.push(alias.clone()).push(Token::Dot).push(Token::Star);
        ts
    }

    /// Append the row-count projection.
    ///
    /// Default: `COUNT(*)`.
    fn append_row_count(&self, ts: &mut TokenStream, alias: &Token) {
        let _ = alias;
        ts.push(Token::FunctionName("count".into()))
            .lparen()
            .push(Token::Star)
            .rparen();
    }

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    ///
    /// - ANSI/PostgreSQL/DuckDB: `"identifier"`
    /// - MySQL: `` `identifier` ``
    /// - T-SQL: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    ///
    /// - PostgreSQL/DuckDB: `true`/`false`
    /// - MySQL/T-SQL: `1`/`0`
    fn format_bool(&self, b: bool) -> &'static str;

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Placeholder style native to the dialect's drivers.
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Named
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    ///
    /// - PostgreSQL/DuckDB/MySQL: `LIMIT n OFFSET m` (default)
    /// - ANSI: `OFFSET m ROWS FETCH FIRST n ROWS ONLY`
    /// - T-SQL: `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    /// Whether this dialect requires ORDER BY for OFFSET/LIMIT.
    ///
    /// T-SQL requires ORDER BY when using OFFSET FETCH.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// String concatenation operator.
    ///
    /// - ANSI/PostgreSQL/DuckDB: `||`
    /// - T-SQL: `+`
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Whether this dialect supports the concat operator.
    ///
    /// MySQL uses `||` as logical OR by default and needs `CONCAT()`.
    fn supports_concat_operator(&self) -> bool {
        true
    }

    /// Condition testing a textual column for NULL or empty.
    ///
    /// Default: `(col IS NULL OR col = '')`, negated
    /// `(col IS NOT NULL AND col <> '')`.
    fn empty_text_condition(&self, column: &TokenStream, negated: bool) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.lparen().append(column).space();
        if negated {
            ts.push(Token::IsNotNull)
                .space()
                .push(Token::And)
                .space()
                .append(column)
                .space()
                .push(Token::Ne);
        } else {
            ts.push(Token::IsNull)
                .space()
                .push(Token::Or)
                .space()
                .append(column)
                .space()
                .push(Token::Eq);
        }
        ts.space().push(Token::LitString(String::new())).rparen();
        ts
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Whether this dialect supports FULL OUTER JOIN.
    fn supports_full_outer_join(&self) -> bool {
        true
    }

    /// Whether UPDATE and DELETE may alias the target table and qualify
    /// column references with that alias.
    fn supports_mutation_alias(&self) -> bool {
        false
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Ansi,
    Postgres,
    MySql,
    TSql,
    DuckDb,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Ansi => &Ansi,
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::TSql => &TSql,
            Dialect::DuckDb => &DuckDb,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn table_name(&self, entity: &PersistentEntity) -> String {
        self.dialect().table_name(entity)
    }

    fn column_name(&self, entity: &PersistentEntity, property: &PersistentProperty) -> String {
        self.dialect().column_name(entity, property)
    }

    fn select_all_columns(&self, entity: &PersistentEntity, alias: &Token) -> TokenStream {
        self.dialect().select_all_columns(entity, alias)
    }

    fn append_row_count(&self, ts: &mut TokenStream, alias: &Token) {
        self.dialect().append_row_count(ts, alias)
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        self.dialect().placeholder_style()
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.dialect().requires_order_by_for_offset()
    }

    fn concat_operator(&self) -> &'static str {
        self.dialect().concat_operator()
    }

    fn supports_concat_operator(&self) -> bool {
        self.dialect().supports_concat_operator()
    }

    fn empty_text_condition(&self, column: &TokenStream, negated: bool) -> TokenStream {
        self.dialect().empty_text_condition(column, negated)
    }

    fn supports_full_outer_join(&self) -> bool {
        self.dialect().supports_full_outer_join()
    }

    fn supports_mutation_alias(&self) -> bool {
        self.dialect().supports_mutation_alias()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ansi" => Ok(Dialect::Ansi),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "tsql" | "mssql" | "sqlserver" => Ok(Dialect::TSql),
            "duckdb" => Ok(Dialect::DuckDb),
            other => Err(format!("unknown dialect: {}", other)),
        }
    }
}
