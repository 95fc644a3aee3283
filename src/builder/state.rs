//! Per-build compilation state.
//!
//! A [`QueryState`] lives for exactly one `build_*` call: it owns the
//! placeholder counter and the binding list. The logical position inside the
//! entity graph is a [`Context`] value handed down the recursion, so returning
//! from an association (normally or through `?`) always restores the caller's
//! alias and entity. Join bookkeeping is per SELECT level, in a [`Statement`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::model::{EntityRegistry, PersistentEntity};
use crate::query::{JoinSpec, JoinType};
use crate::sql::{Dialect, PlaceholderStyle, Token, TokenStream};

use super::path::ColumnRef;
use super::result::QueryParameterBinding;
use super::{CriterionHandler, SqlQueryBuilder};

/// What happens when a property path crosses an association that needs a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinMode {
    /// Emit the JOIN clause.
    Emit,
    /// Use the conventional join alias and record the path, emitting nothing.
    Reference,
    /// Fail; the statement cannot contain joins.
    Forbid(&'static str),
}

/// Where in the entity graph criteria and properties are being resolved.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    /// Table alias columns are qualified with.
    pub alias: String,
    /// Whether column references carry the alias.
    pub qualify: bool,
    pub entity: Arc<PersistentEntity>,
    /// Association names from the statement's root entity.
    pub path: Vec<String>,
    /// Column prefix inside embedded values.
    pub column_prefix: Option<String>,
}

impl Context {
    pub fn root(alias: String, entity: Arc<PersistentEntity>) -> Self {
        Self {
            alias,
            qualify: true,
            entity,
            path: Vec::new(),
            column_prefix: None,
        }
    }

    /// Column references are emitted without the alias.
    pub fn unqualified(mut self) -> Self {
        self.qualify = false;
        self
    }

    /// Column references carry the alias.
    pub fn qualified(mut self) -> Self {
        self.qualify = true;
        self
    }

    pub fn path_to(&self, name: &str) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(name.to_string());
        path
    }

    /// Dotted join path of an association reached from this context.
    pub fn join_key(&self, name: &str) -> String {
        self.path_to(name).join(".")
    }

    /// Apply the embedded column prefix, if any.
    pub fn prefixed(&self, column: String) -> String {
        match &self.column_prefix {
            Some(prefix) => format!("{}_{}", prefix, column),
            None => column,
        }
    }

    /// Descend into an embedded value stored in the same table.
    pub fn embedded(&self, name: &str, column: String, entity: Arc<PersistentEntity>) -> Self {
        Self {
            alias: self.alias.clone(),
            qualify: self.qualify,
            entity,
            path: self.path_to(name),
            column_prefix: Some(self.prefixed(column)),
        }
    }

    /// Descend into a joined association.
    pub fn joined(&self, name: &str, alias: String, entity: Arc<PersistentEntity>) -> Self {
        Self {
            alias,
            qualify: true,
            entity,
            path: self.path_to(name),
            column_prefix: None,
        }
    }
}

/// Join bookkeeping for one SELECT level (the main query or a subquery).
#[derive(Debug)]
pub(crate) struct Statement<'q> {
    pub root_alias: String,
    pub declared: &'q [JoinSpec],
    /// Rendered JOIN clauses, each starting with a space.
    pub joins: TokenStream,
    joined: HashMap<String, String>,
    /// Dotted association paths joined at this level.
    pub paths: BTreeSet<String>,
    /// Entities of FETCH joins, with their aliases.
    pub fetched: Vec<(Arc<PersistentEntity>, String)>,
}

impl<'q> Statement<'q> {
    pub fn new(root_alias: String, declared: &'q [JoinSpec]) -> Self {
        Self {
            root_alias,
            declared,
            joins: TokenStream::new(),
            joined: HashMap::new(),
            paths: BTreeSet::new(),
            fetched: Vec::new(),
        }
    }

    /// Declared join type for a path, `JoinType::Default` when undeclared.
    pub fn join_type(&self, path: &str) -> JoinType {
        self.declared
            .iter()
            .find(|j| j.path == path)
            .map(|j| j.join_type)
            .unwrap_or_default()
    }

    /// Conventional alias of a joined path: `<root>_<path with '_'>_`.
    pub fn join_alias(&self, path: &str) -> String {
        format!("{}_{}_", self.root_alias, path.replace('.', "_"))
    }

    pub fn joined_alias(&self, path: &str) -> Option<&str> {
        self.joined.get(path).map(String::as_str)
    }

    pub fn record(&mut self, path: String, alias: String) {
        self.paths.insert(path.clone());
        self.joined.insert(path, alias);
    }
}

/// Mutable state of a single build invocation.
pub(crate) struct QueryState<'b> {
    builder: &'b SqlQueryBuilder,
    pub mode: JoinMode,
    position: usize,
    subqueries: usize,
    /// Root context of each enclosing SELECT level, innermost last.
    scopes: Vec<Context>,
    bindings: Vec<QueryParameterBinding>,
}

impl<'b> QueryState<'b> {
    pub fn new(builder: &'b SqlQueryBuilder, mode: JoinMode) -> Self {
        Self {
            builder,
            mode,
            position: 0,
            subqueries: 0,
            scopes: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.builder.dialect
    }

    pub fn registry(&self) -> &'b EntityRegistry {
        &self.builder.registry
    }

    pub fn handler(&self, name: &str) -> Option<&'b dyn CriterionHandler> {
        self.builder.handlers.get(name).map(|h| h.as_ref())
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.builder.placeholder
    }

    /// Identifier token, quoted when identifier escaping is on.
    pub fn ident(&self, name: &str) -> Token {
        if self.builder.escape_identifiers {
            Token::Ident(name.to_string())
        } else {
            Token::Bare(name.to_string())
        }
    }

    /// `alias.column`, always qualified.
    pub fn qualified(&self, alias: &str, column: &str) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(self.ident(alias))
            .push(Token::Dot)
            .push(self.ident(column));
        ts
    }

    /// A column reference, qualified when its context asks for it.
    pub fn column_tokens(&self, column: &ColumnRef) -> TokenStream {
        if column.qualify {
            self.qualified(&column.alias, &column.column)
        } else {
            let mut ts = TokenStream::new();
            ts.push(self.ident(&column.column));
            ts
        }
    }

    /// Allocate the next placeholder for `binding` and record it.
    pub fn bind(&mut self, mut binding: QueryParameterBinding) -> Token {
        self.position += 1;
        binding.key = PlaceholderStyle::key(self.position);
        binding.placeholder = self.placeholder_style().render(self.position);
        let token = Token::Placeholder(binding.placeholder.clone());
        self.bindings.push(binding);
        token
    }

    pub fn last_binding_mut(&mut self) -> Option<&mut QueryParameterBinding> {
        self.bindings.last_mut()
    }

    /// Fresh alias for a subquery table: `<base>_<n>`.
    pub fn next_subquery_alias(&mut self, base: &str) -> String {
        self.subqueries += 1;
        format!("{}_{}", base, self.subqueries)
    }

    pub fn enter_scope(&mut self, ctx: &Context) {
        self.scopes.push(ctx.clone());
    }

    pub fn leave_scope(&mut self) {
        self.scopes.pop();
    }

    /// Root context of the level enclosing the current one.
    pub fn outer_scope(&self) -> Option<&Context> {
        self.scopes.iter().rev().nth(1)
    }

    pub fn into_bindings(self) -> Vec<QueryParameterBinding> {
        self.bindings
    }
}
