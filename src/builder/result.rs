//! Compiled statements and their parameter bindings.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::DataType;
use crate::query::{Literal, QueryParameter};

/// Binds one placeholder of a compiled statement to its runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameterBinding {
    /// Bind key, `p1`, `p2`, ... in emission order.
    pub key: String,

    /// Placeholder text as it appears in the statement.
    pub placeholder: String,

    /// Association names followed by the property name.
    pub property_path: Vec<String>,

    pub data_type: DataType,

    /// Method argument position; `None` when the value is derived from the
    /// property path.
    pub parameter_index: Option<usize>,

    /// Name of the query parameter supplying the value.
    pub parameter_name: Option<String>,

    /// Literal value from the query model.
    pub value: Option<Literal>,

    /// The value is generated when the row is written (version, timestamps).
    pub auto_populated: bool,

    /// The previous value must be supplied as well (optimistic locking).
    pub requires_previous_populated_value: bool,

    /// The value is a collection to expand into one placeholder per element.
    pub expandable: bool,
}

impl QueryParameterBinding {
    pub(crate) fn new(property_path: Vec<String>, data_type: DataType) -> Self {
        Self {
            key: String::new(),
            placeholder: String::new(),
            property_path,
            data_type,
            parameter_index: None,
            parameter_name: None,
            value: None,
            auto_populated: false,
            requires_previous_populated_value: false,
            expandable: false,
        }
    }

    pub(crate) fn parameter(mut self, parameter: &QueryParameter) -> Self {
        self.parameter_name = Some(parameter.name.clone());
        self.parameter_index = parameter.index;
        self
    }

    pub(crate) fn value(mut self, value: Literal) -> Self {
        self.value = Some(value);
        self
    }

    pub(crate) fn expandable(mut self, expandable: bool) -> Self {
        self.expandable = expandable;
        self
    }

    pub(crate) fn auto_populated(mut self, auto_populated: bool) -> Self {
        self.auto_populated = auto_populated;
        self
    }

    /// Dotted property path, e.g. `department.name`.
    pub fn path(&self) -> String {
        self.property_path.join(".")
    }
}

/// The output of a build: SQL text plus everything needed to bind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,

    /// The SET clause of an UPDATE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,

    /// Bindings in placeholder order.
    pub bindings: Vec<QueryParameterBinding>,

    /// Association paths joined by the statement.
    pub join_paths: BTreeSet<String>,
}

impl QueryResult {
    /// Bind key to source: the parameter name when the value comes from a
    /// parameter, otherwise the dotted property path.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        self.bindings
            .iter()
            .map(|b| {
                let source = b.parameter_name.clone().unwrap_or_else(|| b.path());
                (b.key.clone(), source)
            })
            .collect()
    }

    pub fn binding(&self, key: &str) -> Option<&QueryParameterBinding> {
        self.bindings.iter().find(|b| b.key == key)
    }
}
