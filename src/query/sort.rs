//! Sort order.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// A single ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub property: String,
    #[serde(default)]
    pub direction: SortDir,
    /// Compare with `lower(...)`.
    #[serde(default)]
    pub ignore_case: bool,
}

impl Order {
    pub fn asc(property: &str) -> Self {
        Self {
            property: property.into(),
            direction: SortDir::Asc,
            ignore_case: false,
        }
    }

    pub fn desc(property: &str) -> Self {
        Self {
            property: property.into(),
            direction: SortDir::Desc,
            ignore_case: false,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

/// Ordered list of sort entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sort {
    pub orders: Vec<Order>,
}

impl Sort {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn then(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }
}
