//! Page requests and the statements generated for them.

use serde::{Deserialize, Serialize};

use crate::builder::SqlInfo;

/// One ORDER BY item requested by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub column: String,
    pub asc: bool,
}

impl OrderItem {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            asc: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            asc: false,
        }
    }
}

/// A page request. `current` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub current: u64,
    pub size: u64,
    pub orders: Vec<OrderItem>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            current: 1,
            size: 10,
            orders: Vec::new(),
        }
    }
}

impl Page {
    pub fn new(current: u64, size: u64) -> Self {
        Self {
            current,
            size,
            orders: Vec::new(),
        }
    }

    /// Append an ORDER BY item.
    pub fn order(mut self, item: OrderItem) -> Self {
        self.orders.push(item);
        self
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        self.current.max(1).saturating_sub(1).saturating_mul(self.size)
    }

    /// Number of pages needed for `total` rows.
    pub fn pages(&self, total: u64) -> u64 {
        if self.size == 0 {
            return 0;
        }
        total.div_ceil(self.size)
    }
}

/// Statements for one page: the total count and the page's rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageStatements {
    pub count: SqlInfo,
    pub records: SqlInfo,
}
