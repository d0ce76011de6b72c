use async_trait::async_trait;
use serde_json::Value;

use crate::{error::StoreError, session::Session};
use storemap_proto::{Row, Table};

/// Equality match on a single named column
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self { Self { column: column.into(), value: value.into() } }

    /// A row without the column never matches
    pub fn matches(&self, row: &Row) -> bool { row.get(&self.column) == Some(&self.value) }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Columns {
    #[default]
    All,
    Only(Vec<String>),
}

impl Columns {
    /// Project a full row down to the selected columns
    pub fn project(&self, row: &Row) -> Row {
        match self {
            Columns::All => row.clone(),
            Columns::Only(columns) => columns.iter().filter_map(|column| row.get(column).map(|value| (column.clone(), value.clone()))).collect(),
        }
    }
}

/// A `select` against one table: optional projection, optional equality filter, optional ascending order
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: Table,
    pub columns: Columns,
    pub filter: Option<Filter>,
    pub order_by: Option<String>,
}

impl Select {
    pub fn from(table: Table) -> Self { Self { table, columns: Columns::All, filter: None, order_by: None } }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Columns::Only(columns.iter().map(|column| column.to_string()).collect());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }
}

/// The row-oriented persistence service the directory is built on.
///
/// Implementations own translation of backend failures into [`StoreError`] with a closed
/// [`ErrorKind`](crate::error::ErrorKind). A store enforcing row-level policies may accept an
/// `update` or `delete` and silently affect zero rows; callers detect that with a verify-read.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError>;

    /// Insert one row, returning the created row(s)
    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError>;

    /// Apply `changes` to every row matching `filter`, returning the rows that were updated
    async fn update(&self, table: Table, filter: &Filter, changes: Row) -> Result<Vec<Row>, StoreError>;

    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), StoreError>;

    /// Requests from here on act for `session`, or for a signed-out visitor when `None`
    fn set_session(&self, _session: Option<&Session>) {}
}
