use serde_json::Value;
use thiserror::Error;

use storemap_core::{Columns, Filter, Select, StoreError};
use storemap_proto::{sane_name, Row, Table};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqlGenerationError {
    #[error("Refusing to interpolate identifier: {0:?}")]
    InsaneIdentifier(String),
    #[error("Update with no columns")]
    EmptyUpdate,
}

impl From<SqlGenerationError> for StoreError {
    fn from(err: SqlGenerationError) -> Self { StoreError::invalid_request(err) }
}

pub enum SqlExpr {
    Sql(String),
    Argument(Value),
}

/// Accumulates SQL text and json arguments, numbering placeholders on build
#[derive(Default)]
pub struct SqlBuilder {
    expressions: Vec<SqlExpr>,
}

impl SqlBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, expr: SqlExpr) { self.expressions.push(expr); }

    pub fn arg(&mut self, arg: Value) { self.push(SqlExpr::Argument(arg)); }

    pub fn sql(&mut self, s: impl AsRef<str>) { self.push(SqlExpr::Sql(s.as_ref().to_owned())); }

    /// Append a double-quoted identifier
    pub fn ident(&mut self, name: &str) -> Result<(), SqlGenerationError> {
        self.sql(quote(name)?);
        Ok(())
    }

    pub fn build(self) -> (String, Vec<Value>) {
        let mut counter = 1;
        let mut sql = String::new();
        let mut args = Vec::new();
        for expr in self.expressions {
            match expr {
                SqlExpr::Argument(arg) => {
                    sql += &format!("${}", counter);
                    args.push(arg);
                    counter += 1;
                }
                SqlExpr::Sql(s) => sql += &s,
            }
        }
        (sql, args)
    }

    /// `WHERE t."column" = (jsonb_populate_record(NULL::"table", $n))."column"`
    ///
    /// The json value is cast to the column's own type, leaving the column bare for its index.
    fn filter(&mut self, table: Table, filter: &Filter) -> Result<(), SqlGenerationError> {
        let column = quote(&filter.column)?;
        self.sql(format!(" WHERE t.{column} = (jsonb_populate_record(NULL::"));
        self.ident(table.name())?;
        self.sql(", ");
        let mut value = Row::new();
        value.insert(filter.column.clone(), filter.value.clone());
        self.arg(Value::Object(value));
        self.sql(format!(")).{column}"));
        Ok(())
    }
}

fn quote(name: &str) -> Result<String, SqlGenerationError> {
    if !sane_name(name) {
        return Err(SqlGenerationError::InsaneIdentifier(name.to_owned()));
    }
    Ok(format!(r#""{name}""#))
}

fn column_list(row: &Row, prefix: &str) -> Result<String, SqlGenerationError> {
    let columns = row.keys().map(|column| quote(column).map(|quoted| format!("{prefix}{quoted}"))).collect::<Result<Vec<_>, _>>()?;
    Ok(columns.join(", "))
}

/// Every statement yields rows as a single jsonb column
pub fn select(query: &Select) -> Result<(String, Vec<Value>), SqlGenerationError> {
    let mut sql = SqlBuilder::new();
    match &query.columns {
        Columns::All => sql.sql("SELECT to_jsonb(t)"),
        Columns::Only(columns) => {
            let pairs = columns.iter().map(|column| quote(column).map(|quoted| format!("'{column}', t.{quoted}"))).collect::<Result<Vec<_>, _>>()?;
            sql.sql(format!("SELECT jsonb_build_object({})", pairs.join(", ")));
        }
    }
    sql.sql(" FROM ");
    sql.ident(query.table.name())?;
    sql.sql(" AS t");
    if let Some(filter) = &query.filter {
        sql.filter(query.table, filter)?;
    }
    if let Some(column) = &query.order_by {
        sql.sql(" ORDER BY t.");
        sql.ident(column)?;
    }
    Ok(sql.build())
}

/// Columns missing from `row` get their schema defaults
pub fn insert(table: Table, row: Row) -> Result<(String, Vec<Value>), SqlGenerationError> {
    let mut sql = SqlBuilder::new();
    sql.sql("INSERT INTO ");
    sql.ident(table.name())?;
    if row.is_empty() {
        sql.sql(" AS t DEFAULT VALUES RETURNING to_jsonb(t)");
        return Ok(sql.build());
    }

    sql.sql(format!(" AS t ({}) SELECT {} FROM jsonb_populate_record(NULL::", column_list(&row, "")?, column_list(&row, "r.")?));
    sql.ident(table.name())?;
    sql.sql(", ");
    sql.arg(Value::Object(row));
    sql.sql(") AS r RETURNING to_jsonb(t)");
    Ok(sql.build())
}

pub fn update(table: Table, filter: &Filter, changes: Row) -> Result<(String, Vec<Value>), SqlGenerationError> {
    if changes.is_empty() {
        return Err(SqlGenerationError::EmptyUpdate);
    }
    let assignments = changes.keys().map(|column| quote(column).map(|quoted| format!("{quoted} = r.{quoted}"))).collect::<Result<Vec<_>, _>>()?;

    let mut sql = SqlBuilder::new();
    sql.sql("UPDATE ");
    sql.ident(table.name())?;
    sql.sql(format!(" AS t SET {} FROM jsonb_populate_record(NULL::", assignments.join(", ")));
    sql.ident(table.name())?;
    sql.sql(", ");
    sql.arg(Value::Object(changes));
    sql.sql(") AS r");
    sql.filter(table, filter)?;
    sql.sql(" RETURNING to_jsonb(t)");
    Ok(sql.build())
}

pub fn delete(table: Table, filter: &Filter) -> Result<(String, Vec<Value>), SqlGenerationError> {
    let mut sql = SqlBuilder::new();
    sql.sql("DELETE FROM ");
    sql.ident(table.name())?;
    sql.sql(" AS t");
    sql.filter(table, filter)?;
    Ok(sql.build())
}
