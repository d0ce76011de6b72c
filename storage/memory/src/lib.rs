//! An in-process [`RemoteStore`] for storemap.
//!
//! Rows live in memory as JSON objects. A [`RowPolicy`] stands in for row-level security:
//! it can deny a request outright (`42501`) or hide rows so that updates and deletes quietly
//! affect nothing. Every request is recorded in a journal, and faults can be queued to fail
//! the next matching request.

mod policy;

pub use policy::{Access, Admins, Anonymous, Operation, Permissive, ReadOnly, RowPolicy};

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use storemap_core::{session::Session, Filter, RemoteStore, Select, StoreError};
use storemap_proto::{Row, Table};

/// One request as the store received it
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: Operation,
    pub table: Table,
    pub filter: Option<Filter>,
}

struct Fault {
    operation: Operation,
    table: Table,
    error: StoreError,
}

pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    policy: RwLock<Arc<dyn RowPolicy>>,
    calls: Mutex<Vec<Call>>,
    faults: Mutex<VecDeque<Fault>>,
    session: RwLock<Option<Session>>,
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new() }
}

impl MemoryStore {
    pub fn new() -> Self { Self::with_policy(Permissive) }

    pub fn with_policy(policy: impl RowPolicy + 'static) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            policy: RwLock::new(Arc::new(policy)),
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(VecDeque::new()),
            session: RwLock::new(None),
        }
    }

    /// Replace the policy; it is told the current session straight away
    pub fn set_policy(&self, policy: impl RowPolicy + 'static) {
        policy.set_session(self.session().as_ref());
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(policy)
    }

    /// The session the last [`RemoteStore::set_session`] switched to
    pub fn session(&self) -> Option<Session> { self.session.read().unwrap_or_else(PoisonError::into_inner).clone() }

    fn policy(&self) -> Arc<dyn RowPolicy> { self.policy.read().unwrap_or_else(PoisonError::into_inner).clone() }

    /// Insert rows directly, bypassing policy and the journal
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Row>) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let existing = tables.entry(table).or_default();
        for row in rows {
            existing.push(with_defaults(table, row));
        }
    }

    /// Raw contents of `table`, bypassing policy
    pub fn rows(&self, table: Table) -> Vec<Row> { self.tables.read().unwrap_or_else(PoisonError::into_inner).get(&table).cloned().unwrap_or_default() }

    /// Fail the next `operation` on `table` with `error`
    pub fn fail_next(&self, operation: Operation, table: Table, error: StoreError) {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).push_back(Fault { operation, table, error });
    }

    pub fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone() }

    pub fn clear_calls(&self) { self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear() }

    fn record(&self, operation: Operation, table: Table, filter: Option<&Filter>) -> Result<(), StoreError> {
        debug!("MemoryStore.{operation:?}({table}): {filter:?}");
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(Call { operation, table, filter: filter.cloned() });

        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        let position = faults.iter().position(|fault| fault.operation == operation && fault.table == table);
        match position.and_then(|index| faults.remove(index)) {
            Some(fault) => Err(fault.error),
            None => Ok(()),
        }
    }

    /// Policy decision for each row of `table` matching `filter`; `Err` on any deny
    fn visible(&self, operation: Operation, table: Table, rows: &[Row], filter: Option<&Filter>) -> Result<Vec<usize>, StoreError> {
        let policy = self.policy();
        let mut visible = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            if filter.is_some_and(|filter| !filter.matches(row)) {
                continue;
            }
            match policy.check(operation, table, row) {
                Access::Allow => visible.push(index),
                Access::Hide => {}
                Access::Deny => return Err(denied(table)),
            }
        }
        Ok(visible)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        self.record(Operation::Select, query.table, query.filter.as_ref())?;

        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.get(&query.table).map(Vec::as_slice).unwrap_or_default();
        let mut found: Vec<Row> =
            self.visible(Operation::Select, query.table, rows, query.filter.as_ref())?.into_iter().map(|index| rows[index].clone()).collect();

        if let Some(column) = &query.order_by {
            found.sort_by(|a, b| compare(a.get(column), b.get(column)));
        }
        Ok(found.iter().map(|row| query.columns.project(row)).collect())
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError> {
        self.record(Operation::Insert, table, None)?;

        let row = with_defaults(table, row);
        match self.policy().check(Operation::Insert, table, &row) {
            Access::Allow => {}
            Access::Deny | Access::Hide => return Err(denied(table)),
        }
        self.tables.write().unwrap_or_else(PoisonError::into_inner).entry(table).or_default().push(row.clone());
        Ok(vec![row])
    }

    async fn update(&self, table: Table, filter: &Filter, changes: Row) -> Result<Vec<Row>, StoreError> {
        self.record(Operation::Update, table, Some(filter))?;

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.entry(table).or_default();
        let mut updated = Vec::new();
        for index in self.visible(Operation::Update, table, rows, Some(filter))? {
            let row = &mut rows[index];
            for (column, value) in &changes {
                row.insert(column.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), StoreError> {
        self.record(Operation::Delete, table, Some(filter))?;

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.entry(table).or_default();
        let doomed = self.visible(Operation::Delete, table, rows, Some(filter))?;
        let mut index = 0;
        rows.retain(|_| {
            let keep = !doomed.contains(&index);
            index += 1;
            keep
        });
        Ok(())
    }

    fn set_session(&self, session: Option<&Session>) {
        debug!("MemoryStore.set_session: {:?}", session.map(|session| &session.user.id));
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session.cloned();
        self.policy().set_session(session);
    }
}

fn denied(table: Table) -> StoreError {
    StoreError::insufficient_privilege(format!("new row violates row-level security policy for table \"{table}\""))
}

/// Fill the columns the schema would default
fn with_defaults(table: Table, mut row: Row) -> Row {
    row.entry("id").or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    let defaults = match table {
        Table::Storefronts => vec![("title", Value::String(String::new())), ("description", Value::Null), ("category", Value::Null), ("published", Value::Bool(false))],
        Table::Categories => vec![("title", Value::Null), ("is_general", Value::Bool(false)), ("icon", Value::Null)],
        Table::Images => vec![("image_url", Value::Null), ("description", Value::Null), ("credits", Value::Null)],
        Table::Permissions => vec![],
    };
    for (column, value) in defaults {
        row.entry(column).or_insert(value);
    }
    row
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.as_f64().partial_cmp(&b.as_f64()).unwrap_or(Ordering::Equal),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        // nulls last, as in postgres ascending order
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
