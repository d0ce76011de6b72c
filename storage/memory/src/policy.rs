use std::sync::{PoisonError, RwLock};

use storemap_core::session::Session;
use storemap_proto::{Row, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

/// What a policy decides for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Fail the whole request with an insufficient privilege error
    Deny,
    /// Treat the row as if it did not exist. Updates and deletes on it succeed and change nothing.
    Hide,
}

/// Row-level security for [`MemoryStore`](crate::MemoryStore).
///
/// Checked for every row a request touches. For inserts the row is the one being inserted,
/// for updates it is the row before the change.
pub trait RowPolicy: Send + Sync {
    fn check(&self, operation: Operation, table: Table, row: &Row) -> Access;

    /// Called when the store switches identity; policies that depend on the caller track it here
    fn set_session(&self, _session: Option<&Session>) {}
}

impl<F> RowPolicy for F
where F: Fn(Operation, Table, &Row) -> Access + Send + Sync
{
    fn check(&self, operation: Operation, table: Table, row: &Row) -> Access { self(operation, table, row) }
}

/// Everything is allowed
pub struct Permissive;

impl RowPolicy for Permissive {
    fn check(&self, _operation: Operation, _table: Table, _row: &Row) -> Access { Access::Allow }
}

/// A signed-out visitor: may read the directory, sees no permissions, changes nothing
pub struct Anonymous;

impl RowPolicy for Anonymous {
    fn check(&self, operation: Operation, table: Table, _row: &Row) -> Access {
        match (operation, table) {
            (_, Table::Permissions) => Access::Hide,
            (Operation::Select, _) => Access::Allow,
            (Operation::Insert, _) => Access::Deny,
            (Operation::Update | Operation::Delete, _) => Access::Hide,
        }
    }
}

/// A signed-in user without admin rights sees the same as [`Anonymous`]
pub type ReadOnly = Anonymous;

/// Named users may do anything; everyone else, signed in or not, gets [`Anonymous`]
pub struct Admins {
    admins: Vec<String>,
    current: RwLock<Option<String>>,
}

impl Admins {
    pub fn new<S: Into<String>>(admins: impl IntoIterator<Item = S>) -> Self {
        Self { admins: admins.into_iter().map(Into::into).collect(), current: RwLock::new(None) }
    }

    fn signed_in_admin(&self) -> bool {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().is_some_and(|user| self.admins.contains(user))
    }
}

impl RowPolicy for Admins {
    fn check(&self, operation: Operation, table: Table, row: &Row) -> Access {
        if self.signed_in_admin() {
            Access::Allow
        } else {
            Anonymous.check(operation, table, row)
        }
    }

    fn set_session(&self, session: Option<&Session>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session.map(|session| session.user.id.clone());
    }
}
