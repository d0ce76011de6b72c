//! Postgres adapter for storemap.
//!
//! Each request runs in its own transaction. When a session role or JWT claims are set they
//! are applied with `SET LOCAL`, so row-level security policies see the caller and not the
//! pool's login user. The claims follow [`RemoteStore::set_session`]; the role is fixed.

pub mod sql_builder;

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bb8_postgres::{tokio_postgres::NoTls, PostgresConnectionManager};
use serde_json::{json, Value};
use tokio_postgres::types::ToSql;
use tracing::{debug, info};

use storemap_core::{session::Session, ClientConfig, Filter, RemoteStore, Select, StoreError};
use storemap_proto::{sane_name, Row, Table};

pub type Pool = bb8::Pool<PostgresConnectionManager<NoTls>>;

#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
    role: Option<String>,
    claims: Arc<RwLock<Option<Value>>>,
}

impl PostgresStore {
    pub fn new(pool: Pool) -> Self { Self { pool, role: None, claims: Arc::new(RwLock::new(None)) } }

    pub async fn connect(config: &ClientConfig) -> Result<Self, StoreError> {
        let manager = PostgresConnectionManager::new_from_stringlike(config.database_url.as_str(), NoTls).map_err(|err| store_error(&err))?;
        let pool = bb8::Pool::builder().max_size(config.pool_size).build(manager).await.map_err(|err| store_error(&err))?;
        info!("PostgresStore.connect: pool of {}", config.pool_size);

        let store = Self::new(pool);
        match &config.session_role {
            Some(role) => store.with_role(role),
            None => Ok(store),
        }
    }

    /// Run every request as `role`
    pub fn with_role(mut self, role: &str) -> Result<Self, StoreError> {
        if !sane_name(role) {
            return Err(StoreError::invalid_request(format!("invalid role name {role:?}")));
        }
        self.role = Some(role.to_owned());
        Ok(self)
    }

    /// Expose `claims` to policies as `current_setting('request.jwt.claims')`
    pub fn with_claims(mut self, claims: Value) -> Self {
        self.claims = Arc::new(RwLock::new(Some(claims)));
        self
    }

    /// Claims for a signed-in session
    pub fn with_session(self, session: &Session) -> Self { self.with_claims(session_claims(session)) }

    pub fn pool(&self) -> &Pool { &self.pool }

    /// Claims sent with the next request
    pub fn claims(&self) -> Option<Value> { self.claims.read().unwrap_or_else(PoisonError::into_inner).clone() }

    async fn query(&self, operation: &str, (sql, args): (String, Vec<Value>)) -> Result<Vec<Row>, StoreError> {
        debug!("PostgresStore.{operation}: {sql} with args: {args:?}");
        let claims = self.claims();

        let mut client = self.pool.get().await.map_err(pool_error)?;
        let transaction = client.transaction().await.map_err(|err| store_error(&err))?;

        if let Some(role) = &self.role {
            transaction.batch_execute(&format!(r#"SET LOCAL ROLE "{role}""#)).await.map_err(|err| store_error(&err))?;
        }
        if let Some(claims) = &claims {
            transaction.execute("SELECT set_config('request.jwt.claims', $1, true)", &[&claims.to_string()]).await.map_err(|err| store_error(&err))?;
        }

        let params: Vec<&(dyn ToSql + Sync)> = args.iter().map(|arg| arg as &(dyn ToSql + Sync)).collect();
        let rows = transaction.query(&sql, &params).await.map_err(|err| store_error(&err))?;
        transaction.commit().await.map_err(|err| store_error(&err))?;

        rows.into_iter()
            .map(|row| match row.try_get::<_, Value>(0) {
                Ok(Value::Object(row)) => Ok(row),
                Ok(other) => Err(StoreError::decode(format!("expected a json object, got {other}"))),
                Err(err) => Err(StoreError::decode(err)),
            })
            .collect()
    }
}

#[async_trait]
impl RemoteStore for PostgresStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> { self.query("select", sql_builder::select(query)?).await }

    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError> { self.query("insert", sql_builder::insert(table, row)?).await }

    async fn update(&self, table: Table, filter: &Filter, changes: Row) -> Result<Vec<Row>, StoreError> {
        self.query("update", sql_builder::update(table, filter, changes)?).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), StoreError> {
        self.query("delete", sql_builder::delete(table, filter)?).await?;
        Ok(())
    }

    fn set_session(&self, session: Option<&Session>) {
        info!("PostgresStore.set_session: signed_in={}", session.is_some());
        *self.claims.write().unwrap_or_else(PoisonError::into_inner) = session.map(session_claims);
    }
}

fn session_claims(session: &Session) -> Value { json!({ "sub": session.user.id, "email": session.user.email, "role": "authenticated" }) }

/// Map a driver error to a [`StoreError`], keeping the SQLSTATE when the server sent one
pub fn store_error(err: &tokio_postgres::Error) -> StoreError {
    match (err.code(), err.as_db_error()) {
        (Some(code), Some(db_error)) => StoreError::from_code(Some(code.code().to_owned()), db_error.message()),
        (Some(code), None) => StoreError::from_code(Some(code.code().to_owned()), err.to_string()),
        (None, _) => StoreError::connection(err),
    }
}

fn pool_error(err: bb8::RunError<tokio_postgres::Error>) -> StoreError {
    match err {
        bb8::RunError::User(err) => store_error(&err),
        bb8::RunError::TimedOut => StoreError::connection("timed out waiting for a pooled connection"),
    }
}
