//! Common utilities for Postgres storage tests

#![allow(dead_code)]

use anyhow::Result;
use bb8_postgres::PostgresConnectionManager;
use serde_json::json;
use std::str::FromStr;
use testcontainers::ContainerAsync;
use testcontainers_modules::{postgres, testcontainers::runners::AsyncRunner};
use tracing::Level;

use storemap_core::session::Session;
use storemap_proto::{CategoryId, StorefrontId};
use storemap_storage_postgres::{Pool, PostgresStore};

pub const ADMIN: &str = "admin-user";

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

pub struct Fixture {
    pub category: CategoryId,
    pub draft: StorefrontId,
    pub published: StorefrontId,
}

pub async fn create_postgres_container() -> Result<(ContainerAsync<postgres::Postgres>, Pool)> {
    let container: ContainerAsync<postgres::Postgres> = postgres::Postgres::default()
        .with_db_name("storemap")
        .with_user("postgres")
        .with_password("postgres")
        .with_init_sql(include_str!("../pg_init.sql").to_string().into_bytes())
        .start()
        .await?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let manager = PostgresConnectionManager::new_from_stringlike(
        format!("host={host} port={port} user=postgres password=postgres dbname=storemap"),
        tokio_postgres::NoTls,
    )?;
    let pool = bb8::Pool::builder().build(manager).await?;

    Ok((container, pool))
}

/// Seed as the superuser: one category, one published and one draft storefront, and an admin
pub async fn seed(pool: &Pool) -> Result<Fixture> {
    let fixture = Fixture { category: CategoryId::new(), draft: StorefrontId::new(), published: StorefrontId::new() };
    let client = pool.get().await?;
    let (category, draft, published) = (fixture.category.to_string(), fixture.draft.to_string(), fixture.published.to_string());
    let location = json!({"lat": 10.0, "lng": 20.0});

    client.execute("INSERT INTO storefront_categories (id, title, is_general) VALUES ($1::text::uuid, 'General', true)", &[&category]).await?;
    client
        .execute(
            "INSERT INTO storefronts (id, title, description, category, location, published) VALUES ($1::text::uuid, 'Mill', 'Flour', $2::text::uuid, $3, true)",
            &[&published, &category, &location],
        )
        .await?;
    client
        .execute(
            "INSERT INTO storefronts (id, title, description, category, location, published) VALUES ($1::text::uuid, 'Forge', 'Iron', $2::text::uuid, $3, false)",
            &[&draft, &category, &location],
        )
        .await?;
    client.execute("INSERT INTO permissions (user_id) VALUES ($1)", &[&ADMIN]).await?;
    Ok(fixture)
}

pub fn anonymous(pool: &Pool) -> Result<PostgresStore> { Ok(PostgresStore::new(pool.clone()).with_role("anon")?) }

pub fn session(user_id: &str) -> Session {
    serde_json::from_value(json!({"access_token": "token", "user": {"id": user_id, "identities": []}})).unwrap()
}

pub fn signed_in(pool: &Pool, user_id: &str) -> Result<PostgresStore> {
    Ok(PostgresStore::new(pool.clone()).with_role("authenticated")?.with_session(&session(user_id)))
}

pub fn admin(pool: &Pool) -> Result<PostgresStore> { signed_in(pool, ADMIN) }
