mod common;
use anyhow::Result;
use common::*;

use storemap_core::{CacheView, StoreError};
use storemap_proto::Table;
use storemap_storage_memory::Operation;

#[tokio::test]
async fn test_refresh_orders_by_id() -> Result<()> {
    let h = Harness::new();
    h.directory.refresher().refresh().await?;

    let listing = h.directory.cache().listing();
    let mut expected = vec![h.mill.id, h.forge.id];
    expected.sort();
    assert_eq!(listing.storefronts.iter().map(|storefront| storefront.id).collect::<Vec<_>>(), expected);
    assert_eq!(listing.categories, vec![h.general.clone()]);
    assert_eq!(h.calls(), vec![(Operation::Select, Table::Storefronts), (Operation::Select, Table::Categories)]);
    Ok(())
}

/// A failed refresh keeps the previous listing, records the error and always drops the loading flag
#[tokio::test]
async fn test_failed_refresh_keeps_listing() -> Result<()> {
    let h = Harness::new().loaded().await;
    let before = h.directory.cache().listing();
    let (_handle, views) = record_views(&h.directory);

    h.store.fail_next(Operation::Select, Table::Storefronts, StoreError::connection("connection refused"));
    let err = h.directory.refresher().refresh().await.unwrap_err();
    assert_eq!(err.message, "connection refused");

    let view = h.directory.cache().view();
    assert_eq!(view.listing, before);
    assert!(!view.loading);
    assert_eq!(view.error.as_ref().map(|err| err.message.as_str()), Some("connection refused"));

    let loading: Vec<bool> = views.lock().unwrap().iter().map(|view: &CacheView| view.loading).collect();
    assert_eq!(loading.first(), Some(&true));
    assert_eq!(loading.last(), Some(&false));
    Ok(())
}

/// Categories failing after storefronts succeeded still commits nothing
#[tokio::test]
async fn test_partial_refresh_commits_nothing() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.store.seed(Table::Storefronts, [row(&storefront("Kiln", &h.general, true))]);
    h.store.fail_next(Operation::Select, Table::Categories, StoreError::connection("reset"));

    assert!(h.directory.refresher().refresh().await.is_err());
    assert_eq!(h.directory.cache().listing().storefronts.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_successful_refresh_clears_error() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.store.fail_next(Operation::Select, Table::Storefronts, StoreError::connection("reset"));
    let _ = h.directory.refresher().refresh().await;
    assert!(h.directory.cache().error().is_some());

    h.directory.refresher().refresh().await?;
    assert!(h.directory.cache().error().is_none());
    Ok(())
}
