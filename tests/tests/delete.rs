mod common;
use anyhow::Result;
use common::*;

use storemap_core::{Failure, StoreError, ToastKind};
use storemap_proto::Table;
use storemap_storage_memory::Operation;

/// Delete, confirm, then exactly one full refresh
#[tokio::test]
async fn test_confirmed_delete_refreshes_once() -> Result<()> {
    let h = Harness::new().loaded().await;

    h.directory.coordinator().apply_delete(h.mill.id).await?;
    assert_eq!(
        h.calls(),
        vec![
            (Operation::Delete, Table::Storefronts),
            (Operation::Select, Table::Storefronts),
            (Operation::Select, Table::Storefronts),
            (Operation::Select, Table::Categories),
        ]
    );
    let calls = h.store.calls();
    assert!(calls[1].filter.is_some(), "confirmation is filtered by id");
    assert!(calls[2].filter.is_none(), "refresh selects everything");

    assert!(h.directory.cache().storefront(h.mill.id).is_none());
    assert_eq!(h.messages(), vec!["Deleting storefront Mill", "Deleted storefront Mill"]);
    assert!(!h.directory.cache().is_loading());
    Ok(())
}

/// The delete was accepted but the row survived; no refresh and the cache is untouched
#[tokio::test]
async fn test_surviving_row_is_a_failure() -> Result<()> {
    let h = Harness::with_policy(hide_storefront_writes).loaded().await;
    let before = h.directory.cache().listing();

    let err = h.directory.coordinator().apply_delete(h.mill.id).await.unwrap_err();
    assert_eq!(err, Failure::DeleteNotApplied);
    assert_eq!(h.calls(), vec![(Operation::Delete, Table::Storefronts), (Operation::Select, Table::Storefronts)]);
    assert_eq!(h.directory.cache().listing(), before);

    let history = h.toasts.history();
    assert_eq!(history.last().map(|toast| (toast.kind, toast.message.as_str())), Some((ToastKind::Error, "Could not delete storefront, may not be allowed to.")));
    Ok(())
}

#[tokio::test]
async fn test_delete_error_is_normalized() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.store.fail_next(Operation::Delete, Table::Storefronts, StoreError::insufficient_privilege("permission denied"));

    assert_eq!(h.directory.coordinator().apply_delete(h.mill.id).await.unwrap_err(), Failure::InsufficientPermissions);
    assert_eq!(h.calls(), vec![(Operation::Delete, Table::Storefronts)]);
    assert!(h.directory.cache().storefront(h.mill.id).is_some());
    assert_eq!(h.messages(), vec!["Deleting storefront Mill", "Insufficient permissions."]);
    Ok(())
}

#[tokio::test]
async fn test_failed_confirmation_is_a_failure() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.store.fail_next(Operation::Select, Table::Storefronts, StoreError::connection("timed out"));

    assert_eq!(h.directory.coordinator().apply_delete(h.mill.id).await.unwrap_err(), Failure::Unknown);
    assert_eq!(h.calls().len(), 2);
    assert!(h.directory.cache().storefront(h.mill.id).is_some());
    Ok(())
}

/// The delete itself succeeded, so a failed follow-up refresh only shows up as the listing error
#[tokio::test]
async fn test_refresh_failure_after_delete() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.store.fail_next(Operation::Select, Table::Categories, StoreError::connection("reset"));

    h.directory.coordinator().apply_delete(h.mill.id).await?;
    assert!(h.directory.cache().storefront(h.mill.id).is_some(), "stale listing is kept");
    assert!(h.directory.cache().error().is_some());
    assert_eq!(h.messages().last().map(String::as_str), Some("Deleted storefront Mill"));
    Ok(())
}
