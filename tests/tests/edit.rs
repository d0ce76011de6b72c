mod common;
use anyhow::Result;
use common::*;
use std::sync::Arc;

use storemap_core::{EditError, Failure, Outcome, RemoteStore, StoreError, StorefrontPatch, ToastKind, ValidationError};
use storemap_proto::Table;
use storemap_storage_memory::{MemoryStore, Operation};

/// A confirmed edit stays applied and issues exactly one update and one verify-read
#[tokio::test]
async fn test_applied_edit() -> Result<()> {
    let h = Harness::new().loaded().await;

    let outcome = h.directory.coordinator().apply_edit(h.mill.id, StorefrontPatch::new().title("Old Mill")).await?;
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(h.cached(h.mill.id).title, "Old Mill");
    assert_eq!(h.cached(h.mill.id).description, h.mill.description);
    assert_eq!(h.calls(), vec![(Operation::Update, Table::Storefronts), (Operation::Select, Table::Storefronts)]);
    assert!(h.messages().is_empty());
    Ok(())
}

/// The store accepts the update but changes nothing; the verify-read catches it
#[tokio::test]
async fn test_silent_reject_is_reverted() -> Result<()> {
    let h = Harness::with_policy(hide_storefront_writes).loaded().await;

    let outcome = h.directory.coordinator().apply_edit(h.mill.id, StorefrontPatch::new().title("Old Mill")).await?;
    assert_eq!(outcome, Outcome::Reverted { reason: Failure::EditNotApplied });
    assert_eq!(h.cached(h.mill.id), h.mill);
    assert_eq!(h.messages(), vec!["Unable to edit: Couldn't edit, may not have permissions."]);

    // no retry
    assert_eq!(h.calls().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_intent_makes_no_calls() -> Result<()> {
    let h = Harness::new().loaded().await;

    let err = h.directory.coordinator().apply_edit(h.mill.id, StorefrontPatch::new()).await.unwrap_err();
    assert_eq!(err, EditError::Invalid(ValidationError::EmptyIntent));
    assert_eq!(err.failure().to_string(), "Nothing has been changed for publishing.");
    assert!(h.calls().is_empty());
    assert_eq!(h.cached(h.mill.id), h.mill);
    Ok(())
}

#[tokio::test]
async fn test_insufficient_privilege_is_reported() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.store.fail_next(Operation::Update, Table::Storefronts, StoreError::insufficient_privilege("permission denied for table storefronts"));

    let outcome = h.directory.coordinator().apply_edit(h.mill.id, StorefrontPatch::new().description(None)).await?;
    assert_eq!(outcome, Outcome::Reverted { reason: Failure::InsufficientPermissions });
    assert_eq!(h.cached(h.mill.id), h.mill);
    assert_eq!(h.messages(), vec!["Unable to edit: Insufficient permissions."]);
    assert_eq!(h.calls(), vec![(Operation::Update, Table::Storefronts)]);
    Ok(())
}

#[tokio::test]
async fn test_other_store_errors_are_unknown() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.store.fail_next(Operation::Update, Table::Storefronts, StoreError::from_code(Some("23503".into()), "violates foreign key constraint"));

    let outcome = h.directory.coordinator().apply_edit(h.mill.id, StorefrontPatch::new().title("X")).await?;
    assert_eq!(outcome, Outcome::Reverted { reason: Failure::Unknown });
    assert_eq!(h.messages(), vec!["Unable to edit: An unknown error occurred."]);
    Ok(())
}

/// The update landed but the read-back failed; the cache is reverted all the same
#[tokio::test]
async fn test_failed_verify_read_reverts() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.store.fail_next(Operation::Select, Table::Storefronts, StoreError::connection("connection reset by peer"));

    let outcome = h.directory.coordinator().apply_edit(h.mill.id, StorefrontPatch::new().title("Old Mill")).await?;
    assert_eq!(outcome, Outcome::Reverted { reason: Failure::Unknown });
    assert_eq!(h.cached(h.mill.id).title, "Mill");
    Ok(())
}

/// Every intent field is compared; one stale field reverts the whole edit
#[tokio::test]
async fn test_one_divergent_field_reverts_everything() -> Result<()> {
    let inner = Arc::new(MemoryStore::new());
    let h = Harness::over(inner, |store| Arc::new(DropColumn { inner: store, column: "published" }) as Arc<dyn RemoteStore>).loaded().await;

    let patch = StorefrontPatch::new().title("Forge II").published(true);
    let outcome = h.directory.coordinator().apply_edit(h.forge.id, patch).await?;
    assert_eq!(outcome, Outcome::Reverted { reason: Failure::EditNotApplied });
    assert_eq!(h.cached(h.forge.id), h.forge);
    Ok(())
}

/// Observers see the optimistic value, then the original, and nothing in between
#[tokio::test]
async fn test_observers_see_whole_states() -> Result<()> {
    let h = Harness::with_policy(hide_storefront_writes).loaded().await;
    let (_handle, views) = record_views(&h.directory);

    let patch = StorefrontPatch::new().title("Old Mill").published(false);
    let merged = patch.apply_to(&h.mill);
    h.directory.coordinator().apply_edit(h.mill.id, patch).await?;

    let seen: Vec<_> = views.lock().unwrap().iter().map(|view| view.listing.storefront(h.mill.id).cloned().unwrap()).collect();
    assert_eq!(seen, vec![merged, h.mill.clone()]);
    Ok(())
}

#[tokio::test]
async fn test_sequential_edits_on_different_storefronts() -> Result<()> {
    let h = Harness::new().loaded().await;
    let coordinator = h.directory.coordinator();

    assert!(coordinator.apply_edit(h.mill.id, StorefrontPatch::new().title("Mill North")).await?.is_applied());
    assert!(coordinator.apply_edit(h.forge.id, StorefrontPatch::new().title("Forge South")).await?.is_applied());
    assert_eq!(h.cached(h.mill.id).title, "Mill North");
    assert_eq!(h.cached(h.forge.id).title, "Forge South");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_edits_on_different_storefronts() -> Result<()> {
    let h = Harness::new().loaded().await;
    let coordinator = h.directory.coordinator();

    let (mill, forge) = tokio::join!(
        coordinator.apply_edit(h.mill.id, StorefrontPatch::new().description(Some("Stone ground".into()))),
        coordinator.apply_edit(h.forge.id, StorefrontPatch::new().published(true)),
    );
    assert_eq!(mill?, Outcome::Applied);
    assert_eq!(forge?, Outcome::Applied);
    assert_eq!(h.cached(h.mill.id).description.as_deref(), Some("Stone ground"));
    assert!(h.cached(h.forge.id).published);
    Ok(())
}

/// A storefront that was never cached has no snapshot to go back to
#[tokio::test]
async fn test_revert_without_snapshot() -> Result<()> {
    let h = Harness::with_policy(hide_storefront_writes);

    let err = h.directory.coordinator().apply_edit(h.mill.id, StorefrontPatch::new().title("Old Mill")).await.unwrap_err();
    assert_eq!(err, EditError::RevertFailed { id: h.mill.id, reason: Failure::EditNotApplied });
    assert_eq!(h.messages(), vec!["Unable to edit: Couldn't edit, may not have permissions."]);
    assert!(h.directory.cache().listing().storefronts.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_publish_lifecycle() -> Result<()> {
    let h = Harness::new().loaded().await;

    assert!(h.directory.coordinator().set_published(h.forge.id, true).await?.is_applied());
    assert!(h.cached(h.forge.id).published);

    let history = h.toasts.history();
    assert_eq!(history.len(), 2);
    assert_eq!((history[0].kind, history[0].message.as_str()), (ToastKind::Loading, "Publishing Forge..."));
    assert_eq!((history[1].kind, history[1].message.as_str()), (ToastKind::Success, "Published Forge"));
    assert_eq!(history[0].id, history[1].id);
    Ok(())
}

#[tokio::test]
async fn test_rejected_unpublish() -> Result<()> {
    let h = Harness::with_policy(hide_storefront_writes).loaded().await;

    let outcome = h.directory.coordinator().set_published(h.mill.id, false).await?;
    assert_eq!(outcome, Outcome::Reverted { reason: Failure::PublishNotApplied });
    assert!(h.cached(h.mill.id).published);
    assert_eq!(h.messages(), vec!["Unpublishing Mill...", "Could not publish storefront, may not have permissions."]);
    Ok(())
}
