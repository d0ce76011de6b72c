//! Optimistic storefront mutations.
//!
//! An edit is applied to the cache first, then persisted, then read back. Store policies can
//! accept an update and silently change nothing, so success is decided by the read-back and
//! not by the update's response. Any failure puts the snapshot back. Nothing is retried; a
//! retry is a new call with a new snapshot.
//!
//! Two edits to the same storefront in flight at once are not coordinated. The later one's
//! read-back sees whatever the store holds at that point and may revert even though its own
//! update went through.

use tracing::{debug, error, info, warn};

use crate::{
    cache::DirectoryCache,
    client::StoreClient,
    error::{EditError, Failure, ValidationError},
    intent::StorefrontPatch,
    notify::Toaster,
    refresh::Refresher,
};
use storemap_proto::StorefrontId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Reverted { reason: Failure },
}

impl Outcome {
    pub fn is_applied(&self) -> bool { matches!(self, Outcome::Applied) }
}

#[derive(Clone)]
pub struct Coordinator {
    client: StoreClient,
    cache: DirectoryCache,
    toaster: Toaster,
    refresher: Refresher,
}

impl Coordinator {
    pub fn new(client: StoreClient, cache: DirectoryCache, toaster: Toaster, refresher: Refresher) -> Self {
        Self { client, cache, toaster, refresher }
    }

    /// Optimistically apply `intent` to storefront `id`.
    ///
    /// A reverted edit also raises an `Unable to edit: ...` toast.
    pub async fn apply_edit(&self, id: StorefrontId, intent: StorefrontPatch) -> Result<Outcome, EditError> {
        let result = self.reconcile(id, &intent, Failure::EditNotApplied).await;
        match &result {
            Ok(Outcome::Reverted { reason }) | Err(EditError::RevertFailed { reason, .. }) => {
                self.toaster.error(format!("Unable to edit: {reason}"));
            }
            _ => {}
        }
        result
    }

    /// Publish or unpublish, reported through a loading toast
    pub async fn set_published(&self, id: StorefrontId, published: bool) -> Result<Outcome, EditError> {
        let title = self.display_title(id);
        let (pending, done) = if published {
            (format!("Publishing {title}..."), format!("Published {title}"))
        } else {
            (format!("Unpublishing {title}..."), format!("Unpublished {title}"))
        };

        let pending = self.toaster.loading(pending);
        let result = self.reconcile(id, &StorefrontPatch::new().published(published), Failure::PublishNotApplied).await;
        match &result {
            Ok(Outcome::Applied) => pending.succeed(done),
            Ok(Outcome::Reverted { reason }) => pending.fail(reason.to_string()),
            Err(err) => pending.fail(err.failure().to_string()),
        }
        result
    }

    async fn reconcile(&self, id: StorefrontId, intent: &StorefrontPatch, not_applied: Failure) -> Result<Outcome, EditError> {
        if intent.is_empty() {
            return Err(ValidationError::EmptyIntent.into());
        }

        // must happen before the first await
        let snapshot = self.cache.apply_patch(id, intent);
        if snapshot.is_none() {
            debug!("Coordinator.reconcile({id:#}): storefront not cached, no snapshot taken");
        }

        let reason = match self.persist_and_verify(id, intent, not_applied).await {
            Ok(()) => {
                info!("Coordinator.reconcile({id:#}): applied {:?}", intent.fields());
                return Ok(Outcome::Applied);
            }
            Err(reason) => reason,
        };

        match snapshot {
            Some(snapshot) => {
                if !self.cache.restore(snapshot) {
                    debug!("Coordinator.reconcile({id:#}): storefront left the cache before revert");
                }
                info!("Coordinator.reconcile({id:#}): reverted: {reason}");
                Ok(Outcome::Reverted { reason })
            }
            None => {
                warn!("Coordinator.reconcile({id:#}): failed to revert data back to previous state");
                Err(EditError::RevertFailed { id, reason })
            }
        }
    }

    async fn persist_and_verify(&self, id: StorefrontId, intent: &StorefrontPatch, not_applied: Failure) -> Result<(), Failure> {
        self.client.update_storefront(id, intent).await.map_err(|err| {
            error!("Coordinator.persist({id:#}): {err:?}");
            Failure::from(&err)
        })?;

        let persisted = self.client.storefront(id).await.map_err(|err| {
            error!("Coordinator.verify({id:#}): {err:?}");
            Failure::from(&err)
        })?;

        match persisted {
            None => {
                debug!("Coordinator.verify({id:#}): row not visible after update");
                Err(not_applied)
            }
            Some(persisted) => {
                let divergent = intent.divergent_fields(&persisted);
                if divergent.is_empty() {
                    Ok(())
                } else {
                    debug!("Coordinator.verify({id:#}): store kept previous {divergent:?}");
                    Err(not_applied)
                }
            }
        }
    }

    /// Delete storefront `id`, confirm it is gone, then refresh the whole listing.
    ///
    /// The cache is never touched directly; it only changes through the refresh.
    pub async fn apply_delete(&self, id: StorefrontId) -> Result<(), Failure> {
        let title = self.display_title(id);
        let pending = self.toaster.loading(format!("Deleting storefront {title}"));

        match self.delete_confirmed(id).await {
            Ok(()) => {
                info!("Coordinator.apply_delete({id:#}): confirmed");
                // refresh failures go to the error alert, the delete itself succeeded
                let _ = self.refresher.refresh().await;
                pending.succeed(format!("Deleted storefront {title}"));
                Ok(())
            }
            Err(reason) => {
                pending.fail(reason.to_string());
                Err(reason)
            }
        }
    }

    async fn delete_confirmed(&self, id: StorefrontId) -> Result<(), Failure> {
        self.client.delete_storefront(id).await.map_err(|err| {
            error!("Coordinator.delete({id:#}): {err:?}");
            Failure::from(&err)
        })?;

        let still_there = self.client.storefront_exists(id).await.map_err(|err| {
            error!("Coordinator.confirm_delete({id:#}): {err:?}");
            Failure::from(&err)
        })?;

        if still_there {
            Err(Failure::DeleteNotApplied)
        } else {
            Ok(())
        }
    }

    fn display_title(&self, id: StorefrontId) -> String {
        self.cache.storefront(id).map(|storefront| storefront.display_title()).unwrap_or_else(|| id.to_string())
    }
}
