use tracing::{error, info};

use crate::{
    client::StoreClient,
    edit_mode::EditMode,
    error::{Failure, ValidationError},
    notify::Toaster,
    refresh::Refresher,
};
use storemap_proto::{CategoryId, Location, NewStorefront};

/// What the creation dialog holds before submit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorefrontDraft {
    pub title: String,
    pub description: String,
    pub category: Option<CategoryId>,
}

impl StorefrontDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>, category: Option<CategoryId>) -> Self {
        Self { title: title.into(), description: description.into(), category }
    }

    /// Checks run in dialog order and stop at the first failure
    pub fn validate(&self) -> Result<CategoryId, ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        self.category.ok_or(ValidationError::MissingCategory)
    }

    fn into_new(self, category: CategoryId, location: Location) -> NewStorefront {
        NewStorefront { location, category, title: self.title, description: self.description }
    }
}

#[derive(Clone)]
pub struct Creator {
    client: StoreClient,
    edit_mode: EditMode,
    toaster: Toaster,
    refresher: Refresher,
}

impl Creator {
    pub fn new(client: StoreClient, edit_mode: EditMode, toaster: Toaster, refresher: Refresher) -> Self {
        Self { client, edit_mode, toaster, refresher }
    }

    /// Insert a storefront at the location chosen in edit mode.
    ///
    /// Failures are also written to the dialog error. On success the location is cleared, the
    /// dialog closes and the listing is refreshed.
    pub async fn create(&self, draft: StorefrontDraft) -> Result<(), Failure> {
        match self.insert(draft).await {
            Ok(title) => {
                info!("Creator.create: created {title}");
                self.edit_mode.clear_location();
                self.edit_mode.close_create_dialog();
                self.toaster.success_for(format!("Created storefront {title} successfully."), self.toaster.config().created);
                let _ = self.refresher.refresh().await;
                Ok(())
            }
            Err(failure) => {
                self.edit_mode.set_dialog_error(failure.to_string());
                Err(failure)
            }
        }
    }

    async fn insert(&self, draft: StorefrontDraft) -> Result<String, Failure> {
        let category = draft.validate()?;
        let location = self.edit_mode.location().ok_or(ValidationError::LocationNotSet)?;

        let title = draft.title.clone();
        self.client.insert_storefront(&draft.into_new(category, location)).await.map_err(|err| {
            error!("Creator.insert: {err:?}");
            Failure::from(&err)
        })?;
        Ok(title)
    }
}
