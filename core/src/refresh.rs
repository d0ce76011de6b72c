use tracing::{error, info};

use crate::{
    cache::{DirectoryCache, Listing},
    client::StoreClient,
    error::StoreError,
};

/// Repopulates the cache from the store
#[derive(Clone)]
pub struct Refresher {
    client: StoreClient,
    cache: DirectoryCache,
}

impl Refresher {
    pub const ERROR_TITLE: &'static str = "Error Occurred";
    pub const ERROR_DESCRIPTION: &'static str = "An error has occurred while trying to load the storefront listing.";

    pub fn new(client: StoreClient, cache: DirectoryCache) -> Self { Self { client, cache } }

    /// Fetch storefronts (by id) then categories and swap them in together.
    ///
    /// On failure the previous listing stays, and the error is recorded on the cache for the
    /// error alert.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let _loading = self.cache.begin_loading();
        match self.fetch().await {
            Ok(listing) => {
                info!("Refresher.refresh: {} storefronts in {} categories", listing.storefronts.len(), listing.categories.len());
                self.cache.replace(listing);
                Ok(())
            }
            Err(err) => {
                error!("Refresher.refresh: {err:?}");
                self.cache.record_error(err.clone());
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> Result<Listing, StoreError> {
        let storefronts = self.client.storefronts().await?;
        let categories = self.client.categories().await?;
        Ok(Listing { storefronts, categories })
    }
}
