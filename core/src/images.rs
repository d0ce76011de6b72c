//! Storefront photo galleries.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, error};

use crate::{
    client::StoreClient,
    error::{Failure, ValidationError},
    intent::ImagePatch,
    notify::Toaster,
};
use storemap_proto::{NewImage, Storefront, StorefrontId, StorefrontImage};

/// Checks that an image URL actually serves something
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn reachable(&self, url: &str) -> bool;
}

/// Probe that accepts every URL
pub struct AcceptAll;

#[async_trait]
impl ImageProbe for AcceptAll {
    async fn reachable(&self, _url: &str) -> bool { true }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageTarget {
    Change(StorefrontImage),
    Create(StorefrontId),
}

impl ImageTarget {
    fn original(&self) -> Option<&StorefrontImage> {
        match self {
            ImageTarget::Change(image) => Some(image),
            ImageTarget::Create(_) => None,
        }
    }
}

/// Image form contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDraft {
    pub image_url: String,
    pub description: String,
    pub credits: String,
}

impl ImageDraft {
    pub fn new(image_url: impl Into<String>, description: impl Into<String>, credits: impl Into<String>) -> Self {
        Self { image_url: image_url.into(), description: description.into(), credits: credits.into() }
    }

    /// A draft prefilled from an existing image
    pub fn from_image(image: &StorefrontImage) -> Self {
        Self {
            image_url: image.image_url.clone().unwrap_or_default(),
            description: image.description.clone().unwrap_or_default(),
            credits: image.credits.clone().unwrap_or_default(),
        }
    }

    /// Validate against `target` and return the changed fields
    pub async fn validate(&self, target: &ImageTarget, probe: &dyn ImageProbe) -> Result<ImagePatch, ValidationError> {
        if self.image_url.is_empty() {
            return Err(ValidationError::EmptyImageUrl);
        }
        if !probe.reachable(&self.image_url).await {
            return Err(ValidationError::UnreachableImage);
        }
        if self.description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if self.credits.is_empty() {
            return Err(ValidationError::EmptyCredits);
        }

        let original = target.original();
        let changed = |value: &String, current: Option<&Option<String>>| match current {
            Some(Some(current)) if current == value => None,
            _ => Some(value.clone()),
        };
        let patch = ImagePatch {
            image_url: changed(&self.image_url, original.map(|image| &image.image_url)),
            description: changed(&self.description, original.map(|image| &image.description)),
            credits: changed(&self.credits, original.map(|image| &image.credits)),
        };

        if patch.is_empty() {
            return Err(ValidationError::ImageUnchanged);
        }
        Ok(patch)
    }
}

/// Index of the previous and next slide, wrapping at both ends
pub fn carousel_neighbors(index: usize, count: usize) -> Option<(usize, usize)> {
    if count == 0 || index >= count {
        return None;
    }
    let previous = if index == 0 { count - 1 } else { index - 1 };
    let next = if index + 1 == count { 0 } else { index + 1 };
    Some((previous, next))
}

/// Loaded galleries, keyed by storefront
#[derive(Clone)]
pub struct Gallery {
    client: StoreClient,
    toaster: Toaster,
    probe: Arc<dyn ImageProbe>,
    images: Arc<RwLock<HashMap<StorefrontId, Vec<StorefrontImage>>>>,
}

impl Gallery {
    pub fn new(client: StoreClient, toaster: Toaster, probe: Arc<dyn ImageProbe>) -> Self {
        Self { client, toaster, probe, images: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Shares the loaded galleries with `self`
    pub fn with_probe(&self, probe: Arc<dyn ImageProbe>) -> Self { Self { probe, ..self.clone() } }

    /// Shares the loaded galleries with `self`
    pub fn with_toaster(&self, toaster: Toaster) -> Self { Self { toaster, ..self.clone() } }

    /// Images last loaded for `storefront_id`, `None` when not loaded or the load failed
    pub fn images(&self, storefront_id: StorefrontId) -> Option<Vec<StorefrontImage>> {
        self.images.read().unwrap_or_else(PoisonError::into_inner).get(&storefront_id).cloned()
    }

    pub async fn load(&self, storefront: &Storefront) -> Result<Vec<StorefrontImage>, Failure> {
        match self.client.images(storefront.id).await {
            Ok(images) => {
                debug!("Gallery.load({:#}): {} images", storefront.id, images.len());
                self.images.write().unwrap_or_else(PoisonError::into_inner).insert(storefront.id, images.clone());
                Ok(images)
            }
            Err(err) => {
                error!("Gallery.load({:#}): {err:?}", storefront.id);
                self.images.write().unwrap_or_else(PoisonError::into_inner).remove(&storefront.id);
                let failure = Failure::from(&err);
                self.toaster.error(format!("Failed to load images for {}: {failure}", storefront.display_title()));
                Err(failure)
            }
        }
    }

    /// Create or change an image from the form, then reload the gallery
    pub async fn save(&self, storefront: &Storefront, target: &ImageTarget, draft: &ImageDraft) -> Result<ImagePatch, Failure> {
        let patch = draft.validate(target, self.probe.as_ref()).await?;

        let result = match target {
            ImageTarget::Change(image) => self.client.update_image(image.id, &patch).await,
            ImageTarget::Create(storefront_id) => {
                let image = NewImage {
                    storefront_id: *storefront_id,
                    image_url: patch.image_url.clone(),
                    description: patch.description.clone(),
                    credits: patch.credits.clone(),
                };
                self.client.insert_image(&image).await
            }
        };
        result.map_err(|err| {
            error!("Gallery.save({:#}): {err:?}", storefront.id);
            Failure::from(&err)
        })?;

        let _ = self.load(storefront).await;
        Ok(patch)
    }

    pub async fn delete(&self, storefront: &Storefront, image: &StorefrontImage) -> Result<(), Failure> {
        let label = image.label();
        let pending = self.toaster.loading(format!("Deleting Storefront Image {label}"));

        if let Err(err) = self.client.delete_image(image.id).await {
            error!("Gallery.delete({:#}): {err:?}", image.id);
            let failure = Failure::from(&err);
            pending.fail(failure.to_string());
            return Err(failure);
        }

        let _ = self.load(storefront).await;
        pending.succeed(format!("Deleted Storefront Image {label}"));
        Ok(())
    }
}
