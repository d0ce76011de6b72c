//! Mutation intents: partial updates restricted to the columns a user may edit directly.
//!
//! The id, location, and any server-computed column are not representable here, so an intent
//! can never target them.

use serde::Serialize;
use storemap_proto::{CategoryId, Storefront, StorefrontImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorefrontField {
    Title,
    Description,
    Category,
    Published,
}

impl StorefrontField {
    pub fn column(&self) -> &'static str {
        match self {
            StorefrontField::Title => "title",
            StorefrontField::Description => "description",
            StorefrontField::Category => "category",
            StorefrontField::Published => "published",
        }
    }
}

/// A partial update of a storefront. `None` means "not part of the intent".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorefrontPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<CategoryId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl StorefrontPatch {
    pub fn new() -> Self { Self::default() }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn category(mut self, category: Option<CategoryId>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }

    pub fn is_empty(&self) -> bool { self.fields().is_empty() }

    pub fn fields(&self) -> Vec<StorefrontField> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push(StorefrontField::Title);
        }
        if self.description.is_some() {
            fields.push(StorefrontField::Description);
        }
        if self.category.is_some() {
            fields.push(StorefrontField::Category);
        }
        if self.published.is_some() {
            fields.push(StorefrontField::Published);
        }
        fields
    }

    /// `merge(storefront, self)`: a copy of the storefront with every intent field overwritten
    pub fn apply_to(&self, storefront: &Storefront) -> Storefront {
        let mut merged = storefront.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(category) = self.category {
            merged.category = category;
        }
        if let Some(published) = self.published {
            merged.published = published;
        }
        merged
    }

    /// Intent fields whose persisted value is not strictly equal to the intended value
    pub fn divergent_fields(&self, persisted: &Storefront) -> Vec<StorefrontField> {
        self.fields()
            .into_iter()
            .filter(|field| match field {
                StorefrontField::Title => self.title.as_ref() != Some(&persisted.title),
                StorefrontField::Description => self.description.as_ref() != Some(&persisted.description),
                StorefrontField::Category => self.category != Some(persisted.category),
                StorefrontField::Published => self.published != Some(persisted.published),
            })
            .collect()
    }
}

/// A partial update of a storefront image
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
}

impl ImagePatch {
    pub fn is_empty(&self) -> bool { self.image_url.is_none() && self.description.is_none() && self.credits.is_none() }

    pub fn apply_to(&self, image: &StorefrontImage) -> StorefrontImage {
        let mut merged = image.clone();
        if let Some(url) = &self.image_url {
            merged.image_url = Some(url.clone());
        }
        if let Some(description) = &self.description {
            merged.description = Some(description.clone());
        }
        if let Some(credits) = &self.credits {
            merged.credits = Some(credits.clone());
        }
        merged
    }
}
