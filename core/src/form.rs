use crate::{error::ValidationError, intent::StorefrontPatch};
use storemap_proto::{CategoryId, Storefront};

/// Popup edit form for one storefront, tracked against the storefront it was opened on
#[derive(Debug, Clone)]
pub struct StorefrontEditForm {
    original: Storefront,
    pub title: String,
    pub description: String,
    pub category: Option<CategoryId>,
}

impl StorefrontEditForm {
    pub fn new(original: Storefront) -> Self {
        let title = original.title.clone();
        let description = original.description.clone().unwrap_or_default();
        let category = original.category;
        Self { original, title, description, category }
    }

    pub fn original(&self) -> &Storefront { &self.original }

    pub fn set_title(&mut self, title: impl Into<String>) { self.title = title.into() }

    pub fn set_description(&mut self, description: impl Into<String>) { self.description = description.into() }

    pub fn set_category(&mut self, category: Option<CategoryId>) { self.category = category }

    fn description_changed(&self) -> bool { self.original.description.as_deref().unwrap_or("") != self.description }

    pub fn has_changes(&self) -> bool {
        self.title != self.original.title || self.description_changed() || self.category != self.original.category
    }

    /// Build an intent holding only the fields that differ from the original
    pub fn submit(&self) -> Result<StorefrontPatch, ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if self.category.is_none() {
            return Err(ValidationError::MissingCategory);
        }

        let mut patch = StorefrontPatch::new();
        if self.title != self.original.title {
            patch = patch.title(self.title.clone());
        }
        if self.category != self.original.category {
            patch = patch.category(self.category);
        }
        if self.description_changed() {
            patch = patch.description(Some(self.description.clone()));
        }

        if patch.is_empty() {
            return Err(ValidationError::EmptyIntent);
        }
        Ok(patch)
    }
}
