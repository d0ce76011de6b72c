use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, ImageId, StorefrontId};

/// Map coordinates in the tile layer's own CRS, stored as `{"lat": .., "lng": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self { Self { lat, lng } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storefront {
    pub id: StorefrontId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<CategoryId>,
    pub location: Location,
    pub published: bool,
}

impl Storefront {
    /// The title, or the id when the title is blank
    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            self.id.to_string()
        } else {
            self.title.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: Option<String>,
    pub is_general: bool,
    pub icon: Option<String>,
}

impl Category {
    pub const DEFAULT_ICON: &'static str = "store";

    pub fn display_title(&self) -> String { self.title.clone().unwrap_or_else(|| self.id.to_string()) }

    pub fn icon_name(&self) -> &str { self.icon.as_deref().unwrap_or(Self::DEFAULT_ICON) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontImage {
    pub id: ImageId,
    pub storefront_id: StorefrontId,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub credits: Option<String>,
}

impl StorefrontImage {
    pub const UNCAPTIONED: &'static str = "Storefront Image Uncaptioned.";

    pub fn caption(&self) -> &str { self.description.as_deref().unwrap_or(Self::UNCAPTIONED) }

    pub fn credit_line(&self) -> Option<String> {
        self.credits.as_deref().filter(|credits| !credits.is_empty()).map(|credits| format!("Photo taken by {credits}."))
    }

    /// Label used in notifications about this image
    pub fn label(&self) -> String { self.description.clone().unwrap_or_else(|| self.id.to_string()) }
}

/// Insert payload for `storefronts`; id and published are left to column defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStorefront {
    pub location: Location,
    pub category: CategoryId,
    pub title: String,
    pub description: String,
}

/// Insert payload for `storefront_images`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewImage {
    pub storefront_id: StorefrontId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
}
