use storemap_proto::{Category, CategoryId, Location, Storefront};

use crate::cache::Listing;

/// A storefront as placed on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub storefront: Storefront,
    pub title: String,
    pub icon: String,
    /// Unpublished storefronts are drawn faded
    pub faded: bool,
}

/// One toggleable map layer per category
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub category: CategoryId,
    pub name: String,
    pub markers: Vec<Marker>,
}

impl Layer {
    fn contains(category: &Category, storefront: &Storefront) -> bool {
        match storefront.category {
            Some(id) => id == category.id,
            None => category.is_general,
        }
    }
}

/// Group the listing into layers, in category order
pub fn layers(listing: &Listing, edit_mode: bool) -> Vec<Layer> {
    listing
        .categories
        .iter()
        .map(|category| Layer {
            category: category.id,
            name: category.display_title(),
            markers: listing
                .storefronts
                .iter()
                .filter(|storefront| (storefront.published || edit_mode) && Layer::contains(category, storefront))
                .map(|storefront| Marker {
                    storefront: storefront.clone(),
                    title: storefront.display_title(),
                    icon: category.icon_name().to_string(),
                    faded: !storefront.published,
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Location,
    pub zoom: u8,
}

impl MapView {
    pub const MIN_ZOOM: u8 = 1;
    pub const MAX_ZOOM: u8 = 7;
    pub const DEFAULT_ZOOM: u8 = 2;

    pub fn zoom_to(&mut self, zoom: u8) { self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM) }

    pub fn reset(&mut self) { *self = Self::default() }
}

impl Default for MapView {
    fn default() -> Self { Self { center: Location::new(0.0, 0.0), zoom: Self::DEFAULT_ZOOM } }
}

/// Tile URL template under `base_url`
pub fn tile_url(base_url: &str) -> String { format!("{base_url}tiles/atlas/{{z}}/{{x}}_{{y}}.png") }
