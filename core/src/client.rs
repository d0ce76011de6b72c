use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::StoreError,
    intent::{ImagePatch, StorefrontPatch},
    store::{Filter, RemoteStore, Select},
};
use storemap_proto::{Category, ImageId, NewImage, NewStorefront, Row, Storefront, StorefrontId, StorefrontImage, Table};

/// Typed queries over an injected [`RemoteStore`]
#[derive(Clone)]
pub struct StoreClient(Arc<dyn RemoteStore>);

impl StoreClient {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self { Self(store) }

    pub fn store(&self) -> &Arc<dyn RemoteStore> { &self.0 }

    /// All storefronts, ordered by id
    pub async fn storefronts(&self) -> Result<Vec<Storefront>, StoreError> {
        let rows = self.0.select(&Select::from(Table::Storefronts).order_by("id")).await?;
        decode_rows(Table::Storefronts, rows)
    }

    pub async fn storefront(&self, id: StorefrontId) -> Result<Option<Storefront>, StoreError> {
        let rows = self.0.select(&Select::from(Table::Storefronts).filter(id_filter(id))).await?;
        Ok(decode_rows(Table::Storefronts, rows)?.into_iter().next())
    }

    /// Whether a row with this id is still visible
    pub async fn storefront_exists(&self, id: StorefrontId) -> Result<bool, StoreError> {
        let rows = self.0.select(&Select::from(Table::Storefronts).columns(&["id"]).filter(id_filter(id))).await?;
        Ok(!rows.is_empty())
    }

    pub async fn insert_storefront(&self, storefront: &NewStorefront) -> Result<(), StoreError> {
        self.0.insert(Table::Storefronts, encode(storefront)?).await?;
        Ok(())
    }

    pub async fn update_storefront(&self, id: StorefrontId, patch: &StorefrontPatch) -> Result<(), StoreError> {
        let changes = encode(patch)?;
        debug!("StoreClient.update_storefront({id:#}): {:?}", changes);
        self.0.update(Table::Storefronts, &id_filter(id), changes).await?;
        Ok(())
    }

    pub async fn delete_storefront(&self, id: StorefrontId) -> Result<(), StoreError> { self.0.delete(Table::Storefronts, &id_filter(id)).await }

    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = self.0.select(&Select::from(Table::Categories)).await?;
        decode_rows(Table::Categories, rows)
    }

    pub async fn images(&self, storefront_id: StorefrontId) -> Result<Vec<StorefrontImage>, StoreError> {
        let rows = self.0.select(&Select::from(Table::Images).filter(Filter::eq("storefront_id", storefront_id))).await?;
        decode_rows(Table::Images, rows)
    }

    pub async fn insert_image(&self, image: &NewImage) -> Result<(), StoreError> {
        self.0.insert(Table::Images, encode(image)?).await?;
        Ok(())
    }

    pub async fn update_image(&self, id: ImageId, patch: &ImagePatch) -> Result<(), StoreError> {
        self.0.update(Table::Images, &Filter::eq("id", id), encode(patch)?).await?;
        Ok(())
    }

    pub async fn delete_image(&self, id: ImageId) -> Result<(), StoreError> { self.0.delete(Table::Images, &Filter::eq("id", id)).await }

    /// Permission rows visible to the current session
    pub async fn permissions(&self) -> Result<Vec<Row>, StoreError> { self.0.select(&Select::from(Table::Permissions)).await }
}

fn id_filter(id: StorefrontId) -> Filter { Filter::eq("id", id) }

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::decode(format!("expected an object, got {other}"))),
    }
}

fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(|err| StoreError::decode(format!("{table}: {err}"))))
        .collect()
}
