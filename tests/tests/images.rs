mod common;
use anyhow::Result;
use async_trait::async_trait;
use common::*;
use std::sync::Arc;

use storemap_core::{
    images::{ImageDraft, ImageProbe, ImageTarget},
    Failure, StoreError, ValidationError,
};
use storemap_proto::Table;
use storemap_storage_memory::Operation;

struct Unreachable;

#[async_trait]
impl ImageProbe for Unreachable {
    async fn reachable(&self, _url: &str) -> bool { false }
}

#[tokio::test]
async fn test_load_images_for_one_storefront() -> Result<()> {
    let h = Harness::new().loaded().await;
    let front = h.image(&h.mill, "Front");
    h.image(&h.forge, "Anvil");

    let images = h.directory.gallery().load(&h.mill).await?;
    assert_eq!(images, vec![front.clone()]);
    assert_eq!(h.directory.gallery().images(h.mill.id), Some(vec![front]));
    Ok(())
}

#[tokio::test]
async fn test_failed_load_clears_gallery() -> Result<()> {
    let h = Harness::new().loaded().await;
    h.image(&h.mill, "Front");
    h.directory.gallery().load(&h.mill).await?;

    h.store.fail_next(Operation::Select, Table::Images, StoreError::connection("reset"));
    assert_eq!(h.directory.gallery().load(&h.mill).await.unwrap_err(), Failure::Unknown);
    assert_eq!(h.directory.gallery().images(h.mill.id), None);
    assert_eq!(h.messages(), vec!["Failed to load images for Mill: An unknown error occurred."]);
    Ok(())
}

#[tokio::test]
async fn test_create_image_then_reload() -> Result<()> {
    let h = Harness::new().loaded().await;
    let draft = ImageDraft::new("https://img.example/door.png", "Door", "Lin");

    h.directory.gallery().save(&h.mill, &ImageTarget::Create(h.mill.id), &draft).await?;
    assert_eq!(h.calls(), vec![(Operation::Insert, Table::Images), (Operation::Select, Table::Images)]);

    let images = h.directory.gallery().images(h.mill.id).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].storefront_id, h.mill.id);
    assert_eq!(images[0].credit_line().as_deref(), Some("Photo taken by Lin."));
    Ok(())
}

#[tokio::test]
async fn test_change_sends_only_edited_fields() -> Result<()> {
    let h = Harness::new().loaded().await;
    let front = h.image(&h.mill, "Front");

    let mut draft = ImageDraft::from_image(&front);
    draft.credits = "Alex".into();
    let patch = h.directory.gallery().save(&h.mill, &ImageTarget::Change(front.clone()), &draft).await?;
    assert_eq!(patch.credits.as_deref(), Some("Alex"));
    assert!(patch.image_url.is_none() && patch.description.is_none());
    assert_eq!(h.directory.gallery().images(h.mill.id).unwrap()[0].credits.as_deref(), Some("Alex"));

    let current = h.directory.gallery().images(h.mill.id).unwrap()[0].clone();
    let unchanged = h.directory.gallery().save(&h.mill, &ImageTarget::Change(current.clone()), &ImageDraft::from_image(&current)).await;
    assert_eq!(unchanged.unwrap_err(), Failure::Invalid(ValidationError::ImageUnchanged));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_image_makes_no_calls() -> Result<()> {
    let h = Harness::new().loaded().await;
    let directory = h.directory.clone().with_probe(Arc::new(Unreachable));

    let draft = ImageDraft::new("https://img.example/missing.png", "Door", "Lin");
    let err = directory.gallery().save(&h.mill, &ImageTarget::Create(h.mill.id), &draft).await.unwrap_err();
    assert_eq!(err.to_string(), "Image seems to be invalid.");
    assert!(h.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_delete_image_lifecycle() -> Result<()> {
    let h = Harness::new().loaded().await;
    let front = h.image(&h.mill, "Front");

    h.directory.gallery().delete(&h.mill, &front).await?;
    assert_eq!(h.messages(), vec!["Deleting Storefront Image Front", "Deleted Storefront Image Front"]);
    assert_eq!(h.directory.gallery().images(h.mill.id), Some(vec![]));
    Ok(())
}
