use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::{
    cache::DirectoryCache,
    client::StoreClient,
    config::ToastConfig,
    coordinator::Coordinator,
    creation::Creator,
    edit_mode::EditMode,
    images::{AcceptAll, Gallery, ImageProbe},
    layers::{self, Layer},
    notify::{NotificationSink, Toaster},
    refresh::Refresher,
    session::{AdminCheck, Session},
    store::RemoteStore,
};

/// The storefront directory: one cache and everything that reads or writes it, wired to a single store
#[derive(Clone)]
pub struct Directory {
    client: StoreClient,
    cache: DirectoryCache,
    toaster: Toaster,
    edit_mode: EditMode,
    session: Arc<RwLock<Option<Session>>>,
    admin: AdminCheck,
    refresher: Refresher,
    coordinator: Coordinator,
    creator: Creator,
    gallery: Gallery,
}

impl Directory {
    pub fn new(store: Arc<dyn RemoteStore>, sink: Arc<dyn NotificationSink>) -> Self {
        let client = StoreClient::new(store);
        let cache = DirectoryCache::new();
        let toaster = Toaster::new(sink, ToastConfig::default());
        let edit_mode = EditMode::new();
        let refresher = Refresher::new(client.clone(), cache.clone());
        let coordinator = Coordinator::new(client.clone(), cache.clone(), toaster.clone(), refresher.clone());
        let creator = Creator::new(client.clone(), edit_mode.clone(), toaster.clone(), refresher.clone());
        let gallery = Gallery::new(client.clone(), toaster.clone(), Arc::new(AcceptAll));
        let admin = AdminCheck::new(client.clone());
        Self { client, cache, toaster, edit_mode, session: Arc::new(RwLock::new(None)), admin, refresher, coordinator, creator, gallery }
    }

    /// Replace the image probe used by the gallery
    pub fn with_probe(mut self, probe: Arc<dyn ImageProbe>) -> Self {
        self.gallery = self.gallery.with_probe(probe);
        self
    }

    /// Replace the toast durations. The cache, session and edit mode carry over.
    pub fn with_toast_config(mut self, toasts: ToastConfig) -> Self {
        self.toaster = self.toaster.with_config(toasts);
        self.coordinator = Coordinator::new(self.client.clone(), self.cache.clone(), self.toaster.clone(), self.refresher.clone());
        self.creator = Creator::new(self.client.clone(), self.edit_mode.clone(), self.toaster.clone(), self.refresher.clone());
        self.gallery = self.gallery.with_toaster(self.toaster.clone());
        self
    }

    pub fn client(&self) -> &StoreClient { &self.client }

    pub fn cache(&self) -> &DirectoryCache { &self.cache }

    pub fn toaster(&self) -> &Toaster { &self.toaster }

    pub fn edit_mode(&self) -> &EditMode { &self.edit_mode }

    pub fn refresher(&self) -> &Refresher { &self.refresher }

    pub fn coordinator(&self) -> &Coordinator { &self.coordinator }

    pub fn creator(&self) -> &Creator { &self.creator }

    pub fn gallery(&self) -> &Gallery { &self.gallery }

    pub fn session(&self) -> Option<Session> { self.session.read().unwrap_or_else(PoisonError::into_inner).clone() }

    pub fn is_admin(&self) -> bool { self.admin.is_admin() }

    /// Sign in or out, switch the store to the new identity, then recheck admin rights.
    /// Signing out leaves edit mode.
    pub async fn set_session(&self, session: Option<Session>) -> bool {
        info!("Directory.set_session: signed_in={}", session.is_some());
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session.clone();
        self.client.store().set_session(session.as_ref());
        let is_admin = self.admin.check(session.as_ref()).await;
        if session.is_none() || !is_admin {
            self.edit_mode.disable();
        }
        is_admin
    }

    pub fn toggle_edit_mode(&self) -> bool { self.edit_mode.toggle(self.session().is_some(), self.is_admin()) }

    /// Map layers for the current listing and edit mode
    pub fn layers(&self) -> Vec<Layer> { layers::layers(&self.cache.listing(), self.edit_mode.is_enabled()) }
}
