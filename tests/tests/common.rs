#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::Level;

use storemap_core::{
    session::{Session, User},
    CacheView, Directory, Filter, RemoteStore, Select, StoreError, ToastQueue,
};
use storemap_proto::{Category, CategoryId, Location, Row, Storefront, StorefrontId, StorefrontImage, Table};
use storemap_storage_memory::{Access, Call, MemoryStore, Operation, RowPolicy};

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

pub fn row<T: serde::Serialize>(value: &T) -> Row {
    match serde_json::to_value(value).unwrap() {
        Value::Object(row) => row,
        other => panic!("not an object: {other}"),
    }
}

pub fn category(title: &str, is_general: bool) -> Category { Category { id: CategoryId::new(), title: Some(title.into()), is_general, icon: None } }

pub fn storefront(title: &str, category: &Category, published: bool) -> Storefront {
    Storefront {
        id: StorefrontId::new(),
        title: title.into(),
        description: Some(format!("{title} description")),
        category: Some(category.id),
        location: Location::new(12.5, -40.25),
        published,
    }
}

pub fn session(user_id: &str) -> Session { Session { access_token: "token".into(), user: User { id: user_id.into(), email: None, identities: Vec::new() } } }

/// A memory store seeded with one category and two storefronts, and a directory over it
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub toasts: Arc<ToastQueue>,
    pub directory: Directory,
    pub general: Category,
    pub mill: Storefront,
    pub forge: Storefront,
}

impl Harness {
    pub fn new() -> Self { Self::over(Arc::new(MemoryStore::new()), |store| store as Arc<dyn RemoteStore>) }

    pub fn with_policy(policy: impl RowPolicy + 'static) -> Self {
        Self::over(Arc::new(MemoryStore::with_policy(policy)), |store| store as Arc<dyn RemoteStore>)
    }

    /// Seed a memory store, then put `wrap` between it and the directory
    pub fn over(store: Arc<MemoryStore>, wrap: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn RemoteStore>) -> Self {
        let general = category("General", true);
        let mill = storefront("Mill", &general, true);
        let forge = storefront("Forge", &general, false);
        store.seed(Table::Categories, [row(&general)]);
        store.seed(Table::Storefronts, [row(&mill), row(&forge)]);

        let toasts = Arc::new(ToastQueue::default());
        let directory = Directory::new(wrap(store.clone()), toasts.clone());
        Self { store, toasts, directory, general, mill, forge }
    }

    /// Refresh, then forget the calls and toasts that produced the starting state
    pub async fn loaded(self) -> Self {
        self.directory.refresher().refresh().await.unwrap();
        self.store.clear_calls();
        self
    }

    /// Give `user_id` a permission row, sign in as them and enter edit mode
    pub async fn sign_in_admin(&self, user_id: &str) {
        self.store.seed(Table::Permissions, [row(&serde_json::json!({ "user_id": user_id }))]);
        assert!(self.directory.set_session(Some(session(user_id))).await);
        assert!(self.directory.toggle_edit_mode());
        self.store.clear_calls();
    }

    pub fn calls(&self) -> Vec<(Operation, Table)> { self.store.calls().into_iter().map(|call: Call| (call.operation, call.table)).collect() }

    pub fn cached(&self, id: StorefrontId) -> Storefront { self.directory.cache().storefront(id).unwrap() }

    pub fn messages(&self) -> Vec<String> { self.toasts.messages() }

    pub fn image(&self, storefront: &Storefront, description: &str) -> StorefrontImage {
        let image = StorefrontImage {
            id: storemap_proto::ImageId::new(),
            storefront_id: storefront.id,
            image_url: Some(format!("https://img.example/{description}.png")),
            description: Some(description.into()),
            credits: Some("Sam".into()),
        };
        self.store.seed(Table::Images, [row(&image)]);
        image
    }
}

/// Accepts updates to storefronts and deletes of storefronts without changing anything
pub fn hide_storefront_writes(operation: Operation, table: Table, _row: &Row) -> Access {
    match (operation, table) {
        (Operation::Update | Operation::Delete, Table::Storefronts) => Access::Hide,
        _ => Access::Allow,
    }
}

/// Drops one column from every update before it reaches the store
pub struct DropColumn {
    pub inner: Arc<MemoryStore>,
    pub column: &'static str,
}

#[async_trait]
impl RemoteStore for DropColumn {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> { self.inner.select(query).await }

    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError> { self.inner.insert(table, row).await }

    async fn update(&self, table: Table, filter: &Filter, mut changes: Row) -> Result<Vec<Row>, StoreError> {
        changes.remove(self.column);
        self.inner.update(table, filter, changes).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), StoreError> { self.inner.delete(table, filter).await }
}

/// Records every view the cache publishes
pub fn record_views(directory: &Directory) -> (storemap_core::cache::SubscriptionHandle, Arc<Mutex<Vec<CacheView>>>) {
    let views = Arc::new(Mutex::new(Vec::new()));
    let handle = {
        let views = views.clone();
        directory.cache().subscribe(move |view| views.lock().unwrap().push(view.clone()))
    };
    (handle, views)
}
