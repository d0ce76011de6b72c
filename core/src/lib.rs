pub mod cache;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod creation;
pub mod directory;
pub mod edit_mode;
pub mod error;
pub mod form;
pub mod images;
pub mod intent;
pub mod layers;
pub mod notify;
pub mod refresh;
pub mod session;
pub mod store;

pub use cache::{CacheView, DirectoryCache, Listing};
pub use client::StoreClient;
pub use config::{ClientConfig, ToastConfig};
pub use coordinator::{Coordinator, Outcome};
pub use directory::Directory;
pub use error::{EditError, ErrorKind, Failure, StoreError, ValidationError};
pub use intent::{ImagePatch, StorefrontPatch};
pub use notify::{NotificationSink, Toast, ToastKind, ToastQueue, Toaster};
pub use store::{Columns, Filter, RemoteStore, Select};

pub use storemap_proto as proto;
