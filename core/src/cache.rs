//! The local copy of the storefront listing that the map renders from.
//!
//! Every mutation happens under a single write lock and never spans an await point, so an
//! observer sees either the state before a change or the state after it. Subscribers are
//! notified after the lock is released, with the view captured inside it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::debug;

use crate::{error::StoreError, intent::StorefrontPatch};
use storemap_proto::{Category, Storefront, StorefrontId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub storefronts: Vec<Storefront>,
    pub categories: Vec<Category>,
}

impl Listing {
    pub fn storefront(&self, id: StorefrontId) -> Option<&Storefront> { self.storefronts.iter().find(|storefront| storefront.id == id) }
}

/// What an observer of the cache sees
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheView {
    pub listing: Listing,
    /// A refresh is in flight; the UI shows a blocking indicator
    pub loading: bool,
    /// The last refresh failure, until dismissed or replaced by a successful refresh
    pub error: Option<StoreError>,
}

#[derive(Default)]
struct CacheState {
    listing: Listing,
    loading: usize,
    error: Option<StoreError>,
}

impl CacheState {
    fn view(&self) -> CacheView { CacheView { listing: self.listing.clone(), loading: self.loading > 0, error: self.error.clone() } }
}

type Callback = Box<dyn Fn(&CacheView) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(usize);

#[derive(Default)]
struct Subscribers {
    next_id: AtomicUsize,
    callbacks: RwLock<BTreeMap<SubscriptionId, Callback>>,
}

/// Unsubscribes when dropped
pub struct SubscriptionHandle {
    id: SubscriptionId,
    subscribers: Weak<Subscribers>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId { self.id }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.callbacks.write().unwrap_or_else(PoisonError::into_inner).remove(&self.id);
        }
    }
}

#[derive(Clone, Default)]
pub struct DirectoryCache {
    state: Arc<RwLock<CacheState>>,
    subscribers: Arc<Subscribers>,
}

impl DirectoryCache {
    pub fn new() -> Self { Self::default() }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> { self.state.read().unwrap_or_else(PoisonError::into_inner) }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> { self.state.write().unwrap_or_else(PoisonError::into_inner) }

    /// Run `f` under the write lock, then notify subscribers if it reports a change
    fn mutate<R>(&self, f: impl FnOnce(&mut CacheState) -> (R, bool)) -> R {
        let (result, view) = {
            let mut state = self.write();
            let (result, changed) = f(&mut state);
            (result, changed.then(|| state.view()))
        };
        if let Some(view) = view {
            self.notify(&view);
        }
        result
    }

    fn notify(&self, view: &CacheView) {
        let callbacks = self.subscribers.callbacks.read().unwrap_or_else(PoisonError::into_inner);
        for callback in callbacks.values() {
            callback(view);
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&CacheView) + Send + Sync + 'static) -> SubscriptionHandle {
        let id = SubscriptionId(self.subscribers.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.callbacks.write().unwrap_or_else(PoisonError::into_inner).insert(id, Box::new(callback));
        SubscriptionHandle { id, subscribers: Arc::downgrade(&self.subscribers) }
    }

    pub fn view(&self) -> CacheView { self.read().view() }

    pub fn listing(&self) -> Listing { self.read().listing.clone() }

    pub fn storefront(&self, id: StorefrontId) -> Option<Storefront> { self.read().listing.storefront(id).cloned() }

    pub fn is_loading(&self) -> bool { self.read().loading > 0 }

    pub fn error(&self) -> Option<StoreError> { self.read().error.clone() }

    /// Replace the cached storefront with `merge(current, patch)` and hand back the previous value.
    ///
    /// Returns `None` and leaves the cache alone if the storefront is not cached.
    pub fn apply_patch(&self, id: StorefrontId, patch: &StorefrontPatch) -> Option<Storefront> {
        self.mutate(|state| {
            let Some(entry) = state.listing.storefronts.iter_mut().find(|storefront| storefront.id == id) else {
                return (None, false);
            };
            let merged = patch.apply_to(entry);
            let previous = std::mem::replace(entry, merged);
            debug!("DirectoryCache.apply_patch({id:#}): {:?}", patch.fields());
            (Some(previous), true)
        })
    }

    /// Put a snapshot back in place of the cached storefront with the same id.
    ///
    /// Returns false if the storefront is no longer cached (a refresh dropped it).
    pub fn restore(&self, snapshot: Storefront) -> bool {
        self.mutate(|state| match state.listing.storefronts.iter_mut().find(|storefront| storefront.id == snapshot.id) {
            Some(entry) => {
                debug!("DirectoryCache.restore({:#})", snapshot.id);
                *entry = snapshot;
                (true, true)
            }
            None => (false, false),
        })
    }

    /// Wholesale replacement after a successful refresh; clears any recorded refresh error
    pub fn replace(&self, listing: Listing) {
        self.mutate(|state| {
            debug!("DirectoryCache.replace: {} storefronts, {} categories", listing.storefronts.len(), listing.categories.len());
            state.listing = listing;
            state.error = None;
            ((), true)
        })
    }

    pub fn record_error(&self, error: StoreError) {
        self.mutate(|state| {
            state.error = Some(error);
            ((), true)
        })
    }

    pub fn dismiss_error(&self) {
        self.mutate(|state| {
            let had_error = state.error.take().is_some();
            ((), had_error)
        })
    }

    /// Raise the loading flag until the guard is dropped
    pub fn begin_loading(&self) -> LoadingGuard {
        self.mutate(|state| {
            state.loading += 1;
            ((), state.loading == 1)
        });
        LoadingGuard { cache: self.clone() }
    }

    fn end_loading(&self) {
        self.mutate(|state| {
            state.loading = state.loading.saturating_sub(1);
            ((), state.loading == 0)
        })
    }
}

#[must_use = "the loading flag drops as soon as the guard does"]
pub struct LoadingGuard {
    cache: DirectoryCache,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) { self.cache.end_loading(); }
}
