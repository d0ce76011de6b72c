//! Notification sink and the lifecycle helpers the directory reports through.
//!
//! A toast is identified by its [`ToastId`]; showing a toast with an id that is already up
//! replaces it, which is how a loading toast turns into its success or error.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::ToastConfig;

pub type ToastId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
    /// `None` stays up until replaced or dismissed
    pub duration: Option<Duration>,
}

pub trait NotificationSink: Send + Sync {
    /// Show a toast, replacing any toast with the same id
    fn show(&self, toast: Toast);

    fn dismiss(&self, _id: ToastId) {}
}

/// Hands out toast ids and applies the configured durations
#[derive(Clone)]
pub struct Toaster {
    sink: Arc<dyn NotificationSink>,
    next_id: Arc<AtomicU64>,
    config: ToastConfig,
}

impl Toaster {
    pub fn new(sink: Arc<dyn NotificationSink>, config: ToastConfig) -> Self { Self { sink, next_id: Arc::new(AtomicU64::new(1)), config } }

    pub fn config(&self) -> &ToastConfig { &self.config }

    /// Same sink and id sequence, different durations
    pub fn with_config(&self, config: ToastConfig) -> Self { Self { sink: self.sink.clone(), next_id: self.next_id.clone(), config } }

    fn next_id(&self) -> ToastId { self.next_id.fetch_add(1, Ordering::Relaxed) }

    pub fn success(&self, message: impl Into<String>) -> ToastId { self.success_for(message, self.config.success) }

    pub fn success_for(&self, message: impl Into<String>, duration: Duration) -> ToastId {
        let id = self.next_id();
        self.sink.show(Toast { id, kind: ToastKind::Success, message: message.into(), duration: Some(duration) });
        id
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        let id = self.next_id();
        self.sink.show(Toast { id, kind: ToastKind::Error, message: message.into(), duration: Some(self.config.error) });
        id
    }

    /// Show a loading toast that must be resolved with [`PendingToast::succeed`] or [`PendingToast::fail`]
    pub fn loading(&self, message: impl Into<String>) -> PendingToast {
        let id = self.next_id();
        self.sink.show(Toast { id, kind: ToastKind::Loading, message: message.into(), duration: None });
        PendingToast { toaster: self.clone(), id, resolved: false }
    }
}

pub struct PendingToast {
    toaster: Toaster,
    id: ToastId,
    resolved: bool,
}

impl PendingToast {
    pub fn id(&self) -> ToastId { self.id }

    pub fn succeed(mut self, message: impl Into<String>) { self.resolve(ToastKind::Success, message.into(), self.toaster.config.success) }

    pub fn fail(mut self, message: impl Into<String>) { self.resolve(ToastKind::Error, message.into(), self.toaster.config.error) }

    fn resolve(&mut self, kind: ToastKind, message: String, duration: Duration) {
        self.resolved = true;
        self.toaster.sink.show(Toast { id: self.id, kind, message, duration: Some(duration) });
    }
}

/// Dropping an unresolved loading toast dismisses it
impl Drop for PendingToast {
    fn drop(&mut self) {
        if !self.resolved {
            self.toaster.sink.dismiss(self.id);
        }
    }
}

struct Entry {
    toast: Toast,
    shown: Instant,
}

/// How many shown toasts [`ToastQueue::history`] keeps
pub const HISTORY_LIMIT: usize = 256;

/// In-memory toast queue with expiry, plus a history of the last [`HISTORY_LIMIT`] toasts shown
pub struct ToastQueue {
    max: usize,
    queue: Mutex<VecDeque<Entry>>,
    history: Mutex<VecDeque<Toast>>,
}

impl ToastQueue {
    /// At most `max` toasts are up at once; a `max` of zero is treated as one
    pub fn new(max: usize) -> Self { Self { max: max.max(1), queue: Mutex::new(VecDeque::new()), history: Mutex::new(VecDeque::new()) } }

    /// Toasts still up at `now`, oldest first
    pub fn visible(&self, now: Instant) -> Vec<Toast> {
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.iter().filter(|entry| !expired(entry, now)).map(|entry| entry.toast.clone()).collect()
    }

    /// Drop expired toasts (call once per tick)
    pub fn retain_visible(&self, now: Instant) { self.queue.lock().unwrap_or_else(PoisonError::into_inner).retain(|entry| !expired(entry, now)); }

    /// Toasts shown, oldest first, including each replacement of a loading toast
    pub fn history(&self) -> Vec<Toast> { self.history.lock().unwrap_or_else(PoisonError::into_inner).iter().cloned().collect() }

    pub fn messages(&self) -> Vec<String> { self.history().into_iter().map(|toast| toast.message).collect() }
}

impl Default for ToastQueue {
    fn default() -> Self { Self::new(8) }
}

fn expired(entry: &Entry, now: Instant) -> bool {
    match entry.toast.duration {
        Some(duration) => now.duration_since(entry.shown) >= duration,
        None => false,
    }
}

impl NotificationSink for ToastQueue {
    fn show(&self, toast: Toast) {
        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            if history.len() >= HISTORY_LIMIT {
                history.pop_front();
            }
            history.push_back(toast.clone());
        }

        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        if let Some(existing) = queue.iter_mut().find(|entry| entry.toast.id == toast.id) {
            existing.toast = toast;
            existing.shown = now;
            return;
        }
        while queue.len() >= self.max {
            queue.pop_front();
        }
        queue.push_back(Entry { toast, shown: now });
    }

    fn dismiss(&self, id: ToastId) { self.queue.lock().unwrap_or_else(PoisonError::into_inner).retain(|entry| entry.toast.id != id); }
}
