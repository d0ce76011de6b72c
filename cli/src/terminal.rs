use async_trait::async_trait;
use tracing::debug;

use storemap_core::{images::ImageProbe, NotificationSink, Toast, ToastKind};

/// Prints resolved toasts; loading toasts only show in debug logs
pub struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn show(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Loading => debug!("{}", toast.message),
            ToastKind::Success => println!("ok: {}", toast.message),
            ToastKind::Error => eprintln!("error: {}", toast.message),
        }
    }
}

/// An image is reachable when a GET for it succeeds
pub struct HttpProbe(reqwest::Client);

impl HttpProbe {
    pub fn new() -> Self { Self(reqwest::Client::new()) }
}

impl Default for HttpProbe {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl ImageProbe for HttpProbe {
    async fn reachable(&self, url: &str) -> bool {
        match self.0.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!("HttpProbe.reachable({url}): {err}");
                false
            }
        }
    }
}
