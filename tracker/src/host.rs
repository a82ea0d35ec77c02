//! Seams to the embedding browser.
//!
//! The tracker never talks to a concrete browser API. Navigation triggers
//! arrive through a [`SignalSource`] and page titles are looked up through a
//! [`HostBrowser`].

use async_trait::async_trait;
use tokio::sync::mpsc;

/// One raw navigation trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSignal {
    /// Page content changed. Debounced. `None` means the active tab.
    Mutation { url: Option<String> },
    /// A tab finished loading `url`. Throttled.
    TabUpdated { url: String },
    /// Explicit request to check a page. Throttled. `None` means the active tab.
    CheckNow { url: Option<String> },
}

impl NavigationSignal {
    pub fn url(&self) -> Option<&str> {
        match self {
            NavigationSignal::Mutation { url } | NavigationSignal::CheckNow { url } => {
                url.as_deref()
            }
            NavigationSignal::TabUpdated { url } => Some(url),
        }
    }

    pub(crate) fn is_debounced(&self) -> bool {
        matches!(self, NavigationSignal::Mutation { .. })
    }
}

/// Stream of [`NavigationSignal`]s.
///
/// `next_signal` is polled inside `tokio::select!` and must be cancel safe:
/// dropping the future before it resolves must not lose a signal.
#[async_trait]
pub trait SignalSource: Send {
    /// `None` once the source is closed for good.
    async fn next_signal(&mut self) -> Option<NavigationSignal>;
}

#[async_trait]
impl SignalSource for mpsc::Receiver<NavigationSignal> {
    async fn next_signal(&mut self) -> Option<NavigationSignal> {
        self.recv().await
    }
}

#[async_trait]
impl SignalSource for mpsc::UnboundedReceiver<NavigationSignal> {
    async fn next_signal(&mut self) -> Option<NavigationSignal> {
        self.recv().await
    }
}

/// What the host knows about an open tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabInfo {
    pub url: Option<String>,
    pub title: Option<String>,
}

#[async_trait]
pub trait HostBrowser: Send + Sync {
    /// URL of the focused tab, if there is one.
    async fn active_tab_url(&self) -> anyhow::Result<Option<String>>;

    /// Open tabs currently showing `url`.
    async fn tabs_matching(&self, url: &str) -> anyhow::Result<Vec<TabInfo>>;
}
