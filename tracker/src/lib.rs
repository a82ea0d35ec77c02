//! Browsing-history tracker for single-content pages.
//!
//! Navigation signals from the host are coalesced, matched against the
//! tracked hosts and, when the page title carries the expected metadata,
//! stored as [`VisitRecord`]s in a deduplicated newest-first history. A
//! retention loop evicts records older than the configured period.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use xtrail_tracker::{HostBrowser, NavigationSignal, Tracker, TrackerConfig};
//! # async fn demo(host: Arc<dyn HostBrowser>) -> xtrail_tracker::Result<()> {
//! let tracker = Tracker::open(TrackerConfig::load()?, host)?;
//! let mut updates = tracker.subscribe();
//! let (tx, rx) = tokio::sync::mpsc::channel(32);
//! let handle = tracker.start(rx);
//!
//! tx.send(NavigationSignal::TabUpdated {
//!     url: "https://x.com/alice/status/42".to_string(),
//! })
//! .await
//! .ok();
//! let _ = updates.recv().await;
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod coalescer;
mod config;
mod error;
mod extractor;
mod host;
mod matcher;
mod notifier;
mod pipeline;
mod retention;
mod storage;
mod store;
mod tracker;

pub use coalescer::CoalesceMode;
pub use coalescer::Coalescer;
pub use coalescer::EventCoalescer;
pub use config::CONFIG_ENV_VAR;
pub use config::TrackerConfig;
pub use error::Result;
pub use error::StorageError;
pub use error::TrackerError;
pub use extractor::MetadataExtractor;
pub use extractor::PageMetadata;
pub use host::HostBrowser;
pub use host::NavigationSignal;
pub use host::SignalSource;
pub use host::TabInfo;
pub use matcher::ContentRef;
pub use matcher::NavigationMatcher;
pub use notifier::ChangeNotifier;
pub use pipeline::CheckOutcome;
pub use pipeline::NavigationPipeline;
pub use retention::RetentionPolicy;
pub use retention::RetentionSettings;
pub use retention::SweepOutcome;
pub use retention::SweepTrigger;
pub use storage::JsonFileStore;
pub use storage::KeyValueStore;
pub use storage::MemoryStore;
pub use storage::get_item;
pub use storage::set_item;
pub use store::HistoryStore;
pub use tracker::Tracker;
pub use tracker::TrackerHandle;
pub use xtrail_protocol::HISTORY_KEY;
pub use xtrail_protocol::HistoryMessage;
pub use xtrail_protocol::RETENTION_CONFIG_KEY;
pub use xtrail_protocol::RetentionConfig;
pub use xtrail_protocol::RetentionPeriod;
pub use xtrail_protocol::VisitRecord;

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Milliseconds since the Unix epoch, `0` if the clock is before it.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
