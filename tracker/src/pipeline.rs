use crate::error::Result;
use crate::error::TrackerError;
use crate::extractor::MetadataExtractor;
use crate::host::HostBrowser;
use crate::matcher::NavigationMatcher;
use crate::now_millis;
use crate::store::HistoryStore;
use std::sync::Arc;
use tracing::warn;
use xtrail_protocol::VisitRecord;

/// Result of checking one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Recorded(VisitRecord),
    /// The content id is already in the history.
    Duplicate,
    NotTrackable,
    /// No title, or a title outside the expected grammar. Nothing is stored.
    NoMetadata,
}

/// classify → dedup → title lookup → extract → record.
pub struct NavigationPipeline {
    matcher: NavigationMatcher,
    extractor: MetadataExtractor,
    store: Arc<HistoryStore>,
    host: Arc<dyn HostBrowser>,
}

impl NavigationPipeline {
    pub fn new(
        matcher: NavigationMatcher,
        extractor: MetadataExtractor,
        store: Arc<HistoryStore>,
        host: Arc<dyn HostBrowser>,
    ) -> Self {
        Self {
            matcher,
            extractor,
            store,
            host,
        }
    }

    pub async fn check(&self, url: &str) -> Result<CheckOutcome> {
        let content = self
            .matcher
            .classify(url)
            .map_err(|source| TrackerError::MalformedUrl {
                url: url.to_string(),
                source,
            })?;
        let Some(content) = content else {
            return Ok(CheckOutcome::NotTrackable);
        };

        // Saves the tab lookup for pages seen before.
        if self.store.contains(&content.content_id).await? {
            return Ok(CheckOutcome::Duplicate);
        }

        let Some(title) = self.page_title(&content.url).await else {
            return Ok(CheckOutcome::NoMetadata);
        };
        let Some(metadata) = self.extractor.extract(&title) else {
            return Ok(CheckOutcome::NoMetadata);
        };

        let record = VisitRecord {
            content_id: content.content_id,
            url: content.url,
            timestamp: now_millis(),
            author: Some(metadata.author),
            title_summary: Some(metadata.title_summary),
            full_content: Some(metadata.full_content),
        };
        if self.store.upsert_if_absent(record.clone()).await? {
            Ok(CheckOutcome::Recorded(record))
        } else {
            Ok(CheckOutcome::Duplicate)
        }
    }

    async fn page_title(&self, url: &str) -> Option<String> {
        match self.host.tabs_matching(url).await {
            Ok(tabs) => tabs.into_iter().find_map(|tab| tab.title),
            Err(err) => {
                warn!(url, error = %err, "tab lookup failed");
                None
            }
        }
    }
}
