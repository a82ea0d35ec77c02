use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// Storage key holding the ordered visit history (newest first).
pub const HISTORY_KEY: &str = "tweetHistory";

/// One observed visit to a trackable content page.
///
/// `content_id` is the identity of the record: the history never holds two
/// records with the same id. `timestamp` is set when the visit is first
/// recorded and never touched afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(rename_all = "camelCase")]
pub struct VisitRecord {
    /// Numeric id parsed from the `/status/{id}` path segment.
    #[serde(alias = "tweetId")]
    pub content_id: String,
    pub url: String,
    /// Milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub author: Option<String>,
    /// Content prefix, suffixed with `...` when it was cut.
    #[serde(default, alias = "title", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub title_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub full_content: Option<String>,
}

impl VisitRecord {
    /// Case-insensitive substring match over the human readable fields.
    /// An empty needle matches everything.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim();
        if needle.is_empty() {
            return true;
        }
        let lowered = needle.to_lowercase();
        [
            self.author.as_deref(),
            self.title_summary.as_deref(),
            self.full_content.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&lowered))
    }
}
