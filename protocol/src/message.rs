use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

use crate::VisitRecord;

/// Broadcast sent to listeners after the history changed.
///
/// `data` carries the inserted record; bulk sweeps send the bare event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(tag = "type")]
pub enum HistoryMessage {
    #[serde(rename = "HISTORY_UPDATED")]
    #[ts(rename = "HISTORY_UPDATED")]
    HistoryUpdated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        data: Option<VisitRecord>,
    },
}

impl HistoryMessage {
    pub fn inserted(record: VisitRecord) -> Self {
        HistoryMessage::HistoryUpdated { data: Some(record) }
    }

    pub fn swept() -> Self {
        HistoryMessage::HistoryUpdated { data: None }
    }

    pub fn record(&self) -> Option<&VisitRecord> {
        match self {
            HistoryMessage::HistoryUpdated { data } => data.as_ref(),
        }
    }
}
