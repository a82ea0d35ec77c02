use crate::error::StorageError;
use crate::notifier::ChangeNotifier;
use crate::storage::KeyValueStore;
use crate::storage::set_item;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use xtrail_protocol::HISTORY_KEY;
use xtrail_protocol::HistoryMessage;
use xtrail_protocol::VisitRecord;

/// Ordered, deduplicated visit history (newest first).
///
/// The collection is loaded from the key/value store on first use and every
/// mutation rewrites it in full. All reads and writes go through one async
/// mutex, so an upsert and a retention sweep can never interleave their
/// read-modify-write halves.
///
/// When persisting fails the in-memory change is kept and the error is
/// returned; the next successful write carries it to disk.
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    notifier: ChangeNotifier,
    records: Mutex<Option<Vec<VisitRecord>>>,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, notifier: ChangeNotifier) -> Self {
        Self {
            kv,
            notifier,
            records: Mutex::new(None),
        }
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Snapshot of the whole history.
    pub async fn load_all(&self) -> Result<Vec<VisitRecord>, StorageError> {
        let mut guard = self.records.lock().await;
        Ok(self.loaded(&mut guard).await?.clone())
    }

    pub async fn contains(&self, content_id: &str) -> Result<bool, StorageError> {
        let mut guard = self.records.lock().await;
        let records = self.loaded(&mut guard).await?;
        Ok(records.iter().any(|record| record.content_id == content_id))
    }

    /// Records whose author, summary or content contain `needle`, newest first.
    pub async fn search(&self, needle: &str) -> Result<Vec<VisitRecord>, StorageError> {
        let mut guard = self.records.lock().await;
        let records = self.loaded(&mut guard).await?;
        Ok(records
            .iter()
            .filter(|record| record.matches(needle))
            .cloned()
            .collect())
    }

    /// Inserts `record` at the head unless its `content_id` is already known.
    /// Returns whether the history changed.
    pub async fn upsert_if_absent(&self, record: VisitRecord) -> Result<bool, StorageError> {
        let mut guard = self.records.lock().await;
        let records = self.loaded(&mut guard).await?;
        if records
            .iter()
            .any(|existing| existing.content_id == record.content_id)
        {
            return Ok(false);
        }
        records.insert(0, record.clone());
        set_item(self.kv.as_ref(), HISTORY_KEY, records.as_slice()).await?;
        self.notifier.notify(HistoryMessage::inserted(record));
        Ok(true)
    }

    /// Keeps only the records satisfying `keep`. Returns how many were removed;
    /// nothing is written when that is zero.
    pub async fn sweep<F>(&self, keep: F) -> Result<usize, StorageError>
    where
        F: FnMut(&VisitRecord) -> bool,
    {
        let mut guard = self.records.lock().await;
        let records = self.loaded(&mut guard).await?;
        let before = records.len();
        records.retain(keep);
        let removed = before - records.len();
        if removed == 0 {
            return Ok(0);
        }
        set_item(self.kv.as_ref(), HISTORY_KEY, records.as_slice()).await?;
        self.notifier.notify(HistoryMessage::swept());
        Ok(removed)
    }

    async fn loaded<'a>(
        &self,
        slot: &'a mut Option<Vec<VisitRecord>>,
    ) -> Result<&'a mut Vec<VisitRecord>, StorageError> {
        if slot.is_none() {
            let stored = match self.kv.get(HISTORY_KEY).await {
                Ok(stored) => stored,
                Err(err @ StorageError::Decode { .. }) => {
                    warn!(error = %err, "stored visit history is unreadable; starting empty");
                    None
                }
                Err(err) => return Err(err),
            };
            *slot = Some(decode_history(stored));
        }
        Ok(slot.get_or_insert_with(Vec::new))
    }
}

/// Tolerant decode of the persisted history: unreadable entries are skipped
/// and repeated ids keep their first (newest) occurrence.
fn decode_history(stored: Option<Value>) -> Vec<VisitRecord> {
    let items = match stored {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(
                kind = json_kind(&other),
                "stored visit history is not a list; starting empty"
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<VisitRecord>(item) {
            Ok(record) => {
                if seen.insert(record.content_id.clone()) {
                    records.push(record);
                }
            }
            Err(err) => warn!(error = %err, "skipping unreadable visit record"),
        }
    }
    records
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
