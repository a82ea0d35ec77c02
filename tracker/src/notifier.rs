use tokio::sync::broadcast;
use tracing::trace;
use xtrail_protocol::HistoryMessage;

/// Fan-out of [`HistoryMessage`]s to whoever is currently listening.
///
/// Delivery is best effort: nothing is buffered for listeners that subscribe
/// later, and a lagging listener only loses its own backlog.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<HistoryMessage>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryMessage> {
        self.tx.subscribe()
    }

    pub fn notify(&self, message: HistoryMessage) {
        if self.tx.send(message).is_err() {
            trace!("history changed with no listeners attached");
        }
    }
}
