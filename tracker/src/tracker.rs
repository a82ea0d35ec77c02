use crate::coalescer::CoalesceMode;
use crate::coalescer::EventCoalescer;
use crate::config::TrackerConfig;
use crate::error::Result;
use crate::error::TrackerError;
use crate::extractor::MetadataExtractor;
use crate::host::HostBrowser;
use crate::host::NavigationSignal;
use crate::host::SignalSource;
use crate::matcher::NavigationMatcher;
use crate::notifier::ChangeNotifier;
use crate::pipeline::CheckOutcome;
use crate::pipeline::NavigationPipeline;
use crate::retention::RetentionPolicy;
use crate::retention::RetentionSettings;
use crate::storage::JsonFileStore;
use crate::storage::KeyValueStore;
use crate::store::HistoryStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::sleep_until;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;
use xtrail_protocol::HistoryMessage;
use xtrail_protocol::RetentionConfig;

/// Wires the pipeline, the history store and the retention policy together.
pub struct Tracker {
    config: TrackerConfig,
    store: Arc<HistoryStore>,
    pipeline: Arc<NavigationPipeline>,
    retention: Arc<RetentionPolicy>,
    host: Arc<dyn HostBrowser>,
}

impl Tracker {
    pub fn new(
        config: TrackerConfig,
        kv: Arc<dyn KeyValueStore>,
        host: Arc<dyn HostBrowser>,
    ) -> Result<Self> {
        config.validate().map_err(TrackerError::Config)?;

        let notifier = ChangeNotifier::new(config.notify_capacity);
        let store = Arc::new(HistoryStore::new(kv.clone(), notifier));
        let pipeline = Arc::new(NavigationPipeline::new(
            NavigationMatcher::new(&config.hosts),
            MetadataExtractor::new(config.summary_max_chars),
            store.clone(),
            host.clone(),
        ));
        let settings = Arc::new(RetentionSettings::new(kv));
        let retention = Arc::new(RetentionPolicy::new(store.clone(), settings));

        Ok(Self {
            config,
            store,
            pipeline,
            retention,
            host,
        })
    }

    /// Tracker persisting to JSON files under `config.storage_dir`.
    pub fn open(config: TrackerConfig, host: Arc<dyn HostBrowser>) -> Result<Self> {
        let kv = Arc::new(JsonFileStore::new(config.storage_dir.clone()));
        Self::new(config, kv, host)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryMessage> {
        self.store.notifier().subscribe()
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &Arc<NavigationPipeline> {
        &self.pipeline
    }

    pub fn retention(&self) -> &Arc<RetentionPolicy> {
        &self.retention
    }

    /// Persists a new retention config; a running tracker sweeps right away.
    pub async fn update_retention(&self, config: RetentionConfig) -> Result<()> {
        self.retention.settings().update(config).await?;
        Ok(())
    }

    /// Spawns the signal loop and the retention loop.
    pub fn start<S>(&self, source: S) -> TrackerHandle
    where
        S: SignalSource + 'static,
    {
        let cancel = CancellationToken::new();

        let worker = SignalWorker {
            pipeline: self.pipeline.clone(),
            host: self.host.clone(),
            coalescer: EventCoalescer::new(self.config.debounce(), self.config.throttle()),
        };
        let signals = tokio::spawn(worker.run(source, cancel.clone()));

        let retention = self.retention.clone();
        let interval = self.config.sweep_interval();
        let retention_cancel = cancel.clone();
        let retention = tokio::spawn(async move {
            retention.run(interval, retention_cancel).await;
        });

        info!("visit tracker started");
        TrackerHandle {
            cancel,
            signals,
            retention,
        }
    }
}

/// Running loops of a started [`Tracker`].
pub struct TrackerHandle {
    cancel: CancellationToken,
    signals: JoinHandle<()>,
    retention: JoinHandle<()>,
}

impl TrackerHandle {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops both loops. Pending coalesced signals are dropped; a check that
    /// is already running finishes first.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let (signals, retention) = tokio::join!(self.signals, self.retention);
        report_exit("signal", signals);
        report_exit("retention", retention);
        info!("visit tracker stopped");
    }

    /// Waits for the signal source to close and its pending signals to be
    /// checked, then stops the retention loop.
    pub async fn join(self) {
        let signals = self.signals.await;
        self.cancel.cancel();
        let retention = self.retention.await;
        report_exit("signal", signals);
        report_exit("retention", retention);
        info!("visit tracker stopped");
    }
}

fn report_exit(name: &str, result: std::result::Result<(), JoinError>) {
    if let Err(err) = result
        && !err.is_cancelled()
    {
        warn!(error = %err, "{name} loop panicked");
    }
}

/// Where a coalesced check should look.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CheckTarget {
    Url(String),
    ActiveTab,
}

fn route(signal: NavigationSignal) -> (CoalesceMode, CheckTarget) {
    let mode = if signal.is_debounced() {
        CoalesceMode::Debounce
    } else {
        CoalesceMode::Throttle
    };
    let target = match signal {
        NavigationSignal::Mutation { url } | NavigationSignal::CheckNow { url } => {
            url.map_or(CheckTarget::ActiveTab, CheckTarget::Url)
        }
        NavigationSignal::TabUpdated { url } => CheckTarget::Url(url),
    };
    (mode, target)
}

struct SignalWorker {
    pipeline: Arc<NavigationPipeline>,
    host: Arc<dyn HostBrowser>,
    coalescer: EventCoalescer<CheckTarget>,
}

impl SignalWorker {
    async fn run<S>(mut self, mut source: S, cancel: CancellationToken)
    where
        S: SignalSource,
    {
        loop {
            let deadline = self.coalescer.deadline();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let now = Instant::now();
                    while let Some(target) = self.coalescer.fire(now) {
                        self.dispatch(target).await;
                    }
                }
                signal = source.next_signal() => {
                    let Some(signal) = signal else {
                        for target in self.coalescer.flush() {
                            self.dispatch(target).await;
                        }
                        break;
                    };
                    let (mode, target) = route(signal);
                    if let Some(target) = self.coalescer.trigger(mode, target, Instant::now()) {
                        self.dispatch(target).await;
                    }
                }
            }
        }
        debug!("signal loop stopped");
    }

    async fn dispatch(&mut self, target: CheckTarget) {
        let url = match target {
            CheckTarget::Url(url) => url,
            CheckTarget::ActiveTab => match self.host.active_tab_url().await {
                Ok(Some(url)) => url,
                Ok(None) => {
                    debug!("no active tab to check");
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "active tab lookup failed");
                    return;
                }
            },
        };
        if !self.coalescer.admit(&url) {
            debug!(url = %url, "url unchanged since last check");
            return;
        }

        match self.pipeline.check(&url).await {
            Ok(CheckOutcome::Recorded(record)) => {
                debug!(url = %url, content_id = %record.content_id, "visit recorded");
            }
            Ok(outcome) => debug!(url = %url, ?outcome, "visit not recorded"),
            Err(err) => warn!(url = %url, error = %err, "visit check failed"),
        }
    }
}
