use crate::error::Result;
use crate::error::StorageError;
use crate::now_millis;
use crate::storage::KeyValueStore;
use crate::storage::get_item;
use crate::storage::set_item;
use crate::store::HistoryStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;
use xtrail_protocol::RETENTION_CONFIG_KEY;
use xtrail_protocol::RetentionConfig;

/// What started a retention pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepTrigger {
    Startup,
    Timer,
    ConfigChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// No config stored, or the period is `never`.
    Disabled,
    Swept { cutoff: i64, removed: usize },
}

/// The persisted [`RetentionConfig`] and its change signal.
///
/// External updates and the `lastCleanup` bookkeeping both go through one
/// lock, so bookkeeping re-reads the config and only touches its own field.
pub struct RetentionSettings {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
    changed: Notify,
}

impl RetentionSettings {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
            changed: Notify::new(),
        }
    }

    pub async fn load(&self) -> std::result::Result<Option<RetentionConfig>, StorageError> {
        get_item(self.kv.as_ref(), RETENTION_CONFIG_KEY).await
    }

    /// Stores `config` and wakes the retention loop.
    pub async fn update(&self, config: RetentionConfig) -> std::result::Result<(), StorageError> {
        {
            let _guard = self.write_lock.lock().await;
            set_item(self.kv.as_ref(), RETENTION_CONFIG_KEY, &config).await?;
        }
        self.changed.notify_one();
        Ok(())
    }

    async fn record_cleanup(&self, now_ms: i64) -> std::result::Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let Some(mut config) = self.load().await? else {
            return Ok(());
        };
        config.last_cleanup = now_ms;
        set_item(self.kv.as_ref(), RETENTION_CONFIG_KEY, &config).await
    }

    async fn changed(&self) {
        self.changed.notified().await;
    }
}

/// Evicts history entries older than the configured retention period.
pub struct RetentionPolicy {
    store: Arc<HistoryStore>,
    settings: Arc<RetentionSettings>,
}

impl RetentionPolicy {
    pub fn new(store: Arc<HistoryStore>, settings: Arc<RetentionSettings>) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &Arc<RetentionSettings> {
        &self.settings
    }

    /// One pass as of `now_ms`. Records with `timestamp > now - period`
    /// survive; everything else is removed.
    pub async fn sweep_at(&self, now_ms: i64) -> Result<SweepOutcome> {
        let Some(config) = self.settings.load().await? else {
            return Ok(SweepOutcome::Disabled);
        };
        let Some(cutoff) = config.cutoff(now_ms) else {
            return Ok(SweepOutcome::Disabled);
        };
        let removed = self
            .store
            .sweep(|record| record.timestamp > cutoff)
            .await?;
        if let Err(err) = self.settings.record_cleanup(now_ms).await {
            warn!(error = %err, "failed to record last cleanup time");
        }
        Ok(SweepOutcome::Swept { cutoff, removed })
    }

    /// Runs a pass now and logs the result. Never fails; a broken pass is
    /// retried on the next trigger.
    pub async fn run_once(&self, trigger: SweepTrigger) -> Option<SweepOutcome> {
        match self.sweep_at(now_millis()).await {
            Ok(outcome @ SweepOutcome::Swept { cutoff, removed }) if removed > 0 => {
                info!(?trigger, cutoff, removed, "evicted expired visits");
                Some(outcome)
            }
            Ok(outcome) => {
                debug!(?trigger, ?outcome, "retention pass finished");
                Some(outcome)
            }
            Err(err) => {
                warn!(?trigger, error = %err, "retention pass failed");
                None
            }
        }
    }

    /// Startup pass, then one pass per `interval` tick and per config change
    /// until `cancel` fires.
    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        self.run_once(SweepTrigger::Startup).await;

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately and the startup pass covered it.
        ticker.tick().await;

        loop {
            let trigger = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.settings.changed() => SweepTrigger::ConfigChanged,
                _ = ticker.tick() => SweepTrigger::Timer,
            };
            self.run_once(trigger).await;
        }
        debug!("retention loop stopped");
    }
}
