use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use ts_rs::TS;

/// Storage key holding the [`RetentionConfig`].
pub const RETENTION_CONFIG_KEY: &str = "cleanupConfig";

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// How long visits are kept before the retention sweep evicts them.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    TS,
    Display,
    EnumString,
    EnumIter,
)]
pub enum RetentionPeriod {
    #[serde(rename = "1w")]
    #[ts(rename = "1w")]
    #[strum(serialize = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    #[ts(rename = "1m")]
    #[strum(serialize = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    #[ts(rename = "3m")]
    #[strum(serialize = "3m")]
    ThreeMonths,
    #[serde(rename = "1y")]
    #[ts(rename = "1y")]
    #[strum(serialize = "1y")]
    OneYear,
    #[default]
    #[serde(rename = "never")]
    #[ts(rename = "never")]
    #[strum(serialize = "never")]
    Never,
}

impl RetentionPeriod {
    /// Maximum age of a kept visit, `None` when eviction is disabled.
    pub fn max_age(self) -> Option<Duration> {
        let days = match self {
            RetentionPeriod::OneWeek => 7,
            RetentionPeriod::OneMonth => 30,
            RetentionPeriod::ThreeMonths => 90,
            RetentionPeriod::OneYear => 365,
            RetentionPeriod::Never => return None,
        };
        Some(DAY * days)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(rename_all = "camelCase")]
pub struct RetentionConfig {
    pub period: RetentionPeriod,
    /// Milliseconds since the Unix epoch of the last sweep that ran, `0` if none.
    #[serde(default)]
    #[ts(type = "number")]
    pub last_cleanup: i64,
}

impl RetentionConfig {
    pub fn new(period: RetentionPeriod) -> Self {
        Self {
            period,
            last_cleanup: 0,
        }
    }

    /// Timestamp at or below which visits are evicted, `None` when eviction
    /// is disabled.
    pub fn cutoff(&self, now_ms: i64) -> Option<i64> {
        let max_age = self.period.max_age()?;
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        Some(now_ms.saturating_sub(max_age_ms))
    }
}
