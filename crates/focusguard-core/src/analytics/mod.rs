//! Local usage analytics.
//!
//! Everything is derived from the persisted store: daily and lifetime
//! block counts, a per-date history, the block streak and an estimate of
//! time not spent watching short-form videos. Nothing leaves the device.

mod streak;

pub use streak::DayLedger;

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::clock::{date_key, Clock};
use crate::error::StorageError;
use crate::storage::{as_count, json_number, keys, KvStore, Record};

/// Snapshot returned by [`Analytics::stats`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub today: u64,
    pub total: u64,
    /// Rounded to whole minutes.
    pub time_saved_minutes: u64,
    /// Rounded to one decimal.
    pub time_saved_hours: f64,
    pub current_streak: u64,
    pub longest_streak: u64,
    pub by_date: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: String,
    pub count: u64,
}

/// Day-by-day totals over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeStats {
    pub total: u64,
    pub dates: Vec<DayCount>,
}

/// Ledger operations over a store handle and a calendar.
pub struct Analytics<'a, S, C> {
    store: &'a S,
    clock: &'a C,
    minutes_per_block: f64,
}

impl<'a, S: KvStore, C: Clock> Analytics<'a, S, C> {
    pub fn new(store: &'a S, clock: &'a C) -> Self {
        Self {
            store,
            clock,
            minutes_per_block: crate::storage::Config::default()
                .analytics
                .minutes_per_block,
        }
    }

    pub fn with_minutes_per_block(mut self, minutes: f64) -> Self {
        self.minutes_per_block = minutes;
        self
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Record one blocked video and return the refreshed snapshot.
    ///
    /// Store failures are logged and swallowed; increments that already
    /// landed are kept.
    pub async fn record_block(&self) -> Option<StatsSnapshot> {
        match self.try_record_block().await {
            Ok(stats) => {
                debug!(today = stats.today, total = stats.total, "block recorded");
                Some(stats)
            }
            Err(e) => {
                error!(error = %e, "failed to record block");
                None
            }
        }
    }

    async fn try_record_block(&self) -> Result<StatsSnapshot, StorageError> {
        self.store.increment(keys::BLOCKED_TODAY, 1.0).await?;
        self.store.increment(keys::BLOCKED_TOTAL, 1.0).await?;

        let today = date_key(self.clock.today());
        let mut by_date = match self.store.get(keys::BLOCKED_BY_DATE).await? {
            Some(Value::Object(map)) => map,
            _ => Record::new(),
        };
        let count = as_count(by_date.get(&today)) + 1;
        by_date.insert(today, Value::from(count));
        self.store
            .set(keys::BLOCKED_BY_DATE, Value::Object(by_date))
            .await?;

        self.store
            .increment(keys::TIME_SAVED_MINUTES, self.minutes_per_block)
            .await?;

        self.stats().await
    }

    /// Read-only snapshot of every counter.
    pub async fn stats(&self) -> Result<StatsSnapshot, StorageError> {
        let data = self.store.get_all().await?;
        let minutes = data
            .get(keys::TIME_SAVED_MINUTES)
            .and_then(Value::as_f64)
            .filter(|m| *m > 0.0)
            .unwrap_or(0.0);

        Ok(StatsSnapshot {
            today: as_count(data.get(keys::BLOCKED_TODAY)),
            total: as_count(data.get(keys::BLOCKED_TOTAL)),
            time_saved_minutes: minutes.round() as u64,
            time_saved_hours: (minutes / 60.0 * 10.0).round() / 10.0,
            current_streak: as_count(data.get(keys::CURRENT_STREAK)),
            longest_streak: as_count(data.get(keys::LONGEST_STREAK)),
            by_date: by_date_counts(data.get(keys::BLOCKED_BY_DATE)),
        })
    }

    /// Inclusive day-by-day totals between two dates. Days without an
    /// entry count as 0; a reversed range is empty.
    pub async fn stats_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> crate::error::Result<RangeStats> {
        let by_date = by_date_counts(self.store.get(keys::BLOCKED_BY_DATE).await?.as_ref());
        let mut stats = RangeStats::default();
        for day in start.iter_days().take_while(|d| *d <= end) {
            let key = date_key(day);
            let count = by_date.get(&key).copied().unwrap_or(0);
            stats.total += count;
            stats.dates.push(DayCount { date: key, count });
        }
        Ok(stats)
    }

    /// Last 7 days including today.
    pub async fn week_stats(&self) -> crate::error::Result<RangeStats> {
        self.trailing_days(7).await
    }

    /// Last 30 days including today.
    pub async fn month_stats(&self) -> crate::error::Result<RangeStats> {
        self.trailing_days(30).await
    }

    async fn trailing_days(&self, days: u64) -> crate::error::Result<RangeStats> {
        let end = self.clock.today();
        let start = end.checked_sub_days(Days::new(days - 1)).unwrap_or(end);
        self.stats_for_range(start, end).await
    }

    /// Zero every analytics counter. Settings are not touched.
    pub async fn reset(&self) -> Result<(), StorageError> {
        let mut entries = Record::new();
        entries.insert(keys::BLOCKED_TODAY.into(), Value::from(0u64));
        entries.insert(keys::BLOCKED_TOTAL.into(), Value::from(0u64));
        entries.insert(keys::BLOCKED_BY_DATE.into(), Value::Object(Record::new()));
        entries.insert(keys::TIME_SAVED_MINUTES.into(), json_number(0.0));
        entries.insert(keys::LONGEST_STREAK.into(), Value::from(0u64));
        entries.insert(keys::CURRENT_STREAK.into(), Value::from(0u64));
        self.store.set_all(entries).await?;
        info!("analytics reset");
        Ok(())
    }
}

fn by_date_counts(value: Option<&Value>) -> BTreeMap<String, u64> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(date, count)| (date.clone(), as_count(Some(count))))
            .collect(),
        _ => BTreeMap::new(),
    }
}
