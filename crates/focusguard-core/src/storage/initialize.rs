//! First-run defaults and the once-per-day rollover.

use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::config::Config;
use super::keys;
use super::kv::{as_count, KvStore, Record};
use crate::analytics::DayLedger;
use crate::clock::date_key;
use crate::error::StorageError;

/// Entries a brand-new store starts with.
pub fn default_entries(config: &Config, today: NaiveDate) -> Record {
    let settings = config.default_settings();
    let mut entries = Record::new();
    entries.insert(keys::BLOCKED_TODAY.into(), json!(0));
    entries.insert(keys::BLOCKED_TOTAL.into(), json!(0));
    entries.insert(keys::BLOCKED_BY_DATE.into(), json!({}));
    entries.insert(keys::LAST_RESET_DATE.into(), json!(date_key(today)));
    entries.insert(keys::TIME_SAVED_MINUTES.into(), json!(0));
    entries.insert(keys::LONGEST_STREAK.into(), json!(0));
    entries.insert(keys::CURRENT_STREAK.into(), json!(0));
    entries.insert(keys::EXTENSION_ENABLED.into(), json!(settings.extension_enabled));
    entries.insert(keys::COUNTDOWN_DURATION.into(), json!(settings.countdown_duration));
    entries.insert(keys::REDIRECT_URL.into(), json!(settings.redirect_url));
    entries
}

/// Fill in missing defaults and apply the day transition if `today` differs
/// from the stored `last_reset_date`. Returns the mapping that was written.
///
/// Safe to call on every page load; a second call on the same date leaves
/// every counter as it was.
pub async fn initialize<S: KvStore>(
    store: &S,
    config: &Config,
    today: NaiveDate,
) -> Result<Record, StorageError> {
    let data = store.get_all().await?;
    let today_key = date_key(today);

    let mut merged = default_entries(config, today);
    for (key, value) in &data {
        merged.insert(key.clone(), value.clone());
    }

    let last_reset = data.get(keys::LAST_RESET_DATE).and_then(Value::as_str);
    if last_reset != Some(today_key.as_str()) {
        let before = DayLedger {
            blocked_today: as_count(data.get(keys::BLOCKED_TODAY)),
            current_streak: as_count(data.get(keys::CURRENT_STREAK)),
            longest_streak: as_count(data.get(keys::LONGEST_STREAK)),
        };
        let after = before.roll_over();
        info!(
            from = last_reset.unwrap_or("<none>"),
            to = %today_key,
            current_streak = after.current_streak,
            "day transition"
        );

        merged.insert(keys::BLOCKED_TODAY.into(), json!(after.blocked_today));
        merged.insert(keys::CURRENT_STREAK.into(), json!(after.current_streak));
        merged.insert(keys::LONGEST_STREAK.into(), json!(after.longest_streak));
        merged.insert(keys::LAST_RESET_DATE.into(), json!(today_key));
    }

    store.set_all(merged.clone()).await?;
    debug!(keys = merged.len(), "storage initialized");
    Ok(merged)
}
