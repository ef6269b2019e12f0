//! Persisted key names. These match the keys written by earlier releases,
//! so existing stores keep their counters.

pub const BLOCKED_TODAY: &str = "shorts_blocked_today";
pub const BLOCKED_TOTAL: &str = "shorts_blocked_total";
pub const BLOCKED_BY_DATE: &str = "shorts_blocked_by_date";
pub const LAST_RESET_DATE: &str = "last_reset_date";
pub const TIME_SAVED_MINUTES: &str = "time_saved_minutes";
pub const CURRENT_STREAK: &str = "current_streak";
pub const LONGEST_STREAK: &str = "longest_streak";

pub const EXTENSION_ENABLED: &str = "extension_enabled";
pub const COUNTDOWN_DURATION: &str = "countdown_duration";
pub const REDIRECT_URL: &str = "redirect_url";
