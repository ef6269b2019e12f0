//! Day-transition arithmetic for the daily counter and the block streak.
//!
//! A streak counts consecutive days with at least one recorded block. It is
//! advanced lazily: the first initialization on a new calendar date looks
//! at the counter left over from the previous active day.

use serde::{Deserialize, Serialize};

/// The counters a day transition reads and rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayLedger {
    pub blocked_today: u64,
    pub current_streak: u64,
    pub longest_streak: u64,
}

impl DayLedger {
    /// Counters after moving to a new calendar date.
    ///
    /// - `blocked_today` starts over at 0
    /// - the streak grows by one if the previous day had any block,
    ///   otherwise it is broken
    /// - `longest_streak` never drops below `current_streak`
    pub fn roll_over(self) -> Self {
        let current_streak = if self.blocked_today > 0 {
            self.current_streak + 1
        } else {
            0
        };
        Self {
            blocked_today: 0,
            current_streak,
            longest_streak: self.longest_streak.max(current_streak),
        }
    }
}
