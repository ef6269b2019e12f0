//! Host timers.
//!
//! The core never sleeps and owns no threads. It asks the host to schedule
//! a callback and the host later delivers
//! [`HostEvent::Timer`](crate::events::HostEvent::Timer) with the same id
//! and kind. [`VirtualTimers`] is a deterministic host for tests and the
//! CLI simulator: time only moves when the caller pops due timers.
//!
//! ```ignore
//! let mut timers = VirtualTimers::new();
//! let id = timers.set_timeout(Duration::from_millis(100), TimerKind::ObserverRetry);
//! while let Some(fired) = timers.pop_due(deadline) {
//!     script.handle(&HostEvent::from(fired), &mut page, &mut timers).await;
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// What a timer was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Body was missing when the mutation observer tried to attach.
    ObserverRetry,
    /// Next-tick callback after a wrapped `pushState`/`replaceState`.
    NavigationDeferred,
    /// Overlay waiting for a body after parsing finished.
    OverlayBodyRetry,
    CountdownTick,
    FallbackRedirect,
    /// Stats panel deletion after its hide transition.
    PanelRemoval,
}

/// Scheduling operations a host provides.
pub trait Timers {
    fn set_timeout(&mut self, delay: Duration, kind: TimerKind) -> TimerId;
    fn set_interval(&mut self, period: Duration, kind: TimerKind) -> TimerId;
    /// Unknown or already fired ids are ignored.
    fn clear(&mut self, id: TimerId);
}

/// A timer delivered by [`VirtualTimers::pop_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
    /// Virtual time at which it fired.
    #[serde(with = "millis")]
    pub at: Duration,
}

#[derive(Debug, Clone)]
struct Pending {
    due: Duration,
    period: Option<Duration>,
    kind: TimerKind,
}

/// Deterministic timer host.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimers {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<TimerId, Pending>,
}

/// Intervals shorter than this are clamped so a zero period cannot spin.
const MIN_PERIOD: Duration = Duration::from_millis(1);

impl VirtualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Kinds of all scheduled timers, in id order.
    pub fn pending_kinds(&self) -> Vec<TimerKind> {
        self.pending.values().map(|p| p.kind).collect()
    }

    /// Due time of the next timer, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.values().map(|p| p.due).min()
    }

    /// Fire the earliest timer due at or before `deadline`.
    ///
    /// Ties go to the timer created first. Virtual time moves to the fired
    /// timer's due time; intervals are re-armed one period later. When
    /// nothing is due, time moves to `deadline` and `None` is returned.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<Fired> {
        let next = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= deadline)
            .min_by_key(|(id, p)| (p.due, **id))
            .map(|(id, _)| *id);

        let Some(id) = next else {
            self.now = self.now.max(deadline);
            return None;
        };

        let (kind, due) = match self.pending.get_mut(&id) {
            Some(p) => {
                let fired = (p.kind, p.due);
                match p.period {
                    Some(period) => p.due += period,
                    None => {
                        self.pending.remove(&id);
                    }
                }
                fired
            }
            None => return None,
        };

        self.now = self.now.max(due);
        Some(Fired { id, kind, at: due })
    }

    fn schedule(&mut self, delay: Duration, period: Option<Duration>, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert(
            id,
            Pending {
                due: self.now + delay,
                period,
                kind,
            },
        );
        id
    }
}

impl Timers for VirtualTimers {
    fn set_timeout(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        self.schedule(delay, None, kind)
    }

    fn set_interval(&mut self, period: Duration, kind: TimerKind) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.schedule(period, Some(period), kind)
    }

    fn clear(&mut self, id: TimerId) {
        self.pending.remove(&id);
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
