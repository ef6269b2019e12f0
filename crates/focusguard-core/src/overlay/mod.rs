//! Warning overlay with a countdown that ends in a redirect.
//!
//! ## State Transitions
//!
//! ```text
//! Hidden -> Showing -> Counting -> Redirecting
//!    \         \          \
//!     +---------+----------+--> Removed
//! ```
//!
//! `Showing` only lasts while the overlay waits for a body. Like the timer
//! engine it is driven from outside: the host delivers timer events and
//! the overlay reacts.

mod template;

pub use template::overlay_node;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{Event, HostEvent, RedirectReason};
use crate::page::{Page, ReadyState};
use crate::storage::Config;
use crate::timers::{TimerId, TimerKind, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayState {
    Hidden,
    /// Waiting for a body to attach to.
    Showing,
    Counting,
    Redirecting,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyWait {
    None,
    DomContentLoaded,
    Retry(TimerId),
}

#[derive(Debug, Clone)]
pub struct WarningOverlay {
    overlay_id: String,
    countdown_id: String,
    duration: u32,
    interval: Duration,
    body_retry: Duration,
    redirect_url: String,
    state: OverlayState,
    remaining: u32,
    tick: Option<TimerId>,
    wait: BodyWait,
}

impl WarningOverlay {
    pub fn new(config: &Config) -> Self {
        Self {
            overlay_id: config.markers.warning_overlay_id.clone(),
            countdown_id: config.markers.countdown_id.clone(),
            duration: config.countdown.duration_secs,
            interval: config.countdown_interval(),
            body_retry: config.body_check_retry_delay(),
            redirect_url: config.blocking.redirect_url.clone(),
            state: OverlayState::Hidden,
            remaining: 0,
            tick: None,
            wait: BodyWait::None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn overlay_id(&self) -> &str {
        &self.overlay_id
    }

    pub fn countdown_id(&self) -> &str {
        &self.countdown_id
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Display the overlay and start counting down.
    ///
    /// Without a body the overlay waits for `DOMContentLoaded` while the
    /// document is still parsing, or polls every few milliseconds
    /// otherwise. An overlay that is already shown is replaced.
    pub fn show(&mut self, page: &mut impl Page, timers: &mut impl Timers) -> Vec<Event> {
        if !page.has_body() {
            self.state = OverlayState::Showing;
            if self.wait != BodyWait::None {
                return Vec::new();
            }
            self.wait = if page.ready_state() == ReadyState::Loading {
                BodyWait::DomContentLoaded
            } else {
                BodyWait::Retry(timers.set_timeout(self.body_retry, TimerKind::OverlayBodyRetry))
            };
            return vec![Event::OverlayDeferred];
        }
        self.wait = BodyWait::None;

        page.remove(&self.overlay_id);
        self.remaining = self.duration;
        page.append_to_body(overlay_node(&self.overlay_id, &self.countdown_id, self.remaining));
        debug!("warning overlay displayed");

        self.tick = Some(timers.set_interval(self.interval, TimerKind::CountdownTick));
        self.state = OverlayState::Counting;
        vec![Event::OverlayShown {
            remaining: self.remaining,
        }]
    }

    /// Delete the overlay element. Pending timers are left alone and are
    /// ignored when they fire.
    pub fn remove(&mut self, page: &mut impl Page) -> bool {
        self.wait = BodyWait::None;
        if self.state != OverlayState::Hidden {
            self.state = OverlayState::Removed;
        }
        let removed = page.remove(&self.overlay_id);
        if removed {
            debug!("warning overlay removed");
        }
        removed
    }

    /// React to a host event. Anything unrelated to the overlay is ignored.
    pub fn handle(
        &mut self,
        event: &HostEvent,
        page: &mut impl Page,
        timers: &mut impl Timers,
    ) -> Vec<Event> {
        match event {
            HostEvent::DomContentLoaded if self.wait == BodyWait::DomContentLoaded => {
                self.wait = BodyWait::None;
                self.show(page, timers)
            }
            HostEvent::Timer {
                id,
                kind: TimerKind::OverlayBodyRetry,
            } if self.wait == BodyWait::Retry(*id) => {
                self.wait = BodyWait::None;
                self.show(page, timers)
            }
            HostEvent::Timer {
                id,
                kind: TimerKind::CountdownTick,
            } => self.on_tick(*id, page, timers),
            _ => Vec::new(),
        }
    }

    fn on_tick(&mut self, id: TimerId, page: &mut impl Page, timers: &mut impl Timers) -> Vec<Event> {
        if self.tick != Some(id) || self.state != OverlayState::Counting {
            debug!(timer = id.0, "stale countdown tick");
            timers.clear(id);
            return Vec::new();
        }

        self.remaining = self.remaining.saturating_sub(1);
        // The element may have been removed by the page; keep counting.
        page.set_text(&self.countdown_id, &self.remaining.to_string());
        let mut events = vec![Event::CountdownTick {
            remaining: self.remaining,
        }];

        if self.remaining == 0 {
            timers.clear(id);
            self.tick = None;
            self.state = OverlayState::Redirecting;
            debug!("countdown completed, redirecting");
            page.replace_location(&self.redirect_url);
            events.push(Event::Redirected {
                url: self.redirect_url.clone(),
                reason: RedirectReason::Countdown,
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SimulatedPage;
    use crate::timers::VirtualTimers;

    const SHORTS: &str = "https://www.youtube.com/shorts/abc123";

    fn run(
        overlay: &mut WarningOverlay,
        page: &mut SimulatedPage,
        timers: &mut VirtualTimers,
        until_ms: u64,
    ) -> Vec<Event> {
        let deadline = Duration::from_millis(until_ms);
        let mut events = Vec::new();
        while let Some(fired) = timers.pop_due(deadline) {
            events.extend(overlay.handle(&fired.into(), page, timers));
        }
        events
    }

    #[test]
    fn counts_down_then_redirects() {
        let config = Config::default();
        let mut overlay = WarningOverlay::new(&config);
        let mut page = SimulatedPage::new(SHORTS);
        let mut timers = VirtualTimers::new();

        overlay.show(&mut page, &mut timers);
        assert_eq!(overlay.state(), OverlayState::Counting);
        let count = page.element(overlay.countdown_id()).unwrap();
        assert_eq!(count.text.as_deref(), Some("3"));

        let events = run(&mut overlay, &mut page, &mut timers, 1000);
        assert_eq!(events.len(), 2);
        let count = page.element(overlay.countdown_id()).unwrap();
        assert_eq!(count.text.as_deref(), Some("1"));

        let events = run(&mut overlay, &mut page, &mut timers, 1500);
        assert_eq!(overlay.state(), OverlayState::Redirecting);
        assert_eq!(page.redirects(), ["https://www.youtube.com/"]);
        assert!(matches!(
            events.last(),
            Some(Event::Redirected { reason: RedirectReason::Countdown, .. })
        ));
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn double_show_keeps_one_overlay() {
        let config = Config::default();
        let mut overlay = WarningOverlay::new(&config);
        let mut page = SimulatedPage::new(SHORTS);
        let mut timers = VirtualTimers::new();

        overlay.show(&mut page, &mut timers);
        run(&mut overlay, &mut page, &mut timers, 500);
        overlay.show(&mut page, &mut timers);
        assert_eq!(page.count_id(overlay.overlay_id()), 1);
        assert_eq!(overlay.remaining(), 3);

        // The first interval is dropped the next time it fires.
        run(&mut overlay, &mut page, &mut timers, 1000);
        assert_eq!(overlay.remaining(), 2);
        assert_eq!(timers.pending_count(), 1);
    }

    #[test]
    fn waits_for_dom_content_loaded_while_parsing() {
        let config = Config::default();
        let mut overlay = WarningOverlay::new(&config);
        let mut page = SimulatedPage::loading(SHORTS);
        let mut timers = VirtualTimers::new();

        assert_eq!(overlay.show(&mut page, &mut timers), vec![Event::OverlayDeferred]);
        assert_eq!(overlay.state(), OverlayState::Showing);
        assert_eq!(timers.pending_count(), 0);

        page.finish_loading();
        let events = overlay.handle(&HostEvent::DomContentLoaded, &mut page, &mut timers);
        assert_eq!(events, vec![Event::OverlayShown { remaining: 3 }]);
        assert!(page.contains(overlay.overlay_id()));
    }

    #[test]
    fn polls_for_body_after_parsing() {
        let config = Config::default();
        let mut overlay = WarningOverlay::new(&config);
        let mut page = SimulatedPage::loading(SHORTS);
        page.set_ready_state(ReadyState::Interactive);
        let mut timers = VirtualTimers::new();

        overlay.show(&mut page, &mut timers);
        run(&mut overlay, &mut page, &mut timers, 30);
        assert_eq!(overlay.state(), OverlayState::Showing);

        page.attach_body();
        run(&mut overlay, &mut page, &mut timers, 40);
        assert_eq!(overlay.state(), OverlayState::Counting);
    }

    #[test]
    fn removed_overlay_never_redirects() {
        let config = Config::default();
        let mut overlay = WarningOverlay::new(&config);
        let mut page = SimulatedPage::new(SHORTS);
        let mut timers = VirtualTimers::new();

        overlay.show(&mut page, &mut timers);
        assert!(overlay.remove(&mut page));
        assert!(!overlay.remove(&mut page));
        run(&mut overlay, &mut page, &mut timers, 5000);

        assert_eq!(overlay.state(), OverlayState::Removed);
        assert!(page.redirects().is_empty());
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn missing_countdown_element_is_tolerated() {
        let config = Config::default();
        let mut overlay = WarningOverlay::new(&config);
        let mut page = SimulatedPage::new(SHORTS);
        let mut timers = VirtualTimers::new();

        overlay.show(&mut page, &mut timers);
        page.remove(overlay.countdown_id());
        run(&mut overlay, &mut page, &mut timers, 1500);
        assert_eq!(page.redirects().len(), 1);
    }
}
