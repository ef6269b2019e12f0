//! Single-page navigation detection.
//!
//! Three independent signals report that the document's address changed:
//!
//! 1. body subtree mutations, compared against the last address seen;
//! 2. the page's own `pushState`/`replaceState` calls, reported one tick
//!    after the browser applied them;
//! 3. `popstate` for back/forward, reported immediately.
//!
//! The signals overlap on purpose. A single navigation usually produces
//! two or three reports, so whatever runs on them must be idempotent.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::HostEvent;
use crate::page::Page;
use crate::timers::{TimerId, TimerKind, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationSignal {
    Mutation,
    PushState,
    ReplaceState,
    PopState,
}

#[derive(Debug, Clone)]
pub struct NavigationWatcher {
    retry_delay: Duration,
    installed: bool,
    /// Set once the mutation observer is attached to body.
    observing: bool,
    last_href: String,
    observer_retry: Option<TimerId>,
    deferred: Vec<(TimerId, NavigationSignal)>,
}

impl NavigationWatcher {
    /// `retry_delay` is how long to wait between attempts to attach the
    /// mutation observer while body does not exist.
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            retry_delay,
            installed: false,
            observing: false,
            last_href: String::new(),
            observer_retry: None,
            deferred: Vec::new(),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Address the mutation observer last compared against.
    pub fn last_href(&self) -> &str {
        &self.last_href
    }

    /// Start listening. Installing twice is a no-op.
    pub fn install(&mut self, page: &impl Page, timers: &mut impl Timers) {
        if self.installed {
            return;
        }
        self.installed = true;
        self.attach_observer(page, timers);
        debug!("history monitoring initialized");
    }

    fn attach_observer(&mut self, page: &impl Page, timers: &mut impl Timers) {
        if page.has_body() {
            self.last_href = page.href();
            self.observing = true;
            debug!(href = %self.last_href, "mutation observer initialized");
        } else {
            self.observer_retry = Some(timers.set_timeout(self.retry_delay, TimerKind::ObserverRetry));
        }
    }

    /// Feed a host event through the watcher. Returns the signal when the
    /// event means the address may have changed and the callback must run.
    pub fn observe(
        &mut self,
        event: &HostEvent,
        page: &impl Page,
        timers: &mut impl Timers,
    ) -> Option<NavigationSignal> {
        if !self.installed {
            return None;
        }
        match event {
            HostEvent::DomMutated if self.observing => {
                let href = page.href();
                if href == self.last_href {
                    return None;
                }
                debug!(from = %self.last_href, to = %href, "URL changed");
                self.last_href = href;
                Some(NavigationSignal::Mutation)
            }
            HostEvent::HistoryPushed => {
                debug!("pushState called");
                self.defer(NavigationSignal::PushState, timers);
                None
            }
            HostEvent::HistoryReplaced => {
                debug!("replaceState called");
                self.defer(NavigationSignal::ReplaceState, timers);
                None
            }
            HostEvent::PopState => {
                debug!("popstate event detected");
                Some(NavigationSignal::PopState)
            }
            HostEvent::Timer {
                id,
                kind: TimerKind::ObserverRetry,
            } if self.observer_retry == Some(*id) => {
                self.observer_retry = None;
                self.attach_observer(page, timers);
                None
            }
            HostEvent::Timer {
                id,
                kind: TimerKind::NavigationDeferred,
            } => {
                let pos = self.deferred.iter().position(|(t, _)| t == id)?;
                Some(self.deferred.remove(pos).1)
            }
            _ => None,
        }
    }

    fn defer(&mut self, signal: NavigationSignal, timers: &mut impl Timers) {
        let id = timers.set_timeout(Duration::ZERO, TimerKind::NavigationDeferred);
        self.deferred.push((id, signal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SimulatedPage;
    use crate::timers::VirtualTimers;

    const LATER: Duration = Duration::from_secs(10);

    fn drain(
        watcher: &mut NavigationWatcher,
        page: &SimulatedPage,
        timers: &mut VirtualTimers,
    ) -> Vec<NavigationSignal> {
        let mut out = Vec::new();
        while let Some(fired) = timers.pop_due(timers.now()) {
            out.extend(watcher.observe(&fired.into(), page, timers));
        }
        out
    }

    #[test]
    fn mutation_reports_each_address_once() {
        let mut page = SimulatedPage::new("https://www.youtube.com/");
        let mut timers = VirtualTimers::new();
        let mut watcher = NavigationWatcher::new(Duration::from_millis(100));
        watcher.install(&page, &mut timers);

        assert_eq!(watcher.observe(&HostEvent::DomMutated, &page, &mut timers), None);

        page.replace_state("https://www.youtube.com/shorts/abc");
        assert_eq!(
            watcher.observe(&HostEvent::DomMutated, &page, &mut timers),
            Some(NavigationSignal::Mutation)
        );
        assert_eq!(watcher.observe(&HostEvent::DomMutated, &page, &mut timers), None);
    }

    #[test]
    fn push_state_fires_on_next_tick() {
        let mut page = SimulatedPage::new("https://www.youtube.com/");
        let mut timers = VirtualTimers::new();
        let mut watcher = NavigationWatcher::new(Duration::from_millis(100));
        watcher.install(&page, &mut timers);

        page.push_state("https://www.youtube.com/shorts/abc");
        assert_eq!(watcher.observe(&HostEvent::HistoryPushed, &page, &mut timers), None);
        assert_eq!(
            drain(&mut watcher, &page, &mut timers),
            vec![NavigationSignal::PushState]
        );
    }

    #[test]
    fn popstate_fires_immediately() {
        let page = SimulatedPage::new("https://www.youtube.com/");
        let mut timers = VirtualTimers::new();
        let mut watcher = NavigationWatcher::new(Duration::from_millis(100));
        watcher.install(&page, &mut timers);
        assert_eq!(
            watcher.observe(&HostEvent::PopState, &page, &mut timers),
            Some(NavigationSignal::PopState)
        );
    }

    #[test]
    fn observer_waits_for_body() {
        let mut page = SimulatedPage::loading("https://www.youtube.com/shorts/abc");
        let mut timers = VirtualTimers::new();
        let mut watcher = NavigationWatcher::new(Duration::from_millis(100));
        watcher.install(&page, &mut timers);
        assert!(!watcher.is_observing());

        // Mutations before the observer attaches are not seen.
        assert_eq!(watcher.observe(&HostEvent::DomMutated, &page, &mut timers), None);

        let fired = timers.pop_due(LATER).unwrap();
        assert_eq!(fired.kind, TimerKind::ObserverRetry);
        watcher.observe(&fired.into(), &page, &mut timers);
        assert!(!watcher.is_observing());

        page.attach_body();
        let fired = timers.pop_due(LATER).unwrap();
        assert_eq!(fired.at, Duration::from_millis(200));
        watcher.observe(&fired.into(), &page, &mut timers);
        assert!(watcher.is_observing());
        assert_eq!(watcher.last_href(), "https://www.youtube.com/shorts/abc");
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn nothing_before_install() {
        let page = SimulatedPage::new("https://www.youtube.com/");
        let mut timers = VirtualTimers::new();
        let mut watcher = NavigationWatcher::new(Duration::from_millis(100));
        assert_eq!(watcher.observe(&HostEvent::PopState, &page, &mut timers), None);
    }
}
