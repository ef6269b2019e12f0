//! Content script: one instance per document.
//!
//! ## Lifecycle
//!
//! ```text
//! start: initialize storage -> load settings -> early block
//!        -> install navigation watcher -> check_and_block
//! handle: host events -> watcher / overlay / panel -> check_and_block
//! ```
//!
//! Settings are loaded before any blocking decision, and every check
//! re-reads the master switch so a toggle in the panel applies to the next
//! navigation. After a hard redirect the document is gone and further
//! events are ignored.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::analytics::Analytics;
use crate::blocker::BlockController;
use crate::clock::Clock;
use crate::error::StorageError;
use crate::events::{Event, HostEvent, Message, RedirectReason};
use crate::navigation::NavigationWatcher;
use crate::overlay::{OverlayState, WarningOverlay};
use crate::page::{Page, ReadyState};
use crate::stats_panel::{PanelState, StatsPanel};
use crate::storage::{initialize, is_enabled, load_settings, Config, KvStore};
use crate::timers::{TimerId, TimerKind, Timers, VirtualTimers};

pub struct ContentScript<S, C> {
    store: S,
    clock: C,
    config: Config,
    blocker: BlockController,
    watcher: NavigationWatcher,
    overlay: WarningOverlay,
    panel: StatsPanel,
    /// Address the last block was recorded for.
    last_blocked: Option<String>,
    fallback: Option<TimerId>,
    started: bool,
    unloaded: bool,
}

impl<S: KvStore, C: Clock> ContentScript<S, C> {
    pub fn new(store: S, clock: C, config: Config) -> Self {
        Self {
            blocker: BlockController::from_config(&config),
            watcher: NavigationWatcher::new(config.observer_retry_delay()),
            overlay: WarningOverlay::new(&config),
            panel: StatsPanel::new(&config),
            store,
            clock,
            config,
            last_blocked: None,
            fallback: None,
            started: false,
            unloaded: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn blocker(&self) -> &BlockController {
        &self.blocker
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.overlay.state()
    }

    pub fn panel_state(&self) -> PanelState {
        self.panel.state()
    }

    pub fn panel(&self) -> &StatsPanel {
        &self.panel
    }

    pub fn watcher(&self) -> &NavigationWatcher {
        &self.watcher
    }

    /// True once the script redirected the document away.
    pub fn is_unloaded(&self) -> bool {
        self.unloaded
    }

    pub fn analytics(&self) -> Analytics<'_, S, C> {
        analytics(&self.store, &self.clock, &self.config)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the startup sequence. Storage initialization errors propagate;
    /// a second call is a no-op.
    pub async fn start(
        &mut self,
        page: &mut impl Page,
        timers: &mut impl Timers,
    ) -> Result<Vec<Event>, StorageError> {
        if self.started {
            warn!("already initialized");
            return Ok(Vec::new());
        }
        info!(href = %page.href(), "initializing");

        initialize(&self.store, &self.config, self.clock.today()).await?;
        let settings = load_settings(&self.store, &self.config.default_settings()).await?;
        let mut events = vec![Event::Initialized {
            enabled: settings.extension_enabled,
        }];

        if settings.extension_enabled
            && self.blocker.is_blocked(page)
            && page.ready_state() == ReadyState::Loading
        {
            debug!("early blocking at document start");
            if self.blocker.apply_block(page) {
                events.push(Event::EarlyBlock { href: page.href() });
            }
        }
        if !settings.extension_enabled {
            info!("extension is disabled");
        }

        self.watcher.install(page, timers);
        self.started = true;
        events.extend(self.check_and_block(page, timers).await);
        self.note_unload(&events);
        info!("initialization complete");
        Ok(events)
    }

    /// Dispatch one host event.
    pub async fn handle(
        &mut self,
        event: &HostEvent,
        page: &mut impl Page,
        timers: &mut impl Timers,
    ) -> Vec<Event> {
        if self.unloaded {
            return Vec::new();
        }

        let mut events = Vec::new();
        match event {
            HostEvent::Timer {
                id,
                kind: TimerKind::FallbackRedirect,
            } => events.extend(self.on_fallback(*id, page)),
            HostEvent::Timer {
                id,
                kind: TimerKind::PanelRemoval,
            } => events.extend(self.panel.on_removal(*id, page)),
            HostEvent::Message {
                message: Message::ToggleStatsPanel,
            } => {
                let analytics = analytics(&self.store, &self.clock, &self.config);
                match self.panel.toggle(&analytics, page, timers).await {
                    Ok(e) => events.extend(e),
                    Err(e) => error!(error = %e, "failed to toggle stats panel"),
                }
            }
            HostEvent::PanelCloseClicked => events.extend(self.panel.hide(page, timers)),
            HostEvent::PanelToggleClicked => {
                match self.panel.on_toggle_enabled(&self.store, page).await {
                    Ok(e) => events.extend(e),
                    Err(e) => error!(error = %e, "failed to toggle extension"),
                }
            }
            _ => {
                events.extend(self.overlay.handle(event, page, timers));
                if let Some(signal) = self.watcher.observe(event, page, timers) {
                    events.push(Event::NavigationDetected {
                        href: page.href(),
                        signal,
                    });
                    events.extend(self.check_and_block(page, timers).await);
                }
            }
        }
        self.note_unload(&events);
        events
    }

    /// Re-evaluate the current address and block or unblock.
    ///
    /// Safe to call for every navigation signal: the stylesheet is applied
    /// at most once and a block is recorded once per distinct address.
    pub async fn check_and_block(
        &mut self,
        page: &mut impl Page,
        timers: &mut impl Timers,
    ) -> Vec<Event> {
        let href = page.href();
        debug!(href = %href, "checking URL");

        let enabled = match is_enabled(&self.store).await {
            Ok(enabled) => enabled,
            Err(e) => {
                error!(error = %e, "failed to read extension_enabled");
                return Vec::new();
            }
        };
        if !enabled {
            return Vec::new();
        }

        let mut events = Vec::new();
        if !self.blocker.is_blocked_url(&href) {
            self.last_blocked = None;
            if self.blocker.remove_block(page) {
                events.push(Event::BlockRemoved { href });
            }
            if self.overlay.remove(page) {
                events.push(Event::OverlayRemoved);
            }
            return events;
        }

        info!(href = %href, "Shorts URL detected, blocking");
        if self.blocker.apply_block(page) {
            events.push(Event::BlockApplied { href: href.clone() });
        }
        self.arm_fallback(timers);

        if self.last_blocked.as_deref() == Some(href.as_str()) {
            return events;
        }
        self.last_blocked = Some(href);

        let analytics = analytics(&self.store, &self.clock, &self.config);
        events.push(match analytics.record_block().await {
            Some(stats) => Event::BlockRecorded {
                today: stats.today,
                total: stats.total,
            },
            None => Event::BlockNotRecorded,
        });
        events.extend(self.overlay.show(page, timers));
        events
    }

    /// Let virtual time pass, delivering every timer that comes due.
    pub async fn advance(
        &mut self,
        by: Duration,
        page: &mut impl Page,
        timers: &mut VirtualTimers,
    ) -> Vec<Event> {
        let deadline = timers.now() + by;
        let mut events = Vec::new();
        while let Some(fired) = timers.pop_due(deadline) {
            events.extend(self.handle(&fired.into(), page, timers).await);
        }
        events
    }

    fn arm_fallback(&mut self, timers: &mut impl Timers) {
        if self.fallback.is_none() {
            self.fallback = Some(
                timers.set_timeout(self.config.fallback_redirect_delay(), TimerKind::FallbackRedirect),
            );
        }
    }

    fn on_fallback(&mut self, id: TimerId, page: &mut impl Page) -> Option<Event> {
        if self.fallback != Some(id) {
            return None;
        }
        self.fallback = None;
        if !self.blocker.is_blocked(page) {
            return None;
        }
        warn!("fallback redirect triggered");
        let url = self.config.blocking.redirect_url.clone();
        page.replace_location(&url);
        Some(Event::Redirected {
            url,
            reason: RedirectReason::Fallback,
        })
    }

    fn note_unload(&mut self, events: &[Event]) {
        if events.iter().any(|e| matches!(e, Event::Redirected { .. })) {
            debug!("document replaced");
            self.unloaded = true;
        }
    }
}

fn analytics<'a, S: KvStore, C: Clock>(
    store: &'a S,
    clock: &'a C,
    config: &Config,
) -> Analytics<'a, S, C> {
    Analytics::new(store, clock).with_minutes_per_block(config.analytics.minutes_per_block)
}
