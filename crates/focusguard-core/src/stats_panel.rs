//! In-page statistics panel opened from the toolbar icon.
//!
//! The panel shows four counters and the master switch. Its open/closed
//! state is owned here rather than kept in a global: `Closing` covers the
//! fade-out between removing the `visible` class and deleting the element.

use std::time::Duration;

use indoc::formatdoc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analytics::{Analytics, StatsSnapshot};
use crate::clock::Clock;
use crate::error::StorageError;
use crate::events::Event;
use crate::page::{Node, Page};
use crate::storage::{is_enabled, toggle_enabled, Config, KvStore};
use crate::timers::{TimerId, TimerKind, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    Closed,
    Open,
    /// Hidden, element removed when the timer fires.
    Closing(TimerId),
}

#[derive(Debug, Clone)]
pub struct StatsPanel {
    panel_id: String,
    hide_delay: Duration,
    state: PanelState,
}

impl StatsPanel {
    pub fn new(config: &Config) -> Self {
        Self {
            panel_id: config.markers.stats_panel_id.clone(),
            hide_delay: config.panel_hide_delay(),
            state: PanelState::Closed,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn panel_id(&self) -> &str {
        &self.panel_id
    }

    /// Id of a named part of the panel, e.g. `status` or `close`.
    pub fn part_id(&self, part: &str) -> String {
        format!("{}-{part}", self.panel_id)
    }

    /// Open when closed, otherwise hide. A panel that is already fading
    /// out stays on its way out.
    pub async fn toggle<S: KvStore, C: Clock>(
        &mut self,
        analytics: &Analytics<'_, S, C>,
        page: &mut impl Page,
        timers: &mut impl Timers,
    ) -> Result<Vec<Event>, StorageError> {
        match self.state {
            PanelState::Closed => self.show(analytics, page).await,
            PanelState::Open | PanelState::Closing(_) => Ok(self.hide(page, timers)),
        }
    }

    /// Render current stats and the enabled switch into body.
    pub async fn show<S: KvStore, C: Clock>(
        &mut self,
        analytics: &Analytics<'_, S, C>,
        page: &mut impl Page,
    ) -> Result<Vec<Event>, StorageError> {
        if self.state != PanelState::Closed {
            return Ok(Vec::new());
        }

        let stats = analytics.stats().await?;
        let enabled = is_enabled(analytics.store()).await?;

        if !page.append_to_body(self.render(&stats, enabled)) {
            warn!("no body to attach the stats panel to");
            return Ok(Vec::new());
        }
        page.toggle_class(&self.panel_id, "visible", true);
        self.state = PanelState::Open;
        debug!(today = stats.today, total = stats.total, "stats panel opened");
        Ok(vec![Event::PanelOpened])
    }

    /// Start the hide transition. The element is deleted when the
    /// [`TimerKind::PanelRemoval`] timer fires.
    pub fn hide(&mut self, page: &mut impl Page, timers: &mut impl Timers) -> Vec<Event> {
        if self.state != PanelState::Open {
            return Vec::new();
        }
        if !page.toggle_class(&self.panel_id, "visible", false) {
            // Page removed it behind our back.
            self.state = PanelState::Closed;
            return vec![Event::PanelClosed];
        }
        let id = timers.set_timeout(self.hide_delay, TimerKind::PanelRemoval);
        self.state = PanelState::Closing(id);
        vec![Event::PanelClosing]
    }

    /// Finish a hide started by [`hide`](Self::hide).
    pub fn on_removal(&mut self, id: TimerId, page: &mut impl Page) -> Vec<Event> {
        if self.state != PanelState::Closing(id) {
            return Vec::new();
        }
        page.remove(&self.panel_id);
        self.state = PanelState::Closed;
        debug!("stats panel closed");
        vec![Event::PanelClosed]
    }

    /// The switch inside the panel was clicked: flip the persisted master
    /// switch and restyle the panel in place.
    pub async fn on_toggle_enabled<S: KvStore>(
        &mut self,
        store: &S,
        page: &mut impl Page,
    ) -> Result<Vec<Event>, StorageError> {
        let enabled = toggle_enabled(store).await?;

        page.toggle_class(&self.part_id("switch"), "fg-active", enabled);
        page.toggle_class(&self.part_id("container"), "fg-disabled", !enabled);
        let status = self.part_id("status");
        page.set_text(&status, status_text(enabled));
        page.toggle_class(&status, "fg-enabled", enabled);
        page.toggle_class(&status, "fg-disabled-status", !enabled);

        debug!(enabled, "extension toggled from stats panel");
        Ok(vec![Event::EnabledChanged { enabled }])
    }

    fn render(&self, stats: &StatsSnapshot, enabled: bool) -> Node {
        let card = |value: String, label: &str, highlight: bool| {
            let mut node = Node::new("div").with_class("fg-stat-card");
            if highlight {
                node = node.with_class("fg-highlight");
            }
            node.with_child(Node::new("div").with_class("fg-stat-value").with_text(value))
                .with_child(Node::new("div").with_class("fg-stat-label").with_text(label))
        };

        let header = Node::new("header")
            .with_class("fg-header")
            .with_child(
                Node::new("div")
                    .with_class("fg-brand")
                    .with_child(Node::new("div").with_class("fg-brand-name").with_text("FocusGuard"))
                    .with_child(
                        Node::new("div")
                            .with_class("fg-brand-tagline")
                            .with_text("Reclaim Your Attention"),
                    ),
            )
            .with_child(
                Node::new("button")
                    .with_id(self.part_id("close"))
                    .with_class("fg-close-btn")
                    .with_attr("aria-label", "Close panel")
                    .with_text("\u{00d7}"),
            );

        let status = Node::new("span")
            .with_id(self.part_id("status"))
            .with_class("fg-toggle-status")
            .with_class(if enabled { "fg-enabled" } else { "fg-disabled-status" })
            .with_text(status_text(enabled));

        let mut switch = Node::new("div")
            .with_id(self.part_id("switch"))
            .with_class("fg-toggle-switch")
            .with_child(Node::new("div").with_class("fg-toggle-slider"));
        if enabled {
            switch = switch.with_class("fg-active");
        }

        let toggle = Node::new("div")
            .with_class("fg-toggle-section")
            .with_child(
                Node::new("div")
                    .with_class("fg-toggle-label")
                    .with_text("Extension Status: ")
                    .with_child(status),
            )
            .with_child(
                Node::new("button")
                    .with_id(self.part_id("toggle"))
                    .with_class("fg-toggle-btn")
                    .with_attr("aria-label", "Toggle extension")
                    .with_child(switch),
            );

        let grid = Node::new("div")
            .with_class("fg-stats-grid")
            .with_child(card(stats.today.to_string(), "Blocked Today", false))
            .with_child(card(format_thousands(stats.total), "Total Blocked", false))
            .with_child(card(format_time_saved(stats), "Time Saved", true))
            .with_child(card(stats.current_streak.to_string(), "Day Streak", false));

        let mut container = Node::new("div")
            .with_id(self.part_id("container"))
            .with_class("fg-container");
        if !enabled {
            container = container.with_class("fg-disabled");
        }
        let container = container
            .with_child(header)
            .with_child(toggle)
            .with_child(
                Node::new("div")
                    .with_class("fg-stats-section")
                    .with_child(Node::new("div").with_class("fg-stats-header").with_text("Your Progress"))
                    .with_child(grid),
            );

        Node::new("div")
            .with_id(&self.panel_id)
            .with_child(Node::new("style").with_text(panel_css(&self.panel_id)))
            .with_child(Node::new("div").with_class("fg-panel").with_child(container))
    }
}

fn status_text(enabled: bool) -> &'static str {
    if enabled {
        "Active"
    } else {
        "Paused"
    }
}

/// `"{minutes}m"` below one (rounded) hour, `"{hours}h"` from there on.
pub fn format_time_saved(stats: &StatsSnapshot) -> String {
    if stats.time_saved_hours < 1.0 {
        format!("{}m", stats.time_saved_minutes)
    } else {
        format!("{}h", stats.time_saved_hours)
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn panel_css(id: &str) -> String {
    formatdoc! {"
        #{id} {{
          position: fixed;
          inset: 0;
          z-index: 999999999;
          pointer-events: none;
        }}

        #{id} .fg-panel {{
          position: absolute;
          top: 20px;
          right: 20px;
          width: 380px;
          background: #ffffff;
          border-radius: 16px;
          box-shadow: 0 12px 48px rgba(0, 0, 0, 0.12);
          overflow: hidden;
          opacity: 0;
          transform: translateY(-10px);
          transition: opacity 0.3s ease, transform 0.3s ease;
          pointer-events: all;
          font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
        }}

        #{id}.visible .fg-panel {{
          opacity: 1;
          transform: translateY(0);
        }}

        #{id} .fg-header {{
          display: flex;
          align-items: center;
          justify-content: space-between;
          padding: 20px;
          background: linear-gradient(135deg, #5ea9a4 0%, #2d7971 100%);
          color: white;
        }}

        #{id} .fg-close-btn {{
          background: rgba(255, 255, 255, 0.2);
          border: none;
          cursor: pointer;
          color: white;
          border-radius: 8px;
        }}

        #{id} .fg-toggle-section {{
          display: flex;
          align-items: center;
          justify-content: space-between;
          padding: 16px 20px;
          background: #f9fafb;
          border-bottom: 1px solid #e5e7eb;
        }}

        #{id} .fg-toggle-status.fg-enabled {{ color: #10b981; }}
        #{id} .fg-toggle-status.fg-disabled-status {{ color: #ef4444; }}

        #{id} .fg-toggle-switch {{
          width: 44px;
          height: 24px;
          border-radius: 12px;
          background: #d1d5db;
          position: relative;
        }}

        #{id} .fg-toggle-switch.fg-active {{ background: #5ea9a4; }}

        #{id} .fg-stats-grid {{
          display: grid;
          grid-template-columns: 1fr 1fr;
          gap: 12px;
          padding: 20px;
        }}

        #{id} .fg-stat-card {{
          background: #f9fafb;
          border-radius: 12px;
          padding: 16px;
        }}

        #{id} .fg-stat-card.fg-highlight {{ background: #ecfdf5; }}
        #{id} .fg-stat-value {{ font-size: 24px; font-weight: 700; color: #111827; }}
        #{id} .fg-stat-label {{ font-size: 12px; color: #6b7280; }}
        #{id} .fg-container.fg-disabled .fg-stats-section {{ opacity: 0.5; }}
    ", id = id}
}
