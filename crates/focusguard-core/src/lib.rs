//! # FocusGuard Core Library
//!
//! This library provides the core logic of FocusGuard, a blocker for
//! short-form video pages. The browser is an external collaborator: the
//! core talks to it through the [`Page`] and [`Timers`] traits and receives
//! [`HostEvent`]s, so the same code runs against a real document binding or
//! the in-memory [`SimulatedPage`] used by tests and the CLI.
//!
//! ## Architecture
//!
//! - **Navigation watcher**: three redundant signals for single-page
//!   navigation (body mutations, wrapped history calls, `popstate`)
//! - **Block controller**: blocked-path matching and an idempotent blocking
//!   stylesheet keyed by a marker id
//! - **Warning overlay**: countdown state machine ending in a
//!   history-replacing redirect, backed by a fallback redirect timer
//! - **Analytics**: per-day counts, streaks and time saved, derived from
//!   the persisted key-value store
//! - **Storage**: async [`KvStore`] contract with in-memory and SQLite
//!   implementations plus TOML configuration
//!
//! ## Key Components
//!
//! - [`ContentScript`]: per-document orchestrator
//! - [`Analytics`]: the block ledger
//! - [`Database`]: SQLite key-value store
//! - [`Config`]: application configuration

pub mod analytics;
pub mod background;
pub mod blocker;
pub mod clock;
pub mod content;
pub mod error;
pub mod events;
pub mod navigation;
pub mod overlay;
pub mod page;
pub mod stats_panel;
pub mod storage;
pub mod timers;

pub use analytics::{Analytics, DayCount, DayLedger, RangeStats, StatsSnapshot};
pub use background::{on_action_clicked, ChannelMessenger, TabMessenger};
pub use blocker::{resolve_url, BlockController};
pub use clock::{Clock, FixedClock, LocalClock};
pub use content::ContentScript;
pub use error::{ConfigError, CoreError, MessageError, StorageError, ValidationError};
pub use events::{Event, HostEvent, Message, RedirectReason};
pub use navigation::{NavigationSignal, NavigationWatcher};
pub use overlay::{OverlayState, WarningOverlay};
pub use page::{Node, Page, ReadyState, SimulatedPage};
pub use stats_panel::{PanelState, StatsPanel};
pub use storage::{Config, Database, KvStore, MemoryStore, Settings};
pub use timers::{Fired, TimerId, TimerKind, Timers, VirtualTimers};
