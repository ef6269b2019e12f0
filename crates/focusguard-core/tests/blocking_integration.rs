//! Integration tests for the blocking flow.
//!
//! Drives a content script over a simulated document and virtual timers,
//! from startup through single-page navigation to the final redirect.

use std::time::Duration;

use chrono::NaiveDate;
use focusguard_core::storage::{keys, set_enabled};
use focusguard_core::{
    Config, ContentScript, Event, FixedClock, HostEvent, KvStore, MemoryStore, Message,
    OverlayState, Page, RedirectReason, SimulatedPage, VirtualTimers,
};

const HOME: &str = "https://www.youtube.com/";
const WATCH: &str = "https://www.youtube.com/watch?v=abc123";
const SHORT_A: &str = "https://www.youtube.com/shorts/abc123";
const SHORT_B: &str = "https://www.youtube.com/shorts/xyz789";

fn new_script(config: Config) -> ContentScript<MemoryStore, FixedClock> {
    ContentScript::new(
        MemoryStore::new(),
        FixedClock::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
        config,
    )
}

/// What a browser does when the site routes with `pushState`: the address
/// changes, the wrapped call reports it, and the site re-renders body.
async fn spa_navigate(
    script: &mut ContentScript<MemoryStore, FixedClock>,
    page: &mut SimulatedPage,
    timers: &mut VirtualTimers,
    href: &str,
) -> Vec<Event> {
    page.push_state(href);
    let mut events = script.handle(&HostEvent::HistoryPushed, page, timers).await;
    events.extend(script.handle(&HostEvent::DomMutated, page, timers).await);
    events.extend(script.advance(Duration::ZERO, page, timers).await);
    events
}

fn count<F: Fn(&Event) -> bool>(events: &[Event], pred: F) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[tokio::test]
async fn test_spa_navigation_to_short_blocks_and_redirects() {
    let mut script = new_script(Config::default());
    let mut page = SimulatedPage::new(WATCH);
    let mut timers = VirtualTimers::new();
    script.start(&mut page, &mut timers).await.unwrap();

    let events = spa_navigate(&mut script, &mut page, &mut timers, SHORT_A).await;
    assert_eq!(count(&events, |e| matches!(e, Event::BlockRecorded { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, Event::NavigationDetected { .. })), 2);
    assert_eq!(page.count_id(&script.config().markers.blocking_css_id), 1);

    let events = script
        .advance(Duration::from_secs(2), &mut page, &mut timers)
        .await;
    assert!(events.contains(&Event::Redirected {
        url: HOME.into(),
        reason: RedirectReason::Fallback,
    }));
    assert_eq!(page.href(), HOME);
    assert_eq!(page.redirects(), [HOME]);
}

#[tokio::test]
async fn test_repeated_duplicate_signals_keep_one_marker() {
    let mut script = new_script(Config::default());
    let mut page = SimulatedPage::new(SHORT_A);
    let mut timers = VirtualTimers::new();
    script.start(&mut page, &mut timers).await.unwrap();

    for _ in 0..5 {
        script.handle(&HostEvent::PopState, &mut page, &mut timers).await;
        script.handle(&HostEvent::DomMutated, &mut page, &mut timers).await;
        page.replace_state(SHORT_A);
        script.handle(&HostEvent::HistoryReplaced, &mut page, &mut timers).await;
        script.advance(Duration::ZERO, &mut page, &mut timers).await;
    }

    assert_eq!(page.count_id(&script.config().markers.blocking_css_id), 1);
    assert_eq!(page.count_id(&script.config().markers.warning_overlay_id), 1);
    let stats = script.analytics().stats().await.unwrap();
    assert_eq!(stats.today, 1);
    assert_eq!(stats.total, 1);
}

#[tokio::test]
async fn test_hopping_between_shorts_records_each() {
    let mut config = Config::default();
    config.timing.fallback_redirect_ms = 60_000;
    config.countdown.duration_secs = 100;
    let mut script = new_script(config);
    let mut page = SimulatedPage::new(HOME);
    let mut timers = VirtualTimers::new();
    script.start(&mut page, &mut timers).await.unwrap();

    spa_navigate(&mut script, &mut page, &mut timers, SHORT_A).await;
    spa_navigate(&mut script, &mut page, &mut timers, SHORT_B).await;
    spa_navigate(&mut script, &mut page, &mut timers, WATCH).await;
    spa_navigate(&mut script, &mut page, &mut timers, SHORT_A).await;

    let stats = script.analytics().stats().await.unwrap();
    assert_eq!(stats.today, 3);
    assert_eq!(stats.by_date.get("2024-01-15"), Some(&3));
    assert_eq!(stats.time_saved_minutes, 2);
}

#[tokio::test]
async fn test_disabled_extension_never_blocks() {
    let mut script = new_script(Config::default());
    set_enabled(script.store(), false).await.unwrap();
    let mut page = SimulatedPage::loading(SHORT_A);
    let mut timers = VirtualTimers::new();

    script.start(&mut page, &mut timers).await.unwrap();
    page.finish_loading();
    script
        .handle(&HostEvent::DomContentLoaded, &mut page, &mut timers)
        .await;
    spa_navigate(&mut script, &mut page, &mut timers, SHORT_B).await;
    script
        .advance(Duration::from_secs(10), &mut page, &mut timers)
        .await;

    assert!(!page.contains(&script.config().markers.blocking_css_id));
    assert!(!page.contains(&script.config().markers.warning_overlay_id));
    assert!(page.redirects().is_empty());
    assert_eq!(
        script.store().get(keys::BLOCKED_TOTAL).await.unwrap(),
        Some(serde_json::json!(0))
    );
    assert_eq!(script.overlay_state(), OverlayState::Hidden);
}

#[tokio::test]
async fn test_observer_attaches_after_body_appears() {
    let mut script = new_script(Config::default());
    let mut page = SimulatedPage::loading(HOME);
    let mut timers = VirtualTimers::new();
    script.start(&mut page, &mut timers).await.unwrap();
    assert!(!script.watcher().is_observing());

    page.attach_body();
    script
        .advance(Duration::from_millis(100), &mut page, &mut timers)
        .await;
    assert!(script.watcher().is_observing());

    // A route change seen only through body mutations.
    page.replace_state(SHORT_A);
    let events = script
        .handle(&HostEvent::DomMutated, &mut page, &mut timers)
        .await;
    assert!(events.contains(&Event::BlockApplied { href: SHORT_A.into() }));
}

#[tokio::test]
async fn test_stats_panel_reflects_blocks() {
    let mut config = Config::default();
    config.timing.fallback_redirect_ms = 60_000;
    config.countdown.duration_secs = 100;
    let mut script = new_script(config);
    let mut page = SimulatedPage::new(HOME);
    let mut timers = VirtualTimers::new();
    script.start(&mut page, &mut timers).await.unwrap();

    spa_navigate(&mut script, &mut page, &mut timers, SHORT_A).await;
    spa_navigate(&mut script, &mut page, &mut timers, SHORT_B).await;

    script
        .handle(&Message::ToggleStatsPanel.into(), &mut page, &mut timers)
        .await;
    let panel = page.element(script.panel().panel_id()).unwrap();
    let text = panel.text_content();
    assert!(text.contains("Blocked Today"));
    assert!(text.contains("1m"));

    let events = script
        .handle(&HostEvent::PanelCloseClicked, &mut page, &mut timers)
        .await;
    assert_eq!(events, vec![Event::PanelClosing]);
}
