use std::time::Duration;

use clap::Args;
use focusguard_core::storage::keys;
use focusguard_core::{
    Clock, Config, ContentScript, Database, Event, HostEvent, KvStore, LocalClock, MemoryStore,
    Message, Page, SimulatedPage, VirtualTimers,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{block_on, open_store};

#[derive(Args)]
pub struct SimulateArgs {
    /// Addresses visited in order. The first one is loaded from scratch,
    /// the rest are reached through in-page navigation.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Time spent on each address before moving on, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub dwell_ms: u64,

    /// Time to let timers run after the last address, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub settle_ms: u64,

    /// Run as if the extension were switched off
    #[arg(long, conflicts_with = "record")]
    pub disabled: bool,

    /// Open the stats panel once the first page has loaded
    #[arg(long)]
    pub panel: bool,

    /// Write blocks to the real database instead of a scratch copy
    #[arg(long)]
    pub record: bool,
}

#[derive(Serialize)]
struct TimelineEntry {
    at_ms: u64,
    #[serde(flatten)]
    event: Event,
}

#[derive(Serialize)]
struct Report {
    timeline: Vec<TimelineEntry>,
    final_url: String,
    redirects: Vec<String>,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    block_on(run_async(args))?
}

async fn run_async(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    debug!(urls = args.urls.len(), record = args.record, "simulating session");

    let report = if args.record {
        let db = open_store(&config).await?;
        drive(ContentScript::new(db, LocalClock, config), &args).await?
    } else {
        // Read-only: defaults and day rollover land in the scratch copy.
        let mut entries = Database::open()?.kv_all()?;
        if args.disabled {
            entries.insert(keys::EXTENSION_ENABLED.into(), Value::Bool(false));
        }
        drive(
            ContentScript::new(MemoryStore::with_entries(entries), LocalClock, config),
            &args,
        )
        .await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn drive<S: KvStore, C: Clock>(
    mut script: ContentScript<S, C>,
    args: &SimulateArgs,
) -> Result<Report, Box<dyn std::error::Error>> {
    let (first, rest) = match args.urls.split_first() {
        Some(split) => split,
        None => return Err("no address to visit".into()),
    };
    let dwell = Duration::from_millis(args.dwell_ms);
    let settle = Duration::from_millis(args.settle_ms);

    let mut timeline = Vec::new();
    let mut record = |timers: &VirtualTimers, events: Vec<Event>| {
        let at_ms = timers.now().as_millis() as u64;
        timeline.extend(events.into_iter().map(|event| TimelineEntry { at_ms, event }));
    };

    let mut page = SimulatedPage::loading(first.as_str());
    let mut timers = VirtualTimers::new();

    let events = script.start(&mut page, &mut timers).await?;
    record(&timers, events);

    page.finish_loading();
    let events = script
        .handle(&HostEvent::DomContentLoaded, &mut page, &mut timers)
        .await;
    record(&timers, events);

    if args.panel {
        let events = script
            .handle(&Message::ToggleStatsPanel.into(), &mut page, &mut timers)
            .await;
        record(&timers, events);
    }

    for next in rest.iter().map(Some).chain(std::iter::once(None)) {
        let deadline = timers.now() + if next.is_some() { dwell } else { settle };
        while let Some(fired) = timers.pop_due(deadline) {
            let events = script.handle(&fired.into(), &mut page, &mut timers).await;
            record(&timers, events);
            if script.is_unloaded() {
                break;
            }
        }
        let Some(url) = next else { break };
        if script.is_unloaded() {
            break;
        }

        page.push_state(url.as_str());
        for event in [HostEvent::HistoryPushed, HostEvent::DomMutated] {
            let events = script.handle(&event, &mut page, &mut timers).await;
            record(&timers, events);
        }
    }

    Ok(Report {
        timeline,
        final_url: page.href(),
        redirects: page.redirects().to_vec(),
    })
}
