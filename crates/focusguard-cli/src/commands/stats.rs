use clap::Subcommand;
use focusguard_core::clock::parse_date_key;
use focusguard_core::{Analytics, Config, LocalClock, ValidationError};

use super::{block_on, open_store};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Counters, streaks and time saved
    Show,
    /// Last 7 days including today
    Week,
    /// Last 30 days including today
    Month,
    /// Day-by-day counts over an inclusive range
    Range {
        /// First day (YYYY-MM-DD)
        start: String,
        /// Last day (YYYY-MM-DD)
        end: String,
    },
    /// Zero all counters (settings are kept)
    Reset,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    block_on(run_async(action))?
}

async fn run_async(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = open_store(&config).await?;
    let clock = LocalClock;
    let analytics = Analytics::new(&db, &clock)
        .with_minutes_per_block(config.analytics.minutes_per_block);

    match action {
        StatsAction::Show => {
            let stats = analytics.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Week => {
            let stats = analytics.week_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Month => {
            let stats = analytics.month_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Range { start, end } => {
            let start = parse_date_key(&start)?;
            let end = parse_date_key(&end)?;
            // The ledger answers a reversed range with an empty one.
            if end < start {
                return Err(ValidationError::InvalidRange {
                    start: start.to_string(),
                    end: end.to_string(),
                }
                .into());
            }
            let stats = analytics.stats_for_range(start, end).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Reset => {
            analytics.reset().await?;
            println!("stats reset");
        }
    }
    Ok(())
}
