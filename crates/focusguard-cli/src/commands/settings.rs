use clap::Subcommand;
use focusguard_core::storage::{load_settings, set_enabled, toggle_enabled};
use focusguard_core::Config;

use super::{block_on, open_store};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print persisted settings
    Show,
    /// Turn blocking on
    Enable,
    /// Turn blocking off
    Disable,
    /// Flip the master switch
    Toggle,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    block_on(run_async(action))?
}

async fn run_async(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = open_store(&config).await?;

    match action {
        SettingsAction::Show => {
            let settings = load_settings(&db, &config.default_settings()).await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Enable => {
            set_enabled(&db, true).await?;
            println!("enabled");
        }
        SettingsAction::Disable => {
            set_enabled(&db, false).await?;
            println!("disabled");
        }
        SettingsAction::Toggle => {
            let enabled = toggle_enabled(&db).await?;
            println!("{}", if enabled { "enabled" } else { "disabled" });
        }
    }
    Ok(())
}
