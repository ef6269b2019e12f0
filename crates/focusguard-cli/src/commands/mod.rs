pub mod check;
pub mod config;
pub mod settings;
pub mod simulate;
pub mod stats;

use std::future::Future;

use focusguard_core::storage::initialize;
use focusguard_core::{Clock, Config, Database, LocalClock};

/// Run a future on a single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, std::io::Error> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Open the database and bring it up to date for today, the same way a
/// content script does on page load.
pub async fn open_store(config: &Config) -> Result<Database, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    initialize(&db, config, LocalClock.today()).await?;
    Ok(db)
}
