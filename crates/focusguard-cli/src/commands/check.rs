use clap::Args;
use focusguard_core::{resolve_url, BlockController, Config};
use serde::Serialize;

#[derive(Args)]
pub struct CheckArgs {
    /// Absolute or site-relative address
    pub url: String,
}

#[derive(Serialize)]
struct CheckResult<'a> {
    url: &'a str,
    resolved: String,
    blocked: bool,
    path_prefix: &'a str,
}

pub fn run(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let blocker = BlockController::from_config(&config);
    let resolved = resolve_url(&args.url)?;
    let result = CheckResult {
        url: &args.url,
        resolved: resolved.to_string(),
        blocked: blocker.is_blocked_url(&args.url),
        path_prefix: &config.blocking.path_prefix,
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
