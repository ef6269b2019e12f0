use clap::{Parser, Subcommand};

mod commands;
mod logger;

#[derive(Parser)]
#[command(name = "focusguard", version, about = "FocusGuard CLI")]
struct Cli {
    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Block statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Persisted settings (master switch)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Check whether an address would be blocked
    Check(commands::check::CheckArgs),
    /// Replay a browsing session against the blocker
    Simulate(commands::simulate::SimulateArgs),
}

fn main() {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Check(args) => commands::check::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
