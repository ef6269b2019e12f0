//! Logging setup for the CLI.
//!
//! Logs go to stderr so JSON on stdout stays machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `--verbose` wins; otherwise `FOCUSGUARD_LOG`, then `RUST_LOG`, then
/// warnings only.
pub fn init_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("focusguard_core=debug,focusguard=debug")
    } else {
        EnvFilter::try_from_env("FOCUSGUARD_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
