//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `stepsim=debug`).
pub const LOG_ENV: &str = "STEPSIM_LOG";

/// Install the global subscriber. Logs go to stderr so stdout only carries
/// the summary table. Defaults to `info` when `STEPSIM_LOG` is unset.
///
/// Calling this twice is harmless: the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
