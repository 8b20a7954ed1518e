//! Logging setup using tracing
//!
//! Logs go to stderr so stdout only carries the status lines and the report.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used without `--debug`
const DEFAULT_FILTER: &str = "warn";

/// Filter used with `--debug`; reqwest logs connection traffic at trace
const DEBUG_FILTER: &str = "wpvulndb_report=debug,reqwest=trace";

/// Filter directive for the given debug flag
pub fn filter_directive(debug: bool) -> &'static str {
    if debug { DEBUG_FILTER } else { DEFAULT_FILTER }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the debug flag when set.
pub fn init_logging(debug: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(debug)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
