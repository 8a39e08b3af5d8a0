//! tracing subscriber setup for the binary

use tracing_subscriber::EnvFilter;

/// Quiet dependencies unless RUST_LOG says otherwise
const DEPENDENCY_FILTERS: &str = "hyper=warn,hyper_util=warn,reqwest=warn,h2=warn,rustls=warn";

/// Filter directive for the given flags, used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool, debug: bool) -> String {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    format!("{},{}", level, DEPENDENCY_FILTERS)
}

/// Initialise logging to stderr. Safe to call more than once.
pub fn init(verbose: bool, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
