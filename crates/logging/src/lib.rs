//! Logging initialization for the garnet CLI.
//!
//! Log output always goes to stderr so that stdout stays reserved for
//! diagnostics and machine-readable reports.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `verbose` forces debug-level output;
/// otherwise `RUST_LOG` is honored, falling back to `info`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
