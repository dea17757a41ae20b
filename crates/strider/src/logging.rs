// Logging setup for binaries and tests.

use tracing_subscriber::{fmt, EnvFilter};

/// Map a `-v` count to a filter. At verbosity 0 `RUST_LOG` wins if set.
pub fn filter_for(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install a stderr fmt subscriber. Calling it again (or after another
/// subscriber was installed) is a no-op.
pub fn init(verbosity: u8) {
    let _ = fmt()
        .with_env_filter(filter_for(verbosity))
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
}
