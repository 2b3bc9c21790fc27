//! Logging hookup for applications embedding chronicle.
//!
//! The library itself only emits `tracing` events; installing a
//! subscriber is left to the host. This module offers a sensible
//! default: `RUST_LOG` when set, the configured filter otherwise, with
//! output on stderr so it never mixes with the host's stdout.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Options for the default subscriber.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter directive used when `RUST_LOG` is unset,
    /// e.g. `"chronicle=debug"`.
    pub default_filter: String,
    /// Include the callsite file and line in each event.
    pub with_location: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_filter: "chronicle=info".to_string(),
            with_location: false,
        }
    }
}

/// Install the global subscriber.
///
/// Fails when a subscriber is already installed, so tests that share a
/// process can call this repeatedly and ignore the result.
pub fn init(options: &LogOptions) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(options.with_location)
                .with_line_number(options.with_location),
        )
        .try_init()
}
