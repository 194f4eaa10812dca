//! Tracing subscriber setup for the command-line host
//!
//! The library only emits events; binaries call [`init_logging`] once.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How the host wants its logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Number of `-v` flags given
    pub verbosity: u8,
    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
}

/// Filter directive for a verbosity level when `RUST_LOG` is unset
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "pronote_updater=warn",
        1 => "pronote_updater=info",
        2 => "pronote_updater=debug",
        _ => "pronote_updater=trace",
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// reserved for command output.
pub fn init_logging(options: LogOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.verbosity)));

    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    // A second init (tests, embedding hosts) keeps the existing subscriber
    let result = if options.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
