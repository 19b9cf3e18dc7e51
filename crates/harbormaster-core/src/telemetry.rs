//! Tracing bootstrap shared by the harbormaster binaries.
//!
//! [`init_tracing`] configures the global subscriber once; repeated calls
//! are silently ignored, so library tests and the CLI can both call it
//! without coordinating.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Map the CLI's repeated `--verbose` flag to a default level: none is
/// `INFO`, one is `DEBUG`, more is `TRACE`.
pub fn level_for_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialise the global tracing subscriber.
///
/// * `json`: when `true`, emit newline-delimited JSON log lines for log
///   aggregation; otherwise human-readable lines.
/// * `level`: default verbosity when `RUST_LOG` is not set.
///
/// `RUST_LOG` always wins when present, so operators can turn single
/// targets up or down without redeploying.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}
