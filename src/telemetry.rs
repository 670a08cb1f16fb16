//! Telemetry initialization.
//!
//! Controlled by two environment variables:
//! - `SOS_LOG`: an `EnvFilter` directive (default `warn`)
//! - `SOS_LOG_FORMAT`: `json` for JSON events, anything else for
//!   human-readable output
//!
//! Everything goes to stderr so that merge output on stdout stays clean.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SOS_LOG";

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "SOS_LOG_FORMAT";

/// Guard returned by [`init`]. Hold it in `main()` until exit.
#[derive(Debug)]
pub struct TelemetryGuard {
    json: bool,
}

impl TelemetryGuard {
    /// Whether events are written as JSON.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::trace!("telemetry shut down");
    }
}

/// Install the global subscriber.
///
/// A second call (e.g. from tests) leaves the first subscriber in place.
#[must_use]
pub fn init() -> TelemetryGuard {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("warning: tracing already initialized: {e}");
    }

    TelemetryGuard { json }
}
