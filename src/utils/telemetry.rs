//! Structured logging setup.
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG` takes
//! precedence over the configured level. Debug builds get
//! pretty terminal output, release builds (or `json = true`) emit JSON lines.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_telemetry(log_level: &str, json: bool) {
    let default_filter = format!("{},repurpose={}", log_level, log_level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    if json || cfg!(not(debug_assertions)) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
