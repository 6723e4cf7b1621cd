// Logging initialization
// Decision: Console-only fmt layer; RUST_LOG overrides the default filter

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when RUST_LOG is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "spicescape_server=debug,tower_http=debug";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter directives in EnvFilter syntax
    pub log_filter: String,
    /// Include the event target (module path) in each line
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let log_filter = std::env::var("RUST_LOG")
            .ok()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            log_filter,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_tracing(config: &TelemetryConfig) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_filter(config.filter());

    if tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}
