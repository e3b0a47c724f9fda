//! Process-wide `tracing` subscriber setup.
//!
//! `RUST_LOG` takes precedence over the `[logging]` section:
//! ```bash
//! RUST_LOG=debug ragline-ask "what is the warranty period?"
//! RUST_LOG=ragline_pipeline=trace ragline-indexer --overwrite
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive string for a logging section, e.g.
/// `info,ragline_pipeline=debug`.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut filter = config.default.clone();
    for (module, level) in &config.modules {
        filter.push_str(&format!(",{module}={level}"));
    }
    filter
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_writer(std::io::stderr)
            .with_filter(filter);

        // A subscriber installed elsewhere (e.g. by a test harness) wins.
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}

pub fn init() {
    init_with_config(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_overrides_follow_default_level() {
        let mut config = LoggingConfig { default: "warn".to_string(), ..LoggingConfig::default() };
        config.modules.insert("ragline_pipeline".to_string(), "debug".to_string());
        config.modules.insert("ragline_vector".to_string(), "trace".to_string());
        assert_eq!(filter_directives(&config), "warn,ragline_pipeline=debug,ragline_vector=trace");
    }

    #[test]
    fn init_twice_is_harmless() {
        init();
        init();
    }
}
