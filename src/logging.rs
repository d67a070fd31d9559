//! tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::ports::config_port::ConfigPort;

const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: DEFAULT_LEVEL.to_string(),
            json: false,
        }
    }
}

impl LogSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        LogSettings {
            level: config
                .get_string("logging", "level")
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            json: config.get_bool("logging", "json", false),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }
}

/// Install the global subscriber, writing to stderr. Later calls are ignored.
pub fn init(settings: &LogSettings) {
    let registry = tracing_subscriber::registry().with(settings.filter());
    let result = if settings.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
