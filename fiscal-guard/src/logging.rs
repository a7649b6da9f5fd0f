//! Logging utilities and configuration for fiscal-guard.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application, with [`setup::init_logging`] as a ready-made option.

use tracing::Level;

/// Logging configuration carried by the processing orchestrator.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for fiscal-guard components
    pub base_level: Level,
    /// Whether to log per-stage details (cleaning, statistics, metrics)
    pub log_stage_details: bool,
    /// Whether to log record-level events such as dropped records
    pub log_record_events: bool,
    /// Whether to include timing metrics in log output
    pub log_metrics: bool,
    /// Maximum length for logged field values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_stage_details: false,
            log_record_events: false,
            log_metrics: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_stage_details: true,
            log_record_events: true,
            log_metrics: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for production with lowest overhead.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_stage_details: false,
            log_record_events: false,
            log_metrics: false,
            max_field_length: 128,
        }
    }

    /// Creates a balanced configuration suitable for most use cases.
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Whether per-stage debug events pass both the flag and the base level.
    pub fn stage_logging_enabled(&self) -> bool {
        self.log_stage_details && self.base_level >= Level::DEBUG
    }

    /// Whether record-level debug events pass both the flag and the base level.
    pub fn record_logging_enabled(&self) -> bool {
        self.log_record_events && self.base_level >= Level::DEBUG
    }
}

/// Logs at debug level only when stage details are enabled and the base
/// level admits debug events.
#[macro_export]
macro_rules! log_stage {
    ($config:expr, $($arg:tt)*) => {
        if $config.stage_logging_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs at debug level only when record-level events are enabled and the
/// base level admits debug events.
#[macro_export]
macro_rules! log_record_event {
    ($config:expr, $($arg:tt)*) => {
        if $config.record_logging_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a string to the maximum field length if needed.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut cut = max_length;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...(truncated)", &value[..cut])
}

/// Utilities for setting up structured logging.
pub mod setup {
    use tracing::Level;

    /// Configuration for installing a `tracing-subscriber` registry.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for fiscal-guard components specifically
        pub crate_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Sets the log level for the application.
        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Sets the log level for fiscal-guard components.
        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},fiscal_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs a global subscriber honouring `RUST_LOG` when set.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use fiscal_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, Level::INFO);
        assert!(!config.log_stage_details);
        assert!(!config.log_record_events);
        assert!(config.log_metrics);
        assert_eq!(config.max_field_length, 256);
    }

    #[test]
    fn test_log_config_presets() {
        let verbose = LogConfig::verbose();
        assert_eq!(verbose.base_level, Level::DEBUG);
        assert!(verbose.log_stage_details);

        let production = LogConfig::production();
        assert_eq!(production.base_level, Level::WARN);
        assert!(!production.log_metrics);
        assert_eq!(production.max_field_length, 128);
    }

    #[test]
    fn test_base_level_gates_debug_logging() {
        let verbose = LogConfig::verbose();
        assert!(verbose.stage_logging_enabled());
        assert!(verbose.record_logging_enabled());

        let info = LogConfig {
            log_stage_details: true,
            log_record_events: true,
            ..LogConfig::default()
        };
        assert!(!info.stage_logging_enabled());
        assert!(!info.record_logging_enabled());

        let trace = LogConfig {
            base_level: Level::TRACE,
            ..LogConfig::verbose()
        };
        assert!(trace.stage_logging_enabled());
        assert!(!LogConfig::default().stage_logging_enabled());
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text", 10),
            "this is a ...(truncated)"
        );
        // never splits a multi-byte character
        assert_eq!(truncate_field("Côte d'Ivoire", 2), "C...(truncated)");
    }

    #[test]
    fn test_env_filter_string() {
        let config = LoggingConfig::default().with_level(Level::WARN);
        assert_eq!(config.env_filter(), "warn,fiscal_guard=debug");

        let custom = LoggingConfig::default().with_env_filter("fiscal_guard=trace");
        assert_eq!(custom.env_filter(), "fiscal_guard=trace");
    }
}
