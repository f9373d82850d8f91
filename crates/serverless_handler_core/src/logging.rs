//! Process-wide logger factory.
//!
//! One `tracing` subscriber writes every line to a single sink in the format
//! `<timestamp> - <LEVEL> - <logger name> - <message>`. Named [`Logger`]
//! handles are children of [`BASE_LOGGER_NAME`] and each carries its own
//! severity threshold. Records emitted through the `log` facade by
//! dependencies are bridged into the same sink at the default threshold.

use std::fmt;
use std::sync::OnceLock;

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::Layer;

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const BASE_LOGGER_NAME: &str = "serverless_handler";

const LOG_TARGET: &str = "serverless_handler::logger";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

static PROCESS_LOGGERS: OnceLock<LoggerFactory> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Resolves a level name, case-insensitively. `FATAL` is an alias for
    /// `CRITICAL`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" | "FATAL" => Some(Self::Critical),
            "ERROR" => Some(Self::Error),
            "WARNING" => Some(Self::Warning),
            "INFO" => Some(Self::Info),
            "DEBUG" => Some(Self::Debug),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    fn level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub default_threshold: Severity,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_level_name(std::env::var(LOG_LEVEL_ENV).ok().as_deref())
    }

    /// Unset or unrecognized names fall back to `INFO`.
    pub fn from_level_name(name: Option<&str>) -> Self {
        Self {
            default_threshold: name.and_then(Severity::from_name).unwrap_or(Severity::Info),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_threshold: Severity::Info,
        }
    }
}

/// Hands out named loggers that share one sink.
///
/// Construct one at process start with [`LoggerFactory::init`] and pass it to
/// whatever needs a logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerFactory {
    settings: LogSettings,
}

impl LoggerFactory {
    pub fn new(settings: LogSettings) -> Self {
        Self { settings }
    }

    /// Resolves settings from `LOG_LEVEL` and installs the stdout subscriber
    /// as the global default. Only the first call per process configures
    /// anything; later calls return the same factory.
    pub fn init() -> Self {
        PROCESS_LOGGERS
            .get_or_init(|| {
                let factory = Self::new(LogSettings::from_env());
                if let Err(error) = factory.install_global() {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "component": "logger_factory",
                            "level": "warning",
                            "event": "global_subscriber_not_installed",
                            "details": error.to_string(),
                        })
                    );
                }
                factory
            })
            .clone()
    }

    /// Installs the stdout subscriber as the process-wide default. Fails when
    /// a global subscriber is already in place; lines then go to that one.
    pub fn install_global(&self) -> Result<(), TryInitError> {
        self.subscriber(std::io::stdout).try_init()
    }

    pub fn settings(&self) -> LogSettings {
        self.settings
    }

    pub fn default_threshold(&self) -> Severity {
        self.settings.default_threshold
    }

    pub fn get_logger(&self, name: &str) -> Logger {
        self.get_logger_with_level(name, self.settings.default_threshold)
    }

    pub fn get_logger_with_level(&self, name: &str, threshold: Severity) -> Logger {
        Logger {
            name: format!("{BASE_LOGGER_NAME}.{name}"),
            threshold,
        }
    }

    /// Builds the subscriber that backs every logger over `writer`.
    ///
    /// Logger events always pass the filter because each [`Logger`] applies
    /// its own threshold; everything else is held to the default threshold.
    pub fn subscriber<W>(&self, writer: W) -> impl Subscriber + Send + Sync + 'static
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = Targets::new()
            .with_target(LOG_TARGET, LevelFilter::TRACE)
            .with_default(self.settings.default_threshold.level_filter());

        tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat)
                .with_writer(writer)
                .with_filter(filter),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    name: String,
    threshold: Severity,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: Severity) {
        self.threshold = threshold;
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    pub fn log(&self, severity: Severity, message: impl fmt::Display) {
        if !self.enabled(severity) {
            return;
        }

        let logger = self.name.as_str();
        let label = severity.label();
        match severity {
            Severity::Debug => {
                tracing::debug!(target: LOG_TARGET, logger, severity = label, "{message}")
            }
            Severity::Info => {
                tracing::info!(target: LOG_TARGET, logger, severity = label, "{message}")
            }
            Severity::Warning => {
                tracing::warn!(target: LOG_TARGET, logger, severity = label, "{message}")
            }
            Severity::Error | Severity::Critical => {
                tracing::error!(target: LOG_TARGET, logger, severity = label, "{message}")
            }
        }
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: impl fmt::Display) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message);
    }

    pub fn critical(&self, message: impl fmt::Display) {
        self.log(Severity::Critical, message);
    }
}

struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = LineFields::default();
        event.record(&mut fields);

        let metadata = event.metadata();
        let level = fields
            .severity
            .unwrap_or_else(|| level_label(metadata.level()).to_string());
        // `log` records arrive with the bridge's target; prefer the original one.
        let name = fields
            .logger
            .or(fields.log_target)
            .unwrap_or_else(|| metadata.target().to_string());

        writeln!(
            writer,
            "{} - {} - {} - {}",
            Utc::now().format(TIMESTAMP_FORMAT),
            level,
            name,
            fields.message
        )
    }
}

fn level_label(level: &Level) -> &'static str {
    if *level == Level::ERROR {
        "ERROR"
    } else if *level == Level::WARN {
        "WARNING"
    } else if *level == Level::INFO {
        "INFO"
    } else if *level == Level::DEBUG {
        "DEBUG"
    } else {
        "TRACE"
    }
}

#[derive(Default)]
struct LineFields {
    message: String,
    logger: Option<String>,
    severity: Option<String>,
    log_target: Option<String>,
}

impl Visit for LineFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "logger" => self.logger = Some(value.to_string()),
            "severity" => self.severity = Some(value.to_string()),
            "log.target" => self.log_target = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
