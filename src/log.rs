//! Logging functionality and error reporting.
//! The logging library of choice is [tracing].

use std::error::Error as _;

use tracing::error;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::error::LauncherError;
use crate::setup::Config;
use crate::setup::ConfigSource;

/// The name of this crate, used to set filter target.
const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Setup format layers, tracing subscribers, and installs tracing.
/// The returned guard flushes the log file when dropped, keep it alive until exit.
pub(super) fn install_tracing(config: &Config) -> Option<WorkerGuard> {
    // Uses local time.
    let timer = fmt::time::ChronoLocal::rfc_3339();

    // By default, all INFO traces and above are shown.
    let target = if config.console_debug() {
        Targets::new()
            .with_default(LevelFilter::INFO)
            .with_target(THIS_CRATE, LevelFilter::DEBUG)
    } else {
        Targets::new().with_default(LevelFilter::INFO)
    };

    // Operator-facing output, kept short unless debugging.
    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_file(config.console_debug())
        .with_level(true)
        .with_line_number(config.console_debug())
        .with_target(config.console_debug())
        .with_timer(timer.clone())
        .compact()
        .with_filter(target.clone());

    // Put file logs in `log_dir` as "{THIS_CRATE}.log.{TIMESTAMP}" on an hourly basis.
    let (log_layer, guard) = if config.logs_enabled() {
        let prefix_format = format!("{THIS_CRATE}.log");
        let appender = tracing_appender::rolling::hourly(config.log_dir(), prefix_format);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_ansi(false)
            .with_file(config.console_debug())
            .with_level(true)
            .with_line_number(config.console_debug())
            .with_target(true)
            .with_timer(timer)
            .with_writer(writer)
            .compact()
            .with_filter(target);

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(log_layer)
        .init();

    guard
}

/// Says where the config came from, once there is a subscriber to say it to.
pub(super) fn report_config(source: &ConfigSource) {
    match source {
        ConfigSource::File(path) => info!("Using config {}", path.display()),
        ConfigSource::Created(path) => {
            info!("No config found, created {} with defaults", path.display())
        }
        ConfigSource::Rewritten(path) => {
            info!("Empty config, rewrote {} with defaults", path.display())
        }
        ConfigSource::Unsaved { path, reason } => {
            warn!("Could not write {}, using defaults. {reason}", path.display())
        }
    }
}

/// Logs a fatal error with its chain of causes.
pub(super) fn report_failure(err: &LauncherError) {
    error!("{err}");

    let mut source = err.source();
    while let Some(cause) = source {
        error!("  caused by: {cause}");
        source = cause.source();
    }
}
