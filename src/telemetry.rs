use anyhow::Context;
use configuration::{LogFormat, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Installs the global subscriber.
///
/// Stderr output goes through the indicatif layer so log lines and progress
/// bars do not interleave. When a log directory is configured a daily rolling
/// file is written as well; the returned guard must be held until exit or
/// buffered lines are lost.
pub fn init_tracing(
    logging: &LoggingConfig,
    format_override: Option<LogFormat>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("invalid log filter '{}'", logging.level))?;

    let indicatif_layer = IndicatifLayer::new();

    let stderr_layer = match format_override.unwrap_or(logging.format) {
        LogFormat::Full => fmt::layer()
            .with_writer(indicatif_layer.get_stderr_writer())
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(indicatif_layer.get_stderr_writer())
            .boxed(),
    };

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "navproof.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .with(indicatif_layer)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(guard)
}
