use crate::domain::settings::{LogRotation, LogSettings};
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Holds the file writer; logs are flushed when it drops
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Rotation::MINUTELY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

fn level_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn console_layer(settings: &LogSettings) -> BoxedLayer {
    // stdout is reserved for `render-record` output
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(settings.ansi_colors)
        .with_file(settings.show_file_line)
        .with_line_number(settings.show_file_line)
        .with_thread_ids(settings.show_thread_ids)
        .with_target(settings.show_target)
        .boxed()
}

fn file_layer(settings: &LogSettings) -> (BoxedLayer, WorkerGuard) {
    let appender = RollingFileAppender::new(
        settings.rotation.into(),
        &settings.log_dir,
        &settings.file_name_prefix,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_file(settings.show_file_line)
        .with_line_number(settings.show_file_line)
        .with_thread_ids(settings.show_thread_ids)
        .with_target(settings.show_target)
        .boxed();
    (layer, guard)
}

/// Install the global subscriber
pub fn init_logger(settings: &LogSettings) -> anyhow::Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut file_guard = None;

    if settings.console {
        layers.push(console_layer(settings));
    }
    if settings.file {
        let (layer, guard) = file_layer(settings);
        layers.push(layer);
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(level_filter(settings))
        .try_init()?;

    if settings.file {
        tracing::debug!("Writing logs to {}", settings.log_dir.display());
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
