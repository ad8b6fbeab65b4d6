///! Logging setup
///! Console output plus an optional rotating JSON file

use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::VolumeServiceConfig;

const LOG_FILE_NAME: &str = "volume-service.log";

/// Resolved logging settings
#[derive(Debug, Clone)]
pub struct LoggingSetup {
    pub level: String,
    pub file_path: Option<std::path::PathBuf>,
    pub json_format: bool,
}

impl LoggingSetup {
    /// Derive settings from the service config; `server.debug` raises the
    /// default level to `debug`
    pub fn from_config(config: &VolumeServiceConfig) -> Self {
        let level = if config.server.debug {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        };

        Self {
            level,
            file_path: config.logging.file_path.clone(),
            json_format: config.logging.json_format,
        }
    }

    /// Install the global subscriber. Keep the returned guard alive for the
    /// lifetime of the process or buffered file output is lost.
    pub fn init(&self) -> anyhow::Result<Option<WorkerGuard>> {
        // RUST_LOG wins over the configured level
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.level));

        let console_layer = if self.json_format {
            fmt::layer()
                .with_target(true)
                .with_writer(io::stdout)
                .json()
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_writer(io::stdout)
                .boxed()
        };

        let (file_layer, guard) = match self.file_path {
            Some(ref path) => {
                let (writer, guard) = non_blocking(rolling::daily(path, LOG_FILE_NAME));
                let layer = fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(writer)
                    .boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        tracing::info!(level = %self.level, "Logging initialized");

        Ok(guard)
    }
}

/// Log a pipeline step with the request's identity attached
#[macro_export]
macro_rules! log_volume_operation {
    ($op:expr, $request:expr) => {
        tracing::info!(
            operation = $op,
            kind = %$request.kind,
            tenant = %$request.tenant,
            username = %$request.username,
            tag = %$request.tag,
            "Volume operation"
        )
    };
}
