use std::io;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Where and how a binary writes its logs
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub log_dir: String,
    pub default_level: Level,
    pub rotation: Rotation,
    /// Mirror the file output to stdout with ANSI colours
    pub stdout: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self { log_dir: "./logs".to_string(), default_level: Level::INFO, rotation: Rotation::HOURLY, stdout: true }
    }
}

impl LogOptions {
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn file_only(mut self) -> Self {
        self.stdout = false;
        self
    }
}

/// Install the global subscriber with a non-blocking rolling file writer
///
/// `RUST_LOG` overrides the default level. Keep the returned guard alive for
/// the whole program or buffered lines are lost on exit.
pub fn init(app_name: &str, options: &LogOptions) -> WorkerGuard {
    let _ = std::fs::create_dir_all(&options.log_dir);

    let file_appender = RollingFileAppender::new(options.rotation.clone(), &options.log_dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::builder().with_default_directive(options.default_level.into()).from_env_lossy();

    let file_layer =
        fmt::layer().with_writer(non_blocking).with_target(true).with_thread_ids(true).with_line_number(true).with_ansi(false).compact();

    let stdout_layer = options
        .stdout
        .then(|| fmt::layer().with_writer(io::stdout).with_target(true).with_thread_ids(true).with_line_number(true).with_ansi(true).compact());

    tracing_subscriber::registry().with(env_filter).with(file_layer).with(stdout_layer).init();

    guard
}
