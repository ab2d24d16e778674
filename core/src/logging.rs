//! Tracing setup

use crate::config::LoggingConfig;

use std::path::Path;

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global tracing subscriber.
///
/// Logs go to stdout and, when enabled, to a daily rolling file under
/// `data_dir/<directory>`. The returned guard must be kept alive for the file
/// writer to flush.
pub fn init_logging(
	config: &LoggingConfig,
	data_dir: impl AsRef<Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
	let filter = EnvFilter::builder()
		.with_default_directive(config.level.parse()?)
		.from_env_lossy()
		.add_directive("sqlx=warn".parse()?)
		.add_directive("sea_orm=warn".parse()?);

	let registry = tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(true));

	if config.file_logging {
		let log_dir = data_dir.as_ref().join(&config.directory);
		std::fs::create_dir_all(&log_dir)?;

		let (non_blocking, guard) =
			tracing_appender::non_blocking(rolling::daily(log_dir, "mediadex.log"));

		registry
			.with(fmt::layer().with_ansi(false).with_writer(non_blocking))
			.try_init()?;

		Ok(Some(guard))
	} else {
		registry.try_init()?;
		Ok(None)
	}
}
