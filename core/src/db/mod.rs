//! Store connections

use std::{path::Path, time::Duration};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

pub mod schema;

/// Open (creating if needed) a library database for reading and writing
pub async fn open(path: &Path) -> Result<DatabaseConnection, DbErr> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)
			.map_err(|e| DbErr::Custom(format!("Failed to create directory: {}", e)))?;
	}

	let conn = Database::connect(options(format!("sqlite://{}?mode=rwc", path.display()))).await?;

	info!("Opened database at {:?}", path);

	Ok(conn)
}

/// Open an existing library database for searching.
///
/// The connection is read-only so a search can never take the store's write
/// lock while the ingestion pipeline is writing.
pub async fn connect_read_only(path: &Path) -> Result<DatabaseConnection, DbErr> {
	if !path.exists() {
		return Err(DbErr::Custom(format!(
			"Database does not exist: {}",
			path.display()
		)));
	}

	let conn = Database::connect(options(format!("sqlite://{}?mode=ro", path.display()))).await?;

	info!("Opened read-only database at {:?}", path);

	Ok(conn)
}

fn options(url: String) -> ConnectOptions {
	let mut opt = ConnectOptions::new(url);
	opt.max_connections(4)
		.min_connections(1)
		.connect_timeout(Duration::from_secs(8))
		.sqlx_logging(false); // We use tracing instead
	opt
}
