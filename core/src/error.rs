use std::path::Path;

use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced while compiling or executing a search
#[derive(Error, Debug)]
pub enum SearchError {
	/// The store rejected a statement; carries the statement that failed
	#[error("database error: {source} <sql='{sql}'>")]
	Query {
		sql: String,
		#[source]
		source: DbErr,
	},
	/// A compiled statement broke one of the compiler's own invariants
	#[error("query compilation failed: {0}")]
	Compile(String),
	#[error("failed to decode column '{column}': {reason}")]
	Decode { column: &'static str, reason: String },
	#[error("invalid configuration: {0}")]
	Config(#[from] serde_json::Error),
	#[error("io error at <path='{}'>: {source}", .path.display())]
	Io {
		path: Box<Path>,
		#[source]
		source: std::io::Error,
	},
}

impl SearchError {
	pub(crate) fn query(sql: &str, source: DbErr) -> Self {
		Self::Query {
			sql: sql.to_string(),
			source,
		}
	}

	pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.as_ref().into(),
			source,
		}
	}
}
