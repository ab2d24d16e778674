//! Search result types

use crate::error::SearchError;

use chrono::{DateTime, Utc};
use sea_orm::{QueryResult, TryGetable};
use serde::Serialize;

/// One file matching a search
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FileSearchResult {
	pub path: String,
	pub sha256: String,
	pub last_modified: DateTime<Utc>,
	pub mime_type: Option<String>,
}

impl FileSearchResult {
	/// Decodes a row of the fetch statement
	pub(crate) fn from_row(row: &QueryResult) -> Result<Self, SearchError> {
		let last_modified: String = column(row, "last_modified")?;

		Ok(Self {
			path: column(row, "path")?,
			sha256: column(row, "sha256")?,
			last_modified: DateTime::parse_from_rfc3339(&last_modified)
				.map(|dt| dt.with_timezone(&Utc))
				.map_err(|e| SearchError::Decode {
					column: "last_modified",
					reason: format!("{e} in '{last_modified}'"),
				})?,
			mime_type: column(row, "mime_type")?,
		})
	}
}

fn column<T: TryGetable>(row: &QueryResult, column: &'static str) -> Result<T, SearchError> {
	row.try_get("", column).map_err(|e| SearchError::Decode {
		column,
		reason: e.to_string(),
	})
}
