use super::{select_upstream, ClauseBuilder};
use crate::search::sql::Sql;

use serde::{Deserialize, Serialize};

/// Full-text match against file paths or file names
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PathTextFilter {
	/// FTS5 match expression, passed through to the store untouched
	pub query: String,
	pub only_match_filename: bool,
}

impl ClauseBuilder for PathTextFilter {
	fn validate(&self) -> bool {
		!self.query.trim().is_empty()
	}

	fn rank_column(&self) -> Option<&'static str> {
		Some("rank_path_fts")
	}

	fn build(&self, upstream: &str) -> Sql {
		let target = if self.only_match_filename {
			"files_path_fts.filename"
		} else {
			"files_path_fts"
		};

		Sql::bind(
			format!(
				"{} FROM {upstream} AS prev \
				JOIN files_path_fts ON files_path_fts.rowid = prev.file_id \
				WHERE {target} MATCH ?",
				select_upstream(Some(("files_path_fts.rank", "rank_path_fts")))
			),
			[self.query.clone()],
		)
	}
}
