use super::{non_blank, setter_ids_in, where_all, ClauseBuilder};
use crate::search::sql::Sql;

use serde::{Deserialize, Serialize};

/// One full-text query run against both file paths and extracted text.
///
/// A file matches when either source matches; its rank is the best rank
/// found in any source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnyTextFilter {
	/// FTS5 match expression, passed through to the store untouched
	pub query: String,
	pub include_path: bool,
	pub include_extracted_text: bool,
	/// Only extracted text produced by these setters
	pub text_setters: Vec<String>,
}

impl Default for AnyTextFilter {
	fn default() -> Self {
		Self {
			query: String::new(),
			include_path: true,
			include_extracted_text: true,
			text_setters: Vec::new(),
		}
	}
}

impl ClauseBuilder for AnyTextFilter {
	fn validate(&self) -> bool {
		!self.query.trim().is_empty() && (self.include_path || self.include_extracted_text)
	}

	fn rank_column(&self) -> Option<&'static str> {
		Some("rank_any_text")
	}

	fn build(&self, upstream: &str) -> Sql {
		let mut sources = Vec::with_capacity(2);

		if self.include_path {
			sources.push(Sql::bind(
				format!(
					"SELECT prev.file_id AS file_id, prev.item_id AS item_id, \
					files_path_fts.rank AS rank FROM {upstream} AS prev \
					JOIN files_path_fts ON files_path_fts.rowid = prev.file_id \
					WHERE files_path_fts MATCH ?"
				),
				[self.query.clone()],
			));
		}

		if self.include_extracted_text {
			let mut conditions = vec![Sql::bind(
				"extracted_text_fts MATCH ?",
				[self.query.clone()],
			)];
			let setters = non_blank(&self.text_setters);
			if !setters.is_empty() {
				conditions.push(setter_ids_in("extracted_text.setter_id", &setters));
			}

			sources.push(
				Sql::raw(format!(
					"SELECT prev.file_id AS file_id, prev.item_id AS item_id, \
					extracted_text_fts.rank AS rank FROM {upstream} AS prev \
					JOIN extracted_text ON extracted_text.item_id = prev.item_id \
					JOIN extracted_text_fts ON extracted_text_fts.rowid = extracted_text.id"
				)) + where_all(conditions),
			);
		}

		Sql::join(" UNION ALL ", sources).wrap(
			"SELECT hits.file_id AS file_id, hits.item_id AS item_id, \
			MIN(hits.rank) AS rank_any_text FROM (",
			") AS hits GROUP BY hits.file_id, hits.item_id",
		)
	}
}
