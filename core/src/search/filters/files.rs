use super::{non_blank, select_upstream, where_all, ClauseBuilder};
use crate::search::sql::Sql;

use serde::{Deserialize, Serialize};

/// Restricts results by MIME type, location on disk, size and availability
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MatchFiles {
	/// MIME type prefixes, any of which may match (`image/`, `video/mp4`)
	pub mime_types: Vec<String>,
	/// Path prefixes, any of which may match
	pub path_prefixes: Vec<String>,
	pub min_size: Option<u64>,
	pub max_size: Option<u64>,
	/// Only files the scanner last saw on disk
	pub available_only: bool,
}

impl ClauseBuilder for MatchFiles {
	fn validate(&self) -> bool {
		!non_blank(&self.mime_types).is_empty()
			|| !non_blank(&self.path_prefixes).is_empty()
			|| self.min_size.is_some()
			|| self.max_size.is_some()
			|| self.available_only
	}

	fn build(&self, upstream: &str) -> Sql {
		let mut conditions = Vec::new();

		let mime_types = non_blank(&self.mime_types);
		if !mime_types.is_empty() {
			conditions.push(Sql::like_any_prefix("items.mime_type", mime_types));
		}

		let path_prefixes = non_blank(&self.path_prefixes);
		if !path_prefixes.is_empty() {
			conditions.push(Sql::like_any_prefix("files.path", path_prefixes));
		}

		if let Some(min) = self.min_size {
			conditions.push(Sql::bind("items.size >= ?", [saturating_i64(min)]));
		}
		if let Some(max) = self.max_size {
			conditions.push(Sql::bind("items.size <= ?", [saturating_i64(max)]));
		}

		if self.available_only {
			conditions.push(Sql::raw("files.available = 1"));
		}

		Sql::raw(format!(
			"{} FROM {upstream} AS prev \
			JOIN files ON files.id = prev.file_id \
			JOIN items ON items.id = prev.item_id",
			select_upstream(None)
		)) + where_all(conditions)
	}
}

fn saturating_i64(value: u64) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}
