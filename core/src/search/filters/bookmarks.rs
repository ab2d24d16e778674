use super::{non_blank, select_upstream, where_all, ClauseBuilder, GROUP_BY_UPSTREAM};
use crate::search::sql::Sql;

use serde::{Deserialize, Serialize};

/// Bookmarks owned by this user are visible to everyone
pub const WILDCARD_USER: &str = "*";

/// Only bookmarked items
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BookmarksFilter {
	/// Bookmark groups to consider; empty means all of them
	pub namespaces: Vec<String>,
	pub user: String,
	/// Also accept bookmarks shared through the wildcard user
	pub include_wildcard: bool,
}

impl Default for BookmarksFilter {
	fn default() -> Self {
		Self {
			namespaces: Vec::new(),
			user: "user".to_string(),
			include_wildcard: true,
		}
	}
}

impl ClauseBuilder for BookmarksFilter {
	fn validate(&self) -> bool {
		!self.user.trim().is_empty()
	}

	fn rank_column(&self) -> Option<&'static str> {
		Some("time_added")
	}

	fn build(&self, upstream: &str) -> Sql {
		let mut users = vec![self.user.trim()];
		if self.include_wildcard && self.user.trim() != WILDCARD_USER {
			users.push(WILDCARD_USER);
		}

		let mut conditions = vec![Sql::in_list("bookmarks.user", users)];

		let namespaces = non_blank(&self.namespaces);
		if !namespaces.is_empty() {
			conditions.push(Sql::in_list("bookmarks.namespace", namespaces));
		}

		Sql::raw(format!(
			"{} FROM {upstream} AS prev \
			JOIN bookmarks ON bookmarks.item_id = prev.item_id",
			select_upstream(Some(("MAX(bookmarks.time_added)", "time_added")))
		)) + where_all(conditions)
			+ Sql::raw(GROUP_BY_UPSTREAM)
	}
}
