//! Search filters
//!
//! Each filter kind is a plain value carrying only its own parameters. A filter
//! compiles into the body of one CTE stage: it reads the `file_id`/`item_id`
//! pairs of an upstream stage, keeps the ones it matches, and may add a single
//! rank column that the assembler can order by.

pub mod any_text;
pub mod bookmarks;
pub mod embeddings;
pub mod extracted_text;
pub mod files;
pub mod path_text;
pub mod similarity;

pub use any_text::*;
pub use bookmarks::*;
pub use embeddings::*;
pub use extracted_text::*;
pub use files::*;
pub use path_text::*;
pub use similarity::*;

use super::sql::Sql;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// Stable names for each filter kind
#[derive(
	Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterKind {
	Files,
	PathText,
	ExtractedText,
	ExtractedTextEmbeddings,
	ImageEmbeddings,
	ItemSimilarity,
	Bookmarks,
	AnyText,
}

/// One filter of any kind
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
	Files(MatchFiles),
	PathText(PathTextFilter),
	ExtractedText(ExtractedTextFilter),
	ExtractedTextEmbeddings(TextEmbeddingsFilter),
	ImageEmbeddings(ImageEmbeddingsFilter),
	ItemSimilarity(ItemSimilarityFilter),
	Bookmarks(BookmarksFilter),
	AnyText(AnyTextFilter),
}

/// What a filter contributes to the compiled query
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
	/// `SELECT` body of the CTE stage
	pub body: Sql,
	/// Alias of the rank column selected by `body`, if any
	pub rank: Option<&'static str>,
}

/// Implemented by every filter kind
pub trait ClauseBuilder {
	/// Whether the filter has enough input to constrain anything.
	///
	/// An invalid filter is never compiled; it behaves exactly as if absent.
	fn validate(&self) -> bool;

	/// Alias of the rank column this filter selects
	fn rank_column(&self) -> Option<&'static str> {
		None
	}

	/// The CTE body reading from the `upstream` stage
	fn build(&self, upstream: &str) -> Sql;
}

impl Filter {
	pub fn kind(&self) -> FilterKind {
		match self {
			Self::Files(_) => FilterKind::Files,
			Self::PathText(_) => FilterKind::PathText,
			Self::ExtractedText(_) => FilterKind::ExtractedText,
			Self::ExtractedTextEmbeddings(_) => FilterKind::ExtractedTextEmbeddings,
			Self::ImageEmbeddings(_) => FilterKind::ImageEmbeddings,
			Self::ItemSimilarity(_) => FilterKind::ItemSimilarity,
			Self::Bookmarks(_) => FilterKind::Bookmarks,
			Self::AnyText(_) => FilterKind::AnyText,
		}
	}

	fn builder(&self) -> &dyn ClauseBuilder {
		match self {
			Self::Files(f) => f,
			Self::PathText(f) => f,
			Self::ExtractedText(f) => f,
			Self::ExtractedTextEmbeddings(f) => f,
			Self::ImageEmbeddings(f) => f,
			Self::ItemSimilarity(f) => f,
			Self::Bookmarks(f) => f,
			Self::AnyText(f) => f,
		}
	}

	pub fn validate(&self) -> bool {
		self.builder().validate()
	}

	pub fn to_clause(&self, upstream: &str) -> Clause {
		let builder = self.builder();
		Clause {
			body: builder.build(upstream),
			rank: builder.rank_column(),
		}
	}
}

/// Entries of a list that are not blank
pub(crate) fn non_blank(values: &[String]) -> Vec<&str> {
	values
		.iter()
		.map(|v| v.trim())
		.filter(|v| !v.is_empty())
		.collect()
}

/// `column IN (SELECT id FROM setters WHERE name IN (...))`
pub(crate) fn setter_ids_in(column: &str, names: &[&str]) -> Sql {
	Sql::in_list("name", names.iter().copied())
		.wrap(&format!("{column} IN (SELECT id FROM setters WHERE "), ")")
}

/// ` WHERE a AND b ...`, or nothing when there are no conditions
pub(crate) fn where_all(conditions: Vec<Sql>) -> Sql {
	if conditions.is_empty() {
		return Sql::default();
	}
	Sql::join(" AND ", conditions).wrap(" WHERE ", "")
}

/// The leading `SELECT` list every stage shares
pub(crate) fn select_upstream(rank: Option<(&str, &str)>) -> String {
	match rank {
		Some((expr, alias)) => format!(
			"SELECT prev.file_id AS file_id, prev.item_id AS item_id, {expr} AS {alias}"
		),
		None => "SELECT prev.file_id AS file_id, prev.item_id AS item_id".to_string(),
	}
}

pub(crate) const GROUP_BY_UPSTREAM: &str = " GROUP BY prev.file_id, prev.item_id";
