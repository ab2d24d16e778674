//! Search request types

use super::{
	filters::*,
	sorting::{OrderBy, SortDirection},
	tags::TagFilter,
};

use serde::{Deserialize, Serialize};

/// A complete search request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchQuery {
	pub query: QueryParams,
	pub order: OrderParams,
	/// Whether to run the count statement; the reported total is 0 otherwise
	pub count: bool,
	/// Drop results whose path no longer exists on disk.
	/// Falls back to the configured default when unset.
	pub check_path: Option<bool>,
}

impl Default for SearchQuery {
	fn default() -> Self {
		Self {
			query: QueryParams::default(),
			order: OrderParams::default(),
			count: true,
			check_path: None,
		}
	}
}

impl SearchQuery {
	/// Cleans the request once, before it is compiled
	pub fn normalize(mut self) -> Self {
		self.query.tags = self.query.tags.normalize();
		self
	}
}

/// What to search for
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QueryParams {
	pub tags: TagFilter,
	pub filters: QueryFilters,
	/// Files matched by any of these filters are removed from the results
	pub exclude: Vec<Filter>,
}

/// At most one filter of each kind; an absent filter leaves that dimension unconstrained
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QueryFilters {
	pub files: Option<MatchFiles>,
	pub path_text: Option<PathTextFilter>,
	pub extracted_text: Option<ExtractedTextFilter>,
	pub extracted_text_embeddings: Option<TextEmbeddingsFilter>,
	pub image_embeddings: Option<ImageEmbeddingsFilter>,
	pub item_similarity: Option<ItemSimilarityFilter>,
	pub bookmarks: Option<BookmarksFilter>,
	pub any_text: Option<AnyTextFilter>,
}

impl QueryFilters {
	/// The present filters, in the order their stages are chained.
	///
	/// Cheap structural filters come first so the text and vector stages see
	/// as few rows as possible.
	pub fn to_filters(&self) -> Vec<Filter> {
		let mut filters = Vec::new();

		if let Some(f) = &self.files {
			filters.push(Filter::Files(f.clone()));
		}
		if let Some(f) = &self.bookmarks {
			filters.push(Filter::Bookmarks(f.clone()));
		}
		if let Some(f) = &self.path_text {
			filters.push(Filter::PathText(f.clone()));
		}
		if let Some(f) = &self.extracted_text {
			filters.push(Filter::ExtractedText(f.clone()));
		}
		if let Some(f) = &self.any_text {
			filters.push(Filter::AnyText(f.clone()));
		}
		if let Some(f) = &self.extracted_text_embeddings {
			filters.push(Filter::ExtractedTextEmbeddings(f.clone()));
		}
		if let Some(f) = &self.image_embeddings {
			filters.push(Filter::ImageEmbeddings(f.clone()));
		}
		if let Some(f) = &self.item_similarity {
			filters.push(Filter::ItemSimilarity(f.clone()));
		}

		filters
	}
}

/// Ordering and pagination
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OrderParams {
	/// Sort target; picked from the active filters when unset
	pub order_by: Option<OrderBy>,
	/// Sort direction; the target's natural direction when unset
	pub order: Option<SortDirection>,
	/// 1-based page number, values below 1 are treated as 1
	pub page: i64,
	/// Rows per page; `0` means everything in one page
	pub page_size: Option<u64>,
}

impl Default for OrderParams {
	fn default() -> Self {
		Self {
			order_by: None,
			order: None,
			page: 1,
			page_size: None,
		}
	}
}
