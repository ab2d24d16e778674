//! Result ordering
//!
//! Exactly one sort target is active per query. Filters that rank their matches
//! expose the rank under the same name as the matching [`OrderBy`] variant.

use super::filters::FilterKind;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};
use tracing::debug;

#[derive(
	Serialize,
	Deserialize,
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	Display,
	AsRefStr,
	IntoStaticStr,
	EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderBy {
	LastModified,
	Path,
	TimeAdded,
	RankFts,
	RankPathFts,
	RankAnyText,
	TextVecDistance,
	ImageVecDistance,
	ItemSimilarityDistance,
}

/// Rank targets tried, in order, when the request names none
const PRECEDENCE: [OrderBy; 7] = [
	OrderBy::RankFts,
	OrderBy::RankPathFts,
	OrderBy::TimeAdded,
	OrderBy::RankAnyText,
	OrderBy::TextVecDistance,
	OrderBy::ImageVecDistance,
	OrderBy::ItemSimilarityDistance,
];

impl OrderBy {
	/// The filter that produces this rank, or `None` for plain file columns
	pub fn source(self) -> Option<FilterKind> {
		match self {
			Self::LastModified | Self::Path => None,
			Self::TimeAdded => Some(FilterKind::Bookmarks),
			Self::RankFts => Some(FilterKind::ExtractedText),
			Self::RankPathFts => Some(FilterKind::PathText),
			Self::RankAnyText => Some(FilterKind::AnyText),
			Self::TextVecDistance => Some(FilterKind::ExtractedTextEmbeddings),
			Self::ImageVecDistance => Some(FilterKind::ImageEmbeddings),
			Self::ItemSimilarityDistance => Some(FilterKind::ItemSimilarity),
		}
	}

	/// Lower ranks and distances are better; recent things first
	pub fn default_direction(self) -> SortDirection {
		match self {
			Self::LastModified | Self::TimeAdded => SortDirection::Desc,
			_ => SortDirection::Asc,
		}
	}

	/// Expression the fetch statement orders by
	pub fn sql_target(self) -> &'static str {
		match self {
			Self::LastModified => "files.last_modified",
			Self::Path => "files.path",
			_ => self.into(),
		}
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	#[strum(serialize = "ASC")]
	Asc,
	#[strum(serialize = "DESC")]
	Desc,
}

/// The sort target and direction a compiled query uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOrder {
	pub order_by: OrderBy,
	pub direction: SortDirection,
}

impl ResolvedOrder {
	/// Picks the sort target given the kinds of the active (valid, positive) filters.
	///
	/// A requested rank whose filter is not active falls back to
	/// `last_modified` in its natural direction.
	pub fn resolve(
		requested: Option<OrderBy>,
		direction: Option<SortDirection>,
		active: &[FilterKind],
	) -> Self {
		let is_active = |order: &OrderBy| order.source().map_or(true, |kind| active.contains(&kind));

		match requested {
			Some(order_by) if is_active(&order_by) => Self {
				order_by,
				direction: direction.unwrap_or(order_by.default_direction()),
			},
			Some(order_by) => {
				debug!(%order_by, "Requested order has no active filter, using last_modified");
				Self::natural(OrderBy::LastModified)
			}
			None => {
				let order_by = PRECEDENCE
					.into_iter()
					.find(|order| order.source().is_some_and(|kind| active.contains(&kind)))
					.unwrap_or(OrderBy::LastModified);
				Self {
					order_by,
					direction: direction.unwrap_or(order_by.default_direction()),
				}
			}
		}
	}

	fn natural(order_by: OrderBy) -> Self {
		Self {
			order_by,
			direction: order_by.default_direction(),
		}
	}

	/// `target DIR, result.file_id ASC`
	pub fn to_sql(self) -> String {
		format!(
			"{} {}, result.file_id ASC",
			self.order_by.sql_target(),
			self.direction
		)
	}
}
