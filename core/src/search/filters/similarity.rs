use super::{
	embeddings::{distance_expr, DistanceAggregation, DistanceFunction},
	select_upstream, where_all, ClauseBuilder, GROUP_BY_UPSTREAM,
};
use crate::search::sql::Sql;

use serde::{Deserialize, Serialize};

/// Items whose embeddings lie closest to those of a target item
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ItemSimilarityFilter {
	/// sha256 of the item to compare against; never part of the results
	pub target: String,
	/// Name of the setter whose embeddings are compared
	pub model: String,
	pub distance_function: DistanceFunction,
	pub distance_aggregation: DistanceAggregation,
}

impl ClauseBuilder for ItemSimilarityFilter {
	fn validate(&self) -> bool {
		!self.target.trim().is_empty() && !self.model.trim().is_empty()
	}

	fn rank_column(&self) -> Option<&'static str> {
		Some("item_similarity_distance")
	}

	fn build(&self, upstream: &str) -> Sql {
		let distance = distance_expr(
			self.distance_function,
			self.distance_aggregation,
			"candidate.embedding",
			"target.embedding",
		);

		Sql::raw(format!(
			"{} FROM {upstream} AS prev \
			JOIN embeddings AS candidate ON candidate.item_id = prev.item_id \
			JOIN embeddings AS target ON target.setter_id = candidate.setter_id",
			select_upstream(Some((distance.as_str(), "item_similarity_distance")))
		)) + where_all(vec![
			Sql::bind(
				"target.item_id = (SELECT id FROM items WHERE sha256 = ?)",
				[self.target.trim().to_lowercase()],
			),
			Sql::raw("prev.item_id != target.item_id"),
			Sql::bind(
				"candidate.setter_id IN (SELECT id FROM setters WHERE name = ?)",
				[self.model.trim().to_string()],
			),
		]) + Sql::raw(GROUP_BY_UPSTREAM)
	}
}
