use super::{
	extracted_text::text_source_conditions, select_upstream, where_all, ClauseBuilder,
	GROUP_BY_UPSTREAM,
};
use crate::search::sql::{f32_blob, Sql};

use serde::{Deserialize, Serialize};

/// Vector distance function provided by the store
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DistanceFunction {
	#[default]
	L2,
	Cosine,
}

impl DistanceFunction {
	pub fn sql_function(self) -> &'static str {
		match self {
			Self::L2 => "vec_distance_l2",
			Self::Cosine => "vec_distance_cosine",
		}
	}
}

/// How the distances of an item's many embeddings collapse into one score
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistanceAggregation {
	#[default]
	Min,
	Max,
	Avg,
}

impl DistanceAggregation {
	pub fn sql_function(self) -> &'static str {
		match self {
			Self::Min => "MIN",
			Self::Max => "MAX",
			Self::Avg => "AVG",
		}
	}
}

/// `AGG(distance(column, other))`
pub(crate) fn distance_expr(
	function: DistanceFunction,
	aggregation: DistanceAggregation,
	column: &str,
	other: &str,
) -> String {
	format!(
		"{}({}({column}, {other}))",
		aggregation.sql_function(),
		function.sql_function()
	)
}

/// Nearest extracted text, by the embeddings of that text
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TextEmbeddingsFilter {
	/// Query vector, produced by `model`
	pub embedding: Vec<f32>,
	/// Name of the setter that produced the stored embeddings
	pub model: String,
	pub distance_function: DistanceFunction,
	pub distance_aggregation: DistanceAggregation,
	/// Only text produced by these setters
	pub src_setters: Vec<String>,
	pub src_languages: Vec<String>,
	pub src_min_confidence: Option<f64>,
}

impl ClauseBuilder for TextEmbeddingsFilter {
	fn validate(&self) -> bool {
		!self.embedding.is_empty() && !self.model.trim().is_empty()
	}

	fn rank_column(&self) -> Option<&'static str> {
		Some("text_vec_distance")
	}

	fn build(&self, upstream: &str) -> Sql {
		let distance = distance_expr(
			self.distance_function,
			self.distance_aggregation,
			"embeddings.embedding",
			"?",
		);

		let mut conditions = vec![Sql::bind(
			"embeddings.setter_id IN (SELECT id FROM setters WHERE name = ?)",
			[self.model.trim().to_string()],
		)];
		conditions.extend(text_source_conditions(
			&self.src_setters,
			&self.src_languages,
			self.src_min_confidence,
			None,
		));

		Sql::bind(
			format!(
				"{} FROM {upstream} AS prev \
				JOIN embeddings ON embeddings.item_id = prev.item_id \
				JOIN extracted_text ON extracted_text.id = embeddings.text_id",
				select_upstream(Some((distance.as_str(), "text_vec_distance")))
			),
			[f32_blob(&self.embedding)],
		) + where_all(conditions)
			+ Sql::raw(GROUP_BY_UPSTREAM)
	}
}

/// Nearest items by their image embeddings
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ImageEmbeddingsFilter {
	/// Query vector, produced by `model`
	pub embedding: Vec<f32>,
	/// Name of the setter that produced the stored embeddings
	pub model: String,
	pub distance_function: DistanceFunction,
	pub distance_aggregation: DistanceAggregation,
}

impl ClauseBuilder for ImageEmbeddingsFilter {
	fn validate(&self) -> bool {
		!self.embedding.is_empty() && !self.model.trim().is_empty()
	}

	fn rank_column(&self) -> Option<&'static str> {
		Some("image_vec_distance")
	}

	fn build(&self, upstream: &str) -> Sql {
		let distance = distance_expr(
			self.distance_function,
			self.distance_aggregation,
			"embeddings.embedding",
			"?",
		);

		Sql::bind(
			format!(
				"{} FROM {upstream} AS prev \
				JOIN embeddings ON embeddings.item_id = prev.item_id",
				select_upstream(Some((distance.as_str(), "image_vec_distance")))
			),
			[f32_blob(&self.embedding)],
		) + where_all(vec![
			Sql::bind(
				"embeddings.setter_id IN (SELECT id FROM setters WHERE name = ?)",
				[self.model.trim().to_string()],
			),
			Sql::raw("embeddings.text_id IS NULL"),
		]) + Sql::raw(GROUP_BY_UPSTREAM)
	}
}
