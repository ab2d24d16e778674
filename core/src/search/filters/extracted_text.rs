use super::{non_blank, select_upstream, setter_ids_in, where_all, ClauseBuilder, GROUP_BY_UPSTREAM};
use crate::search::sql::Sql;

use serde::{Deserialize, Serialize};

/// Full-text match against text extracted from items (OCR, transcripts, captions)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ExtractedTextFilter {
	/// FTS5 match expression, passed through to the store untouched
	pub query: String,
	/// Only text produced by these setters
	pub setters: Vec<String>,
	pub languages: Vec<String>,
	pub min_confidence: Option<f64>,
	pub min_language_confidence: Option<f64>,
}

impl ClauseBuilder for ExtractedTextFilter {
	fn validate(&self) -> bool {
		!self.query.trim().is_empty()
	}

	fn rank_column(&self) -> Option<&'static str> {
		Some("rank_fts")
	}

	fn build(&self, upstream: &str) -> Sql {
		let mut conditions = vec![Sql::bind(
			"extracted_text_fts MATCH ?",
			[self.query.clone()],
		)];
		conditions.extend(text_source_conditions(
			&self.setters,
			&self.languages,
			self.min_confidence,
			self.min_language_confidence,
		));

		Sql::raw(format!(
			"{} FROM {upstream} AS prev \
			JOIN extracted_text ON extracted_text.item_id = prev.item_id \
			JOIN extracted_text_fts ON extracted_text_fts.rowid = extracted_text.id",
			select_upstream(Some(("MIN(extracted_text_fts.rank)", "rank_fts")))
		)) + where_all(conditions)
			+ Sql::raw(GROUP_BY_UPSTREAM)
	}
}

/// Restrictions on which `extracted_text` rows count, shared by every text-based filter
pub(crate) fn text_source_conditions(
	setters: &[String],
	languages: &[String],
	min_confidence: Option<f64>,
	min_language_confidence: Option<f64>,
) -> Vec<Sql> {
	let mut conditions = Vec::new();

	let setters = non_blank(setters);
	if !setters.is_empty() {
		conditions.push(setter_ids_in("extracted_text.setter_id", &setters));
	}

	let languages = non_blank(languages);
	if !languages.is_empty() {
		conditions.push(Sql::in_list("extracted_text.language", languages));
	}

	if let Some(min) = min_confidence {
		conditions.push(Sql::bind("extracted_text.confidence >= ?", [min]));
	}
	if let Some(min) = min_language_confidence {
		conditions.push(Sql::bind(
			"extracted_text.language_confidence >= ?",
			[min],
		));
	}

	conditions
}
