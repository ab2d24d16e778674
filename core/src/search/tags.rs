//! Tag matching
//!
//! Four tag lists combine into one query over item ids:
//!
//! - `pos_match_all`: the item has every one of these tags
//! - `pos_match_any`: the item has at least one of these tags
//! - `neg_match_any`: the item has none of these tags
//! - `neg_match_all`: the item does not have all of these tags together
//!
//! Setter, namespace and confidence restrictions apply to every list alike and
//! are bound again in each sub-query that uses them.

use super::sql::Sql;
use super::filters::{non_blank, setter_ids_in};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TagFilter {
	pub pos_match_all: Vec<String>,
	pub pos_match_any: Vec<String>,
	pub neg_match_any: Vec<String>,
	pub neg_match_all: Vec<String>,
	/// Every tag must have been set by every listed setter, not just by one of them
	pub all_setters_required: bool,
	/// Only tags set by these setters count
	pub setters: Vec<String>,
	/// Namespace prefixes; only tags in a matching namespace count
	pub namespaces: Vec<String>,
	pub min_confidence: Option<f64>,
}

impl TagFilter {
	/// Cleans the tag lists and folds single-tag lists into their equivalent form.
	///
	/// Tags are trimmed, lower-cased and deduplicated. One tag that must match
	/// "any" is the same as one tag that must match "all", and excluding items
	/// that have "all" of one tag is the same as excluding "any" of it.
	pub fn normalize(mut self) -> Self {
		self.pos_match_all = clean_tags(self.pos_match_all);
		self.pos_match_any = clean_tags(self.pos_match_any);
		self.neg_match_any = clean_tags(self.neg_match_any);
		self.neg_match_all = clean_tags(self.neg_match_all);
		self.setters = dedup(non_blank(&self.setters));
		self.namespaces = dedup(non_blank(&self.namespaces));

		if self.pos_match_any.len() == 1 {
			let tag = self.pos_match_any.remove(0);
			if !self.pos_match_all.contains(&tag) {
				self.pos_match_all.push(tag);
			}
		}

		if self.neg_match_all.len() == 1 {
			let tag = self.neg_match_all.remove(0);
			if !self.neg_match_any.contains(&tag) {
				self.neg_match_any.push(tag);
			}
		}

		self
	}

	pub fn is_empty(&self) -> bool {
		self.pos_match_all.is_empty()
			&& self.pos_match_any.is_empty()
			&& self.neg_match_any.is_empty()
			&& self.neg_match_all.is_empty()
	}
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
	let mut seen = HashSet::new();
	tags.into_iter()
		.map(|tag| tag.trim().to_lowercase())
		.filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
		.collect()
}

fn dedup(values: Vec<&str>) -> Vec<String> {
	let mut seen = HashSet::new();
	values
		.into_iter()
		.filter(|v| seen.insert(*v))
		.map(str::to_string)
		.collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
	All,
	Any,
}

/// Restrictions shared by every tag sub-query
struct TagScope<'a> {
	setters: Vec<&'a str>,
	namespaces: Vec<&'a str>,
	min_confidence: Option<f64>,
	all_setters_required: bool,
}

impl<'a> TagScope<'a> {
	fn new(tags: &'a TagFilter, default_min_confidence: Option<f64>) -> Self {
		let setters = non_blank(&tags.setters);
		Self {
			all_setters_required: tags.all_setters_required && !setters.is_empty(),
			setters,
			namespaces: non_blank(&tags.namespaces),
			min_confidence: tags
				.min_confidence
				.or(default_min_confidence)
				.filter(|c| *c > 0.0),
		}
	}

	/// `FROM ... WHERE` shared by every sub-query, matching rows tagged with `names`
	fn matching_rows(&self, names: &[String]) -> Sql {
		let mut conditions = vec![Sql::in_list(
			"tags_setters.name",
			names.iter().map(String::as_str),
		)];

		if let Some(min) = self.min_confidence {
			conditions.push(Sql::bind("tags_items.confidence >= ?", [min]));
		}
		if !self.setters.is_empty() {
			conditions.push(setter_ids_in("tags_setters.setter_id", &self.setters));
		}
		if !self.namespaces.is_empty() {
			conditions.push(Sql::like_any_prefix(
				"tags_setters.namespace",
				self.namespaces.iter().copied(),
			));
		}

		Sql::join(" AND ", conditions).wrap(
			"SELECT tags_items.item_id AS item_id FROM tags_items \
			JOIN tags_setters ON tags_setters.id = tags_items.tag_id WHERE ",
			"",
		)
	}

	/// Items having all (or any) of `names`, minus the items selected by `exclude`
	fn match_query(&self, names: &[String], mode: Match, exclude: Option<Sql>) -> Sql {
		let mut query = self.matching_rows(names);

		if let Some(exclude) = exclude {
			query += exclude.wrap(" AND tags_items.item_id NOT IN (", ")");
		}

		query.push_str(" GROUP BY tags_items.item_id");

		if mode == Match::All {
			query += if self.all_setters_required {
				Sql::bind(
					" HAVING COUNT(DISTINCT tags_setters.setter_id || '-' || tags_setters.name) = ?",
					[(names.len() * self.setters.len()) as i64],
				)
			} else {
				Sql::bind(
					" HAVING COUNT(DISTINCT tags_setters.name) = ?",
					[names.len() as i64],
				)
			};
		}

		query
	}
}

const ALL_ITEMS: &str = "SELECT items.id AS item_id FROM items";

/// Compiles a tag filter into a query selecting one `item_id` column.
///
/// Returns `None` when the filter has no tags, meaning "no tag restriction".
pub fn build_tag_query(tags: &TagFilter, default_min_confidence: Option<f64>) -> Option<Sql> {
	if tags.is_empty() {
		return None;
	}

	let scope = TagScope::new(tags, default_min_confidence);

	let exclude_any = (!tags.neg_match_any.is_empty())
		.then(|| scope.matching_rows(&tags.neg_match_any));

	let (positive, is_compound) = match (
		tags.pos_match_all.is_empty(),
		tags.pos_match_any.is_empty(),
	) {
		(false, true) => (
			Some(scope.match_query(&tags.pos_match_all, Match::All, exclude_any)),
			false,
		),
		(true, false) => (
			Some(scope.match_query(&tags.pos_match_any, Match::Any, exclude_any)),
			false,
		),
		(false, false) => {
			// (all \ excluded) ∩ any == (all ∩ any) \ excluded
			let all = scope.match_query(&tags.pos_match_all, Match::All, exclude_any);
			let any = scope.match_query(&tags.pos_match_any, Match::Any, None);
			(Some(all + Sql::raw(" INTERSECT ") + any), true)
		}
		(true, true) => (
			exclude_any.map(|exclude| {
				exclude.wrap(&format!("{ALL_ITEMS} WHERE items.id NOT IN ("), ")")
			}),
			false,
		),
	};

	if tags.neg_match_all.is_empty() {
		return positive;
	}

	let base = match positive {
		Some(query) if is_compound => query.wrap("SELECT item_id FROM (", ")"),
		Some(query) => query,
		None => Sql::raw(ALL_ITEMS),
	};

	Some(base + Sql::raw(" EXCEPT ") + scope.match_query(&tags.neg_match_all, Match::All, None))
}
