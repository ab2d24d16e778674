//! Filter chaining
//!
//! Filters become an ordered list of CTE stages. Positive filters are chained:
//! each stage reads the one before it, so every filter narrows the candidates
//! further. Negative filters all read the unfiltered `root` stage, and the union
//! of what they match is subtracted from the last positive stage with `EXCEPT`.
//!
//! Every stage selects `file_id` and `item_id`, and a file appears at most once
//! in any stage.

use super::{
	filters::{Filter, FilterKind},
	sql::Sql,
};
use crate::error::SearchError;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The unfiltered stage every chain starts from
pub const ROOT: &str = "root";
const TAG_MATCHES: &str = "tag_matches";
const REMAINING: &str = "remaining";

/// One named stage of a `WITH` clause
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
	pub name: String,
	pub body: Sql,
}

/// A stage that selects a rank column
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStage {
	pub kind: FilterKind,
	pub cte: String,
	pub column: &'static str,
}

/// Compiled stages, ready to be wrapped in a `WITH` clause
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
	pub ctes: Vec<Cte>,
	/// Name of the stage holding the final candidates
	pub result: String,
	/// Positive stages with a rank column, in chain order
	pub ranks: Vec<RankedStage>,
	/// Kinds of the positive filters that made it into the chain
	pub active: Vec<FilterKind>,
}

impl Chain {
	/// Starts a chain over all files, restricted to the items selected by
	/// `tag_query` when there is one
	pub fn new(tag_query: Option<Sql>) -> Self {
		let mut ctes = Vec::with_capacity(2);

		let root = match tag_query {
			Some(tag_query) => {
				ctes.push(Cte {
					name: TAG_MATCHES.to_string(),
					body: tag_query,
				});
				Sql::raw(format!(
					"SELECT files.id AS file_id, files.item_id AS item_id FROM files \
					JOIN {TAG_MATCHES} ON {TAG_MATCHES}.item_id = files.item_id"
				))
			}
			None => Sql::raw("SELECT files.id AS file_id, files.item_id AS item_id FROM files"),
		};

		ctes.push(Cte {
			name: ROOT.to_string(),
			body: root,
		});

		Self {
			ctes,
			result: ROOT.to_string(),
			ranks: Vec::new(),
			active: Vec::new(),
		}
	}

	/// Chains the valid positive filters and subtracts the valid negative ones.
	/// Invalid filters are skipped as if they were never given.
	pub fn build(tag_query: Option<Sql>, positive: &[Filter], negative: &[Filter]) -> Self {
		let chain = positive
			.iter()
			.filter(|filter| filter.validate())
			.fold(Self::new(tag_query), Self::then);

		chain.except(negative)
	}

	/// Appends one positive stage reading the current result
	fn then(mut self, filter: &Filter) -> Self {
		let kind = filter.kind();
		let name = format!("p{}_{kind}", self.active.len());
		let clause = filter.to_clause(&self.result);

		if let Some(column) = clause.rank {
			self.ranks.push(RankedStage {
				kind,
				cte: name.clone(),
				column,
			});
		}

		self.ctes.push(Cte {
			name: name.clone(),
			body: clause.body,
		});
		self.active.push(kind);
		self.result = name;
		self
	}

	/// Removes every file matched by any of `negative`
	fn except(mut self, negative: &[Filter]) -> Self {
		let excluded: Vec<Cte> = negative
			.iter()
			.filter(|filter| filter.validate())
			.enumerate()
			.map(|(i, filter)| Cte {
				name: format!("n{i}_{}", filter.kind()),
				body: filter.to_clause(ROOT).body,
			})
			.collect();

		if excluded.is_empty() {
			return self;
		}

		debug!(count = excluded.len(), "Excluding negative filter matches");

		let union = excluded
			.iter()
			.map(|cte| format!("SELECT file_id, item_id FROM {}", cte.name))
			.collect::<Vec<_>>()
			.join(" UNION ");

		let remaining = Sql::raw(format!(
			"SELECT file_id, item_id FROM {} EXCEPT SELECT file_id, item_id FROM ({union})",
			self.result
		));

		self.ctes.extend(excluded);
		self.ctes.push(Cte {
			name: REMAINING.to_string(),
			body: remaining,
		});
		self.result = REMAINING.to_string();
		self
	}

	/// `WITH a AS (...), b AS (...)` followed by a space
	pub fn with_clause(&self) -> Sql {
		Sql::join(
			", ",
			self.ctes
				.iter()
				.map(|cte| cte.body.clone().wrap(&format!("{} AS (", cte.name), ")")),
		)
		.wrap("WITH ", " ")
	}
}

/// Filters of a user-defined ingestion rule
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RuleItemFilters {
	/// Items must match all of these
	pub positive: Vec<Filter>,
	/// Items matching any of these are left out
	pub negative: Vec<Filter>,
}

/// Compiles a rule into a query selecting the distinct `item_id`s it matches
pub fn build_rule_items_query(rule: &RuleItemFilters) -> Result<Sql, SearchError> {
	let chain = Chain::build(None, &rule.positive, &rule.negative);

	let query = chain.with_clause()
		+ Sql::raw(format!(
			"SELECT DISTINCT result.item_id AS item_id FROM {} AS result",
			chain.result
		));
	query.arity_check()?;

	Ok(query)
}
