//! Query assembly
//!
//! One compiled body feeds both statements of a search: the count statement
//! wraps it, and the fetch statement orders and pages it. The reported total
//! and the returned pages always describe the same set of rows.

use super::{
	chain::Chain,
	input::{OrderParams, SearchQuery},
	sorting::ResolvedOrder,
	sql::Sql,
	tags::build_tag_query,
};
use crate::{config::SearchConfig, error::SearchError};

use tracing::debug;

/// Columns every result row carries
const RESULT_COLUMNS: &str = "SELECT files.path AS path, items.sha256 AS sha256, \
	files.last_modified AS last_modified, items.mime_type AS mime_type";

/// Statements for one search request
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
	/// `SELECT COUNT(*) AS total FROM (...)`
	pub count: Sql,
	/// The ordered page of results
	pub fetch: Sql,
	pub order: ResolvedOrder,
	pub limit: i64,
	pub offset: i64,
}

/// Turns search requests into SQL
pub struct QueryCompiler<'a> {
	config: &'a SearchConfig,
}

impl<'a> QueryCompiler<'a> {
	pub fn new(config: &'a SearchConfig) -> Self {
		Self { config }
	}

	/// Compiles a request; the request should already be normalized
	pub fn compile(&self, query: &SearchQuery) -> Result<CompiledQuery, SearchError> {
		let tag_query = build_tag_query(&query.query.tags, self.config.min_tag_confidence);
		let chain = Chain::build(
			tag_query,
			&query.query.filters.to_filters(),
			&query.query.exclude,
		);

		let order = ResolvedOrder::resolve(query.order.order_by, query.order.order, &chain.active);
		let (limit, offset) = self.pagination(&query.order);

		let body = assemble(&chain);
		let count = body.clone().wrap("SELECT COUNT(*) AS total FROM (", ")");
		let fetch = body
			+ Sql::bind(
				format!(" ORDER BY {} LIMIT ? OFFSET ?", order.to_sql()),
				[limit, offset],
			);

		count.arity_check()?;
		fetch.arity_check()?;

		debug!(
			stages = chain.ctes.len(),
			params = fetch.params().len(),
			order_by = %order.order_by,
			direction = %order.direction,
			sql = fetch.text(),
			"Compiled search query"
		);

		Ok(CompiledQuery {
			count,
			fetch,
			order,
			limit,
			offset,
		})
	}

	/// `(LIMIT, OFFSET)` for a request; pages before the first clamp to it
	fn pagination(&self, order: &OrderParams) -> (i64, i64) {
		let page_size = self.config.page_size(order.page_size);
		let page = order.page.max(1) as u64;
		let offset = (page - 1).saturating_mul(page_size);

		(to_i64(page_size), to_i64(offset))
	}
}

fn to_i64(value: u64) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}

/// The unordered query producing every result row
fn assemble(chain: &Chain) -> Sql {
	let mut columns = String::from(RESULT_COLUMNS);
	let mut joins = format!(
		" FROM {} AS result \
		JOIN files ON files.id = result.file_id \
		JOIN items ON items.id = result.item_id",
		chain.result
	);

	for rank in &chain.ranks {
		if rank.cte == chain.result {
			columns.push_str(&format!(", result.{0} AS {0}", rank.column));
		} else {
			columns.push_str(&format!(", {0}.{1} AS {1}", rank.cte, rank.column));
			joins.push_str(&format!(
				" JOIN {0} ON {0}.file_id = result.file_id",
				rank.cte
			));
		}
	}

	chain.with_clause() + Sql::raw(columns + &joins)
}
