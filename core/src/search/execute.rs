//! Search execution

use super::{input::SearchQuery, output::FileSearchResult, query::QueryCompiler, sql::Sql};
use crate::{config::SearchConfig, error::SearchError};

use std::{
	pin::{pin, Pin},
	task::{Context, Poll},
};

use async_stream::try_stream;
use futures::{stream::BoxStream, Stream, StreamExt};
use sea_orm::{ConnectionTrait, DbBackend, Statement, StreamTrait};
use tracing::{info, instrument, trace};

/// Rows of one page of a search, fetched lazily.
///
/// Each item pairs a result with the total number of matching files; the total
/// is 0 when the request did not ask for a count. The stream is finite and
/// cannot be restarted. Dropping it stops any further fetching.
pub struct SearchResults<'a> {
	total: u64,
	inner: BoxStream<'a, Result<(FileSearchResult, u64), SearchError>>,
}

impl SearchResults<'_> {
	pub fn total_count(&self) -> u64 {
		self.total
	}
}

impl Stream for SearchResults<'_> {
	type Item = Result<(FileSearchResult, u64), SearchError>;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.inner.poll_next_unpin(cx)
	}
}

/// Runs a search against the store.
///
/// The count statement (when requested) runs before this returns; result rows
/// are only fetched as the returned stream is polled.
#[instrument(
	skip_all,
	fields(page = query.order.page, page_size = ?query.order.page_size, count = query.count)
)]
pub async fn search<'a, C>(
	conn: &'a C,
	config: &SearchConfig,
	query: SearchQuery,
) -> Result<SearchResults<'a>, SearchError>
where
	C: ConnectionTrait + StreamTrait + Send + Sync,
{
	let query = query.normalize();
	let compiled = QueryCompiler::new(config).compile(&query)?;

	let total = if query.count {
		count(conn, compiled.count).await?
	} else {
		0
	};

	info!(
		total,
		limit = compiled.limit,
		offset = compiled.offset,
		order_by = %compiled.order.order_by,
		"Running search"
	);

	let check_path = query.check_path.unwrap_or(config.check_path_by_default);

	Ok(SearchResults {
		total,
		inner: Box::pin(fetch_rows(conn, compiled.fetch, total, check_path)),
	})
}

fn fetch_rows<'a, C>(
	conn: &'a C,
	fetch: Sql,
	total: u64,
	check_path: bool,
) -> impl Stream<Item = Result<(FileSearchResult, u64), SearchError>> + Send + 'a
where
	C: ConnectionTrait + StreamTrait + Send + Sync,
{
	let (sql, values) = fetch.into_parts();

	try_stream! {
		let rows = conn
			.stream(Statement::from_sql_and_values(DbBackend::Sqlite, sql.clone(), values))
			.await
			.map_err(|e| SearchError::query(&sql, e))?;
		let mut rows = pin!(rows);
		let (mut returned, mut dropped) = (0u64, 0u64);

		while let Some(row) = rows.next().await {
			let row = row.map_err(|e| SearchError::query(&sql, e))?;
			let result = FileSearchResult::from_row(&row)?;

			if check_path && !path_exists(&result.path).await {
				trace!(path = %result.path, "Dropping result for missing file");
				dropped += 1;
				continue;
			}

			returned += 1;
			yield (result, total);
		}

		info!(returned, dropped, total, "Search finished");
	}
}

async fn count<C: ConnectionTrait>(conn: &C, statement: Sql) -> Result<u64, SearchError> {
	let sql = statement.text().to_string();

	let total = match conn
		.query_one(statement.into_statement())
		.await
		.map_err(|e| SearchError::query(&sql, e))?
	{
		Some(row) => row
			.try_get::<i64>("", "total")
			.map_err(|e| SearchError::query(&sql, e))?,
		None => 0,
	};

	Ok(u64::try_from(total).unwrap_or_default())
}

/// A path that can't be checked counts as missing
async fn path_exists(path: &str) -> bool {
	tokio::fs::try_exists(path).await.unwrap_or(false)
}
