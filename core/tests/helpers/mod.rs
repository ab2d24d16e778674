//! Shared fixtures for search integration tests
//!
//! `TestLibrary` is a throwaway library database under a temporary directory,
//! filled the way the scanner and the extraction pipeline would fill it.

#![allow(dead_code)]

use futures::TryStreamExt;
use mediadex_core::{
	db,
	search::{search, FileSearchResult, SearchQuery},
	SearchConfig,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement, Value};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestLibrary {
	pub conn: DatabaseConnection,
	pub config: SearchConfig,
	pub dir: TempDir,
}

impl TestLibrary {
	pub async fn new() -> Self {
		let dir = TempDir::new().unwrap();
		let conn = db::open(&dir.path().join("library.db")).await.unwrap();
		db::schema::create_tables(&conn).await.unwrap();

		Self {
			conn,
			config: SearchConfig::default(),
			dir,
		}
	}

	pub async fn exec(&self, sql: &str, values: Vec<Value>) -> i64 {
		self.conn
			.execute(Statement::from_sql_and_values(DbBackend::Sqlite, sql, values))
			.await
			.unwrap()
			.last_insert_id() as i64
	}

	async fn id_of(&self, sql: &str, values: Vec<Value>) -> i64 {
		self.conn
			.query_one(Statement::from_sql_and_values(DbBackend::Sqlite, sql, values))
			.await
			.unwrap()
			.unwrap()
			.try_get("", "id")
			.unwrap()
	}

	pub async fn add_item(&self, sha256: &str, mime_type: &str, size: i64) -> i64 {
		self.exec(
			"INSERT INTO items (sha256, mime_type, size, time_added) VALUES (?, ?, ?, ?)",
			vec![
				sha256.into(),
				mime_type.into(),
				size.into(),
				"2024-01-01T00:00:00Z".into(),
			],
		)
		.await
	}

	/// `last_modified` is an RFC3339 timestamp
	pub async fn add_file(&self, item_id: i64, path: &str, last_modified: &str) -> i64 {
		let filename = path.rsplit('/').next().unwrap_or(path);
		self.exec(
			"INSERT INTO files (item_id, path, filename, last_modified) VALUES (?, ?, ?, ?)",
			vec![
				item_id.into(),
				path.into(),
				filename.into(),
				last_modified.into(),
			],
		)
		.await
	}

	/// An item with a single image file, modified on day `day` of January 2024
	pub async fn add_image(&self, sha256: &str, path: &str, day: u32) -> i64 {
		let item_id = self.add_item(sha256, "image/jpeg", 1024).await;
		self.add_file(item_id, path, &day_of_january(day)).await;
		item_id
	}

	pub async fn setter(&self, name: &str) -> i64 {
		self.exec(
			"INSERT OR IGNORE INTO setters (name) VALUES (?)",
			vec![name.into()],
		)
		.await;
		self.id_of("SELECT id FROM setters WHERE name = ?", vec![name.into()])
			.await
	}

	/// Tags an item as `namespace:name`, as set by `setter`
	pub async fn tag(
		&self,
		item_id: i64,
		namespace: &str,
		name: &str,
		setter: &str,
		confidence: f64,
	) {
		let setter_id = self.setter(setter).await;
		self.exec(
			"INSERT OR IGNORE INTO tags_setters (namespace, name, setter_id) VALUES (?, ?, ?)",
			vec![namespace.into(), name.into(), setter_id.into()],
		)
		.await;
		let tag_id = self
			.id_of(
				"SELECT id FROM tags_setters WHERE namespace = ? AND name = ? AND setter_id = ?",
				vec![namespace.into(), name.into(), setter_id.into()],
			)
			.await;
		self.exec(
			"INSERT INTO tags_items (item_id, tag_id, confidence) VALUES (?, ?, ?)",
			vec![item_id.into(), tag_id.into(), confidence.into()],
		)
		.await;
	}

	/// A general tag with full confidence
	pub async fn simple_tag(&self, item_id: i64, name: &str) {
		self.tag(item_id, "general", name, "tagger", 1.0).await;
	}

	pub async fn add_text(&self, item_id: i64, setter: &str, language: &str, text: &str) -> i64 {
		let setter_id = self.setter(setter).await;
		self.exec(
			"INSERT INTO extracted_text \
			(item_id, setter_id, language, language_confidence, confidence, text, text_length) \
			VALUES (?, ?, ?, 1.0, 1.0, ?, ?)",
			vec![
				item_id.into(),
				setter_id.into(),
				language.into(),
				text.into(),
				(text.len() as i64).into(),
			],
		)
		.await
	}

	pub async fn bookmark(&self, item_id: i64, namespace: &str, user: &str, day: u32) {
		self.exec(
			"INSERT INTO bookmarks (namespace, user, item_id, time_added) VALUES (?, ?, ?, ?)",
			vec![
				namespace.into(),
				user.into(),
				item_id.into(),
				day_of_january(day).into(),
			],
		)
		.await;
	}

	/// A path inside the library's temporary directory that exists on disk
	pub fn real_path(&self, name: &str) -> String {
		let path: PathBuf = self.dir.path().join(name);
		std::fs::write(&path, b"media").unwrap();
		path.display().to_string()
	}

	/// Runs a search and collects every row with its reported total
	pub async fn run(&self, query: SearchQuery) -> (u64, Vec<FileSearchResult>) {
		let results = search(&self.conn, &self.config, query).await.unwrap();
		let total = results.total_count();

		let rows: Vec<(FileSearchResult, u64)> = results.try_collect().await.unwrap();
		assert!(rows.iter().all(|(_, row_total)| *row_total == total));

		(total, rows.into_iter().map(|(result, _)| result).collect())
	}

	/// Paths of every result, in order
	pub async fn paths(&self, query: SearchQuery) -> Vec<String> {
		let (_, results) = self.run(query).await;
		results.into_iter().map(|result| result.path).collect()
	}
}

pub fn day_of_january(day: u32) -> String {
	format!("2024-01-{day:02}T12:00:00Z")
}
