//! Tables the search compiler reads.
//!
//! The scanner and the extraction pipeline own these tables and write to them;
//! `create_tables` exists so those collaborators (and the test suite) can
//! bootstrap an empty library with the shape the compiler expects.

use sea_orm::{ConnectionTrait, DbBackend, DbErr, Statement};
use tracing::debug;

const SCHEMA: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS items (
		id INTEGER PRIMARY KEY,
		sha256 TEXT NOT NULL UNIQUE,
		md5 TEXT,
		mime_type TEXT,
		width INTEGER,
		height INTEGER,
		duration REAL,
		size INTEGER,
		time_added TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS files (
		id INTEGER PRIMARY KEY,
		item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
		path TEXT NOT NULL UNIQUE,
		filename TEXT NOT NULL,
		last_modified TEXT NOT NULL,
		available INTEGER NOT NULL DEFAULT 1
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_files_item_id ON files(item_id)",
	"CREATE INDEX IF NOT EXISTS idx_files_last_modified ON files(last_modified)",
	r#"
	CREATE VIRTUAL TABLE IF NOT EXISTS files_path_fts USING fts5(
		path, filename, content='files', content_rowid='id'
	)
	"#,
	r#"
	CREATE TRIGGER IF NOT EXISTS files_path_fts_insert AFTER INSERT ON files BEGIN
		INSERT INTO files_path_fts(rowid, path, filename) VALUES (new.id, new.path, new.filename);
	END
	"#,
	r#"
	CREATE TRIGGER IF NOT EXISTS files_path_fts_delete AFTER DELETE ON files BEGIN
		INSERT INTO files_path_fts(files_path_fts, rowid, path, filename)
		VALUES ('delete', old.id, old.path, old.filename);
	END
	"#,
	r#"
	CREATE TRIGGER IF NOT EXISTS files_path_fts_update AFTER UPDATE OF path, filename ON files BEGIN
		INSERT INTO files_path_fts(files_path_fts, rowid, path, filename)
		VALUES ('delete', old.id, old.path, old.filename);
		INSERT INTO files_path_fts(rowid, path, filename) VALUES (new.id, new.path, new.filename);
	END
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS setters (
		id INTEGER PRIMARY KEY,
		name TEXT NOT NULL UNIQUE
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS tags_setters (
		id INTEGER PRIMARY KEY,
		namespace TEXT NOT NULL,
		name TEXT NOT NULL,
		setter_id INTEGER NOT NULL REFERENCES setters(id) ON DELETE CASCADE,
		UNIQUE(namespace, name, setter_id)
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_tags_setters_name ON tags_setters(name)",
	r#"
	CREATE TABLE IF NOT EXISTS tags_items (
		id INTEGER PRIMARY KEY,
		item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
		tag_id INTEGER NOT NULL REFERENCES tags_setters(id) ON DELETE CASCADE,
		confidence REAL NOT NULL DEFAULT 1.0,
		UNIQUE(item_id, tag_id)
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_tags_items_tag_id ON tags_items(tag_id)",
	r#"
	CREATE TABLE IF NOT EXISTS extracted_text (
		id INTEGER PRIMARY KEY,
		item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
		setter_id INTEGER NOT NULL REFERENCES setters(id) ON DELETE CASCADE,
		language TEXT,
		language_confidence REAL,
		confidence REAL,
		text TEXT NOT NULL,
		text_length INTEGER
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_extracted_text_item_id ON extracted_text(item_id)",
	r#"
	CREATE VIRTUAL TABLE IF NOT EXISTS extracted_text_fts USING fts5(
		text, content='extracted_text', content_rowid='id'
	)
	"#,
	r#"
	CREATE TRIGGER IF NOT EXISTS extracted_text_fts_insert AFTER INSERT ON extracted_text BEGIN
		INSERT INTO extracted_text_fts(rowid, text) VALUES (new.id, new.text);
	END
	"#,
	r#"
	CREATE TRIGGER IF NOT EXISTS extracted_text_fts_delete AFTER DELETE ON extracted_text BEGIN
		INSERT INTO extracted_text_fts(extracted_text_fts, rowid, text) VALUES ('delete', old.id, old.text);
	END
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS embeddings (
		id INTEGER PRIMARY KEY,
		item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
		setter_id INTEGER NOT NULL REFERENCES setters(id) ON DELETE CASCADE,
		text_id INTEGER REFERENCES extracted_text(id) ON DELETE CASCADE,
		embedding BLOB NOT NULL
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_embeddings_item_id ON embeddings(item_id)",
	r#"
	CREATE TABLE IF NOT EXISTS bookmarks (
		id INTEGER PRIMARY KEY,
		namespace TEXT NOT NULL DEFAULT 'default',
		user TEXT NOT NULL DEFAULT 'user',
		item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
		time_added TEXT NOT NULL,
		metadata TEXT,
		UNIQUE(namespace, user, item_id)
	)
	"#,
];

/// Create every table, index and full-text trigger if missing
pub async fn create_tables<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
	for statement in SCHEMA {
		conn.execute(Statement::from_string(DbBackend::Sqlite, *statement))
			.await?;
	}

	debug!(statements = SCHEMA.len(), "Library schema ready");

	Ok(())
}
