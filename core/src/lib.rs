//! Media library search
//!
//! Compiles search requests over an indexed media library into SQL and runs
//! them against the library's SQLite database.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod search;

pub use config::SearchConfig;
pub use error::SearchError;
pub use search::{search, FileSearchResult, SearchQuery, SearchResults};
