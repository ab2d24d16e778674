//! Search configuration

use crate::error::SearchError;

use std::{
	fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const CONFIG_FILE_NAME: &str = "search.json";

/// Settings the query compiler and the execution layer are constructed with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
	/// Page size used when a request does not ask for one
	pub default_page_size: u64,

	/// Stand-in for "no limit" when a request asks for `page_size = 0`
	pub unbounded_page_size: u64,

	/// Confidence floor for tag matching when the tag filter sets none
	pub min_tag_confidence: Option<f64>,

	/// Whether results are checked against the filesystem unless the request says otherwise
	pub check_path_by_default: bool,

	pub logging: LoggingConfig,
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self {
			default_page_size: 10,
			unbounded_page_size: i64::MAX as u64,
			min_tag_confidence: None,
			check_path_by_default: false,
			logging: LoggingConfig::default(),
		}
	}
}

/// Configuration for tracing output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// Default filter directive, overridden by `RUST_LOG`
	pub level: String,

	/// Whether to also write daily rolling log files
	pub file_logging: bool,

	/// Directory for log files (relative to the data directory)
	pub directory: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			file_logging: false,
			directory: "logs".to_string(),
		}
	}
}

impl SearchConfig {
	/// Load configuration from a data directory, writing defaults if none exist yet
	pub fn load_from(data_dir: impl AsRef<Path>) -> Result<Self, SearchError> {
		let config_path = data_dir.as_ref().join(CONFIG_FILE_NAME);

		if config_path.exists() {
			info!("Loading search config from {:?}", config_path);
			let json =
				fs::read_to_string(&config_path).map_err(|e| SearchError::io(&config_path, e))?;
			let config: SearchConfig = serde_json::from_str(&json)?;
			Ok(config.sanitized())
		} else {
			warn!("No search config found, creating default at {:?}", config_path);
			let config = Self::default();
			config.save(data_dir)?;
			Ok(config)
		}
	}

	/// Write configuration into a data directory
	pub fn save(&self, data_dir: impl AsRef<Path>) -> Result<(), SearchError> {
		let data_dir = data_dir.as_ref();
		fs::create_dir_all(data_dir).map_err(|e| SearchError::io(data_dir, e))?;

		let config_path = data_dir.join(CONFIG_FILE_NAME);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json).map_err(|e| SearchError::io(&config_path, e))
	}

	/// Effective page size for a request
	pub fn page_size(&self, requested: Option<u64>) -> u64 {
		match requested {
			None => self.default_page_size,
			Some(0) => self.unbounded_page_size,
			Some(n) => n,
		}
	}

	fn sanitized(mut self) -> Self {
		if self.unbounded_page_size == 0 || self.unbounded_page_size > i64::MAX as u64 {
			warn!(
				unbounded_page_size = self.unbounded_page_size,
				"Unusable unbounded page size in config, using default"
			);
			self.unbounded_page_size = i64::MAX as u64;
		}
		if self.default_page_size == 0 {
			self.default_page_size = self.unbounded_page_size;
		}
		self
	}
}

/// Default data directory for the application
pub fn default_data_dir() -> Option<PathBuf> {
	dirs::data_dir().map(|dir| dir.join("mediadex"))
}
