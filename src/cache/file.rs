use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::{types::CacheError, value::Value};

use super::CacheStore;

/// Answer store backed by a single JSON document.
///
/// The whole key → answer map is re-read on every lookup and rewritten on
/// every insert, so the file stays valid JSON at all times and can be
/// inspected, committed, or pointed at synced storage.
#[derive(Debug, Clone)]
pub struct FileCache {
	path: PathBuf,
}

impl FileCache {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &std::path::Path {
		&self.path
	}

	/// Read the document, treating a missing file as an empty map.
	async fn load(&self) -> Result<BTreeMap<String, Value>, CacheError> {
		match tokio::fs::read(&self.path).await {
			Ok(raw) => Ok(serde_json::from_slice(&raw)?),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
			Err(e) => Err(e.into()),
		}
	}
}

#[async_trait]
impl CacheStore for FileCache {
	async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
		Ok(self.load().await?.remove(key))
	}

	async fn put(&self, key: &str, value: &Value) -> Result<(), CacheError> {
		let mut entries = self.load().await?;
		entries.insert(key.to_string(), value.clone());

		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				tokio::fs::create_dir_all(parent).await?;
			}
		}
		tokio::fs::write(&self.path, serde_json::to_vec_pretty(&entries)?).await?;

		debug!(path = %self.path.display(), "cache entry written");
		Ok(())
	}
}
