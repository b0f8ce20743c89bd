use std::collections::HashMap;

use async_trait::async_trait;
use lazy_static::lazy_static;
use tokio::sync::RwLock;

use crate::{types::CacheError, value::Value};

use super::CacheStore;

lazy_static! {
	/// Backs [`CacheScope::Session`](super::CacheScope::Session): one map for
	/// the whole process.
	static ref SESSION_CACHE: MemoryCache = MemoryCache::new();
}

pub(crate) fn session_cache() -> &'static MemoryCache {
	&SESSION_CACHE
}

/// In-process answer store.
#[derive(Debug, Default)]
pub struct MemoryCache {
	entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored answers.
	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}

	/// Drop all stored answers.
	pub async fn clear(&self) {
		self.entries.write().await.clear();
	}
}

#[async_trait]
impl CacheStore for MemoryCache {
	async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
		Ok(self.entries.read().await.get(key).cloned())
	}

	async fn put(&self, key: &str, value: &Value) -> Result<(), CacheError> {
		self.entries.write().await.insert(key.to_string(), value.clone());
		Ok(())
	}
}
