//! Answer caching.
//!
//! A storage handler trait in the spirit of a pluggable backend: the library
//! ships an in-process [`MemoryCache`] and a JSON-file [`FileCache`], and an
//! application can inject its own [`CacheStore`] through
//! [`Ai::cache_store`](crate::Ai::cache_store).
//!
//! Which built-in store backs a given [`Ai`](crate::Ai) value is decided by
//! its [`CacheScope`].

use std::path::PathBuf;

use async_trait::async_trait;

use crate::{types::CacheError, value::Value};

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

pub(crate) use memory::session_cache;

/// File name of the project-scope cache, created in the working directory.
pub const PROJECT_CACHE_FILE: &str = ".llm-value-cache.json";

/// How long, and how widely, resolved answers are remembered.
///
/// Anything file-backed can be pointed at shared storage to share the cache
/// between runs or machines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheScope {
	/// No caching at all, even when caching is enabled.
	None,
	/// Caches per [`Ai`](crate::Ai) value, which usually means per prompt.
	Instance,
	/// Caches for the lifetime of the process.
	#[default]
	Session,
	/// Caches in [`PROJECT_CACHE_FILE`] next to where the program runs.
	Project,
	/// Caches in the platform's per-user cache directory.
	User,
	/// Caches in an explicit file.
	Path(PathBuf),
}

/// A storage handler for resolved answers, keyed by the full request
/// (rendered prompt plus model parameters).
#[async_trait]
pub trait CacheStore: Send + Sync {
	/// Look up a previously stored answer.
	async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;
	/// Store an answer. Overwrites any previous entry under `key`.
	async fn put(&self, key: &str, value: &Value) -> Result<(), CacheError>;
}

/// The store an [`Ai`](crate::Ai) value resolved its scope to: borrowed for
/// the in-process scopes, owned for the file-backed ones.
pub(crate) enum StoreHandle<'a> {
	Shared(&'a dyn CacheStore),
	Owned(Box<dyn CacheStore>),
}

impl StoreHandle<'_> {
	pub(crate) async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
		match self {
			Self::Shared(store) => store.get(key).await,
			Self::Owned(store) => store.get(key).await,
		}
	}

	pub(crate) async fn put(&self, key: &str, value: &Value) -> Result<(), CacheError> {
		match self {
			Self::Shared(store) => store.put(key, value).await,
			Self::Owned(store) => store.put(key, value).await,
		}
	}
}

/// Path of the user-scope cache file.
pub(crate) fn user_cache_path() -> Result<PathBuf, CacheError> {
	Ok(dirs::cache_dir().ok_or(CacheError::NoUserDir)?.join("llm-value").join("cache.json"))
}
