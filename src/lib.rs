//! Ask an LLM a question and use the answer like a value.
//!
//! An [`Ai`] is constructed with a prompt and holds off on the network until
//! the answer is first observed in a concrete context: a typed accessor, an
//! arithmetic operand, a boolean test, iteration, or string formatting. The
//! resolved answer is a [`Value`] that behaves accordingly, and every
//! resolution is memoized in a cache keyed on the rendered prompt and the
//! request parameters, so the model is called at most once per distinct
//! question per cache scope.
//!
//! For immediate use of this library you must have an account on
//! [OpenAI](https://platform.openai.com/) and set the `OPENAI_API_KEY`
//! environment variable.
//!
//! # Example
//!
//! ```no_run
//! use llm_value::Ai;
//!
//! #[tokio::main]
//! async fn main() -> llm_value::Result<()> {
//! 	// Plain question, plain text answer.
//! 	println!("{}", Ai::new("What is the capital of France?").text().await?);
//!
//! 	// Placeholders are rendered from params.
//! 	let population = Ai::new("What is the population of {country}?")
//! 		.param("country", "India")
//! 		.int()
//! 		.await?;
//!
//! 	// Resolved answers behave like values.
//! 	let dozen = Ai::new("bakers dozen").num().await?;
//! 	let weight = Ai::new("How many lbs does a cake weigh?").num().await?;
//! 	println!("{}", dozen * weight);
//!
//! 	if Ai::new("Is a cake heavier than a banana?").check().await? {
//! 		println!("Yes, a cake is heavier than a banana.");
//! 	}
//!
//! 	// Iterate over list answers.
//! 	for ingredient in Ai::new("ingredients of Hamburgers").list().await? {
//! 		println!("{ingredient}");
//! 	}
//!
//! 	println!("{population}");
//! 	Ok(())
//! }
//! ```
//!
//! Resolution is lazy, so an [`Ai`] can be created long before it is used,
//! and the first concrete use fixes its output kind: after `int()` an
//! untyped [`Ai::resolve`] keeps returning the integer form (served from
//! cache), while calling another typed accessor re-asks under the new kind.
//!
//! Should there be a need to target a different backend, implement [`Llm`]
//! and inject it with [`Ai::llm`]; the same goes for the cache via
//! [`CacheStore`] and [`Ai::cache_store`].

use std::{
	collections::BTreeMap,
	fmt,
	sync::{Arc, Mutex as StdMutex, PoisonError},
};

use lazy_static::lazy_static;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, instrument};

pub mod architecture;
pub mod cache;
pub mod chat;
pub mod llm;
mod template;
mod types;
pub mod value;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

pub use cache::{CacheScope, CacheStore, FileCache, MemoryCache};
pub use chat::{Chat, Exchange};
pub use llm::{CompletionRequest, Llm, Model, OpenAiLlm, RawAnswer};
pub use types::{AiError, CacheError, Result};
pub use value::{OutputKind, Value};

use cache::{session_cache, user_cache_path, StoreHandle, PROJECT_CACHE_FILE};

lazy_static! {
	/// The OpenAI backend shared by every [`Ai`] that does not inject its
	/// own [`Llm`].
	static ref DEFAULT_LLM: Arc<OpenAiLlm> = Arc::new(OpenAiLlm::new());
}

/// Default tag attached to every request, overridable with [`Ai::tags`].
const DEFAULT_TAG: &str = "ai-call";

/// A deferred model answer.
///
/// Holds the prompt template and the request settings; the model call
/// happens on first observation and the result is cached under the rendered
/// prompt plus parameters. See the [crate docs](crate) for a walkthrough.
pub struct Ai {
	prompt: String,
	params: BTreeMap<String, String>,
	param_default: Option<String>,
	/// Sticky output kind: set by `output()` or by the first concrete use.
	output: StdMutex<Option<OutputKind>>,
	model: Model,
	temperature: f32,
	tags: Vec<String>,
	metadata: BTreeMap<String, String>,
	caching: bool,
	scope: CacheScope,
	prefer_int: bool,
	llm: Arc<dyn Llm>,
	cache_store: Option<Arc<dyn CacheStore>>,
	instance_cache: MemoryCache,
	/// Serializes resolution so one instance prompts at most once per key
	/// even under concurrent use.
	gate: AsyncMutex<()>,
}

impl Ai {
	/// Create a deferred answer for `prompt`. No network activity happens
	/// until the answer is first used.
	pub fn new(prompt: impl Into<String>) -> Self {
		Self {
			prompt: prompt.into(),
			params: BTreeMap::new(),
			param_default: None,
			output: StdMutex::new(None),
			model: Model::default(),
			temperature: 0.75,
			tags: vec![DEFAULT_TAG.to_string()],
			metadata: BTreeMap::new(),
			caching: true,
			scope: CacheScope::default(),
			prefer_int: false,
			llm: DEFAULT_LLM.clone(),
			cache_store: None,
			instance_cache: MemoryCache::new(),
			gate: AsyncMutex::new(()),
		}
	}

	/// Replace the prompt template. Resets nothing else, so a configured
	/// [`Ai`] can be cloned and re-asked.
	pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
		self.prompt = prompt.into();
		self
	}

	/// Set one `{name}` placeholder value.
	pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());
		self
	}

	/// Set many placeholder values at once. A resolved
	/// [`Value::Map`](crate::Value::Map) feeds in directly.
	pub fn params<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.params
			.extend(params.into_iter().map(|(key, value)| (key.into(), value.into())));
		self
	}

	/// Fallback for placeholders missing from params; without one a missing
	/// placeholder is an error.
	pub fn param_default(mut self, default: impl Into<String>) -> Self {
		self.param_default = Some(default.into());
		self
	}

	/// Fix the output kind up front instead of leaving it to first use.
	pub fn output(mut self, kind: OutputKind) -> Self {
		self.output = StdMutex::new(Some(kind));
		self
	}

	pub fn model(mut self, model: Model) -> Self {
		self.model = model;
		self
	}

	pub fn temperature(mut self, temperature: f32) -> Self {
		self.temperature = temperature;
		self
	}

	/// Append one tag, for tracing. The default `"ai-call"` tag stays.
	pub fn tag(mut self, tag: impl Into<String>) -> Self {
		self.tags.push(tag.into());
		self
	}

	/// Replace the default tags with your own, for tracing.
	pub fn tags<I: IntoIterator<Item = S>, S: Into<String>>(mut self, tags: I) -> Self {
		self.tags = tags.into_iter().map(Into::into).collect();
		self
	}

	/// Attach one metadata entry, for tracing.
	pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.metadata.insert(key.into(), value.into());
		self
	}

	/// Turn caching off (or back on). Defaults to on.
	pub fn caching(mut self, caching: bool) -> Self {
		self.caching = caching;
		self
	}

	/// Where cached answers live. Defaults to [`CacheScope::Session`].
	pub fn cache_scope(mut self, scope: CacheScope) -> Self {
		self.scope = scope;
		self
	}

	/// Inject a custom answer store, overriding the scope's built-in one.
	pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
		self.cache_store = Some(store);
		self
	}

	/// Make untyped numeric use resolve to whole numbers instead of floats.
	pub fn prefer_int(mut self, prefer_int: bool) -> Self {
		self.prefer_int = prefer_int;
		self
	}

	/// Inject the model backend. Defaults to a process-wide [`OpenAiLlm`].
	pub fn llm(mut self, llm: Arc<dyn Llm>) -> Self {
		self.llm = llm;
		self
	}

	/// Resolve the answer under the instance's current output kind (text
	/// until a concrete use decides otherwise).
	pub async fn resolve(&self) -> Result<Value> {
		let kind = self.sticky_kind().unwrap_or_default();
		self.resolve_as(kind).await
	}

	/// The answer as plain text.
	pub async fn text(&self) -> Result<String> {
		Ok(self.resolve_as(OutputKind::Text).await?.to_string())
	}

	/// The answer as a whole number.
	pub async fn int(&self) -> Result<i64> {
		let value = self.resolve_as(OutputKind::Int).await?;
		value
			.as_i64()
			.ok_or_else(|| AiError::Coerce { wanted: "int", text: value.to_string() })
	}

	/// The answer as a float.
	pub async fn float(&self) -> Result<f64> {
		let value = self.resolve_as(OutputKind::Float).await?;
		value
			.as_f64()
			.ok_or_else(|| AiError::Coerce { wanted: "float", text: value.to_string() })
	}

	/// The answer as a yes/no check.
	pub async fn check(&self) -> Result<bool> {
		let value = self.resolve_as(OutputKind::Bool).await?;
		value
			.as_bool()
			.ok_or_else(|| AiError::Coerce { wanted: "bool", text: value.to_string() })
	}

	/// The answer as a numeric [`Value`], float unless
	/// [`prefer_int`](Ai::prefer_int) says otherwise. Useful as an
	/// arithmetic or comparison operand.
	pub async fn num(&self) -> Result<Value> {
		let kind = if self.prefer_int { OutputKind::Int } else { OutputKind::Float };
		self.resolve_as(kind).await
	}

	/// The answer as a list of items.
	pub async fn list(&self) -> Result<Vec<String>> {
		match self.resolve_as(OutputKind::List).await? {
			Value::List(items) => Ok(items),
			other => Err(AiError::Coerce { wanted: "list", text: other.to_string() }),
		}
	}

	/// The answer as a map of string properties.
	pub async fn map(&self) -> Result<BTreeMap<String, String>> {
		match self.resolve_as(OutputKind::Map).await? {
			Value::Map(map) => Ok(map),
			other => Err(AiError::Coerce { wanted: "map", text: other.to_string() }),
		}
	}

	#[instrument(skip(self))]
	async fn resolve_as(&self, kind: OutputKind) -> Result<Value> {
		if self.prompt.trim().is_empty() {
			return Err(AiError::MissingPrompt);
		}

		// First concrete use fixes the kind; a typed accessor re-fixes it.
		*self.output.lock().unwrap_or_else(PoisonError::into_inner) = Some(kind);

		let rendered =
			template::render(&self.prompt, &self.params, self.param_default.as_deref())?;
		let key = cache_key(self.model, self.temperature, kind, &rendered);

		let _gate = self.gate.lock().await;

		let store = self.store()?;
		if let Some(store) = &store {
			if let Some(hit) = store.get(&key).await? {
				debug!(model = self.model.name(), output = kind.name(), "answer served from cache");
				return Ok(hit);
			}
		}

		let request = CompletionRequest {
			prompt: rendered,
			model: self.model,
			temperature: self.temperature,
			output: kind,
			tags: self.tags.clone(),
			metadata: self.metadata.clone(),
		};

		let raw = self.llm.complete(&request).await.map_err(|e| {
			error!("failed to prompt the model: {}", e);
			e
		})?;
		let value = Value::from_raw(raw, kind)?;

		if let Some(store) = &store {
			store.put(&key, &value).await?;
		}

		Ok(value)
	}

	fn sticky_kind(&self) -> Option<OutputKind> {
		*self.output.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// The store the configured scope resolves to, or `None` when caching is
	/// off.
	fn store(&self) -> Result<Option<StoreHandle<'_>>> {
		if !self.caching {
			return Ok(None);
		}
		if let Some(store) = &self.cache_store {
			return Ok(Some(StoreHandle::Shared(store.as_ref())));
		}

		Ok(match &self.scope {
			CacheScope::None => None,
			CacheScope::Instance => Some(StoreHandle::Shared(&self.instance_cache)),
			CacheScope::Session => Some(StoreHandle::Shared(session_cache())),
			CacheScope::Project =>
				Some(StoreHandle::Owned(Box::new(FileCache::new(PROJECT_CACHE_FILE)))),
			CacheScope::User => Some(StoreHandle::Owned(Box::new(FileCache::new(
				user_cache_path().map_err(AiError::Cache)?,
			)))),
			CacheScope::Path(path) =>
				Some(StoreHandle::Owned(Box::new(FileCache::new(path.clone())))),
		})
	}
}

/// A clone is a fresh deferred answer with the same settings: nothing
/// resolved yet, its own instance cache.
impl Clone for Ai {
	fn clone(&self) -> Self {
		Self {
			prompt: self.prompt.clone(),
			params: self.params.clone(),
			param_default: self.param_default.clone(),
			output: StdMutex::new(self.sticky_kind()),
			model: self.model,
			temperature: self.temperature,
			tags: self.tags.clone(),
			metadata: self.metadata.clone(),
			caching: self.caching,
			scope: self.scope.clone(),
			prefer_int: self.prefer_int,
			llm: Arc::clone(&self.llm),
			cache_store: self.cache_store.clone(),
			instance_cache: MemoryCache::new(),
			gate: AsyncMutex::new(()),
		}
	}
}

impl fmt::Debug for Ai {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Ai")
			.field("prompt", &self.prompt)
			.field("params", &self.params)
			.field("output", &self.sticky_kind())
			.field("model", &self.model.name())
			.field("temperature", &self.temperature)
			.field("caching", &self.caching)
			.field("scope", &self.scope)
			.finish_non_exhaustive()
	}
}

/// Make up the cache key for one request. Everything that changes the answer
/// is part of the key.
fn cache_key(model: Model, temperature: f32, kind: OutputKind, rendered_prompt: &str) -> String {
	format!("{}|{:.2}|{}|{}", model.name(), temperature, kind.name(), rendered_prompt)
}

/// Enable LangSmith tracing for the process by setting the `LANGCHAIN_*`
/// environment variables, preferably at the beginning of the program. An
/// empty project name clears them again.
pub fn set_langsmith_project(project_name: &str) {
	if project_name.is_empty() {
		std::env::set_var("LANGCHAIN_TRACING_V2", "");
		std::env::set_var("LANGCHAIN_ENDPOINT", "");
		std::env::set_var("LANGCHAIN_PROJECT", "");
		return;
	}

	if std::env::var("LANGCHAIN_TRACING_V2").unwrap_or_default().is_empty() {
		std::env::set_var("LANGCHAIN_TRACING_V2", "true");
	}
	if std::env::var("LANGCHAIN_ENDPOINT").unwrap_or_default().is_empty() {
		std::env::set_var("LANGCHAIN_ENDPOINT", "https://api.smith.langchain.com");
	}
	std::env::set_var("LANGCHAIN_PROJECT", project_name);
}
