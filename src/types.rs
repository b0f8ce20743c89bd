use async_openai::error::OpenAIError;

/// Result type used across the library.
pub type Result<T> = std::result::Result<T, AiError>;

/// Errors produced while resolving an [`Ai`](crate::Ai) value.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
	/// The prompt was empty at resolve time.
	#[error("no prompt was given for the model call")]
	MissingPrompt,
	/// A `{placeholder}` in the prompt had no value in the params map and no
	/// default was configured.
	#[error("placeholder {{{0}}} has no value in params and no default was set")]
	MissingParam(String),
	/// The underlying client failed.
	#[error("failed to prompt OpenAI: {0}")]
	Provider(#[from] OpenAIError),
	/// The model produced no choices or no content.
	#[error("model returned no usable content")]
	EmptyResponse,
	/// The model produced a structured response that does not match the
	/// requested schema.
	#[error("malformed structured response: {0}")]
	BadResponse(String),
	/// The model's answer could not be read as the requested output kind.
	#[error("cannot read {text:?} as {wanted}")]
	Coerce {
		wanted: &'static str,
		text: String,
	},
	#[error("cache error: {0}")]
	Cache(#[from] CacheError),
}

/// Errors produced by the cache backends.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("failed to parse cache file: {0}")]
	Parsing(#[from] serde_json::Error),
	#[error("no user cache directory on this platform")]
	NoUserDir,
}
