//! The model backend seam.
//!
//! [`Llm`] is the trait an [`Ai`](crate::Ai) value prompts through. The out
//! of the box implementation is [`OpenAiLlm`], which sends text requests as
//! plain chat completions and every other output kind as a forced function
//! call whose JSON schema pins down the shape of the answer.

use std::collections::BTreeMap;

use async_openai::{
	config::OpenAIConfig,
	types::{
		ChatCompletionNamedToolChoice, ChatCompletionRequestUserMessageArgs,
		ChatCompletionToolArgs, ChatCompletionToolChoiceOption, ChatCompletionToolType,
		CreateChatCompletionRequestArgs, FunctionName, FunctionObjectArgs,
	},
	Client,
};
use async_trait::async_trait;
use clap::{builder::PossibleValue, ValueEnum};
use serde_json::json;
use tracing::{debug, instrument};

use crate::{
	types::{AiError, Result},
	value::OutputKind,
};

/// Name of the function the model is forced to call for structured output.
const RESPONSE_FN: &str = "Response";

/// The chat models that are available to use.
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
pub enum Model {
	#[default]
	Gpt35Turbo,
	Gpt4,
	Gpt4o,
	Gpt4oMini,
}

/// Clap value enum implementation for argument parsing.
impl ValueEnum for Model {
	fn value_variants<'a>() -> &'a [Self] {
		&[Self::Gpt35Turbo, Self::Gpt4, Self::Gpt4o, Self::Gpt4oMini]
	}

	fn to_possible_value(&self) -> Option<PossibleValue> {
		Some(PossibleValue::new(self.name()))
	}
}

impl Model {
	/// Get the model name.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Gpt35Turbo => "gpt-3.5-turbo",
			Self::Gpt4 => "gpt-4",
			Self::Gpt4o => "gpt-4o",
			Self::Gpt4oMini => "gpt-4o-mini",
		}
	}
}

/// Everything a backend needs to answer one prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
	/// The rendered prompt, placeholders already substituted.
	pub prompt: String,
	pub model: Model,
	pub temperature: f32,
	/// Requested output kind; anything but text asks for structured output.
	pub output: OutputKind,
	/// Tracing annotations carried alongside the call.
	pub tags: Vec<String>,
	pub metadata: BTreeMap<String, String>,
}

/// A backend's raw answer, before coercion into a
/// [`Value`](crate::value::Value).
#[derive(Debug, Clone)]
pub enum RawAnswer {
	/// Free text from a plain completion.
	Text(String),
	/// The `response` field of the parsed function-call arguments.
	Structured(serde_json::Value),
}

/// A model backend that can answer a single completion request.
#[async_trait]
pub trait Llm: Send + Sync {
	async fn complete(&self, request: &CompletionRequest) -> Result<RawAnswer>;
}

/// The default [`Llm`] implementation over the OpenAI API.
///
/// Reads `OPENAI_API_KEY` from the environment, as async-openai does.
pub struct OpenAiLlm {
	client: Client<OpenAIConfig>,
}

impl OpenAiLlm {
	pub fn new() -> Self {
		Self { client: Client::new() }
	}

	/// Use a preconfigured client, e.g. with a custom base url or api key.
	pub fn with_client(client: Client<OpenAIConfig>) -> Self {
		Self { client }
	}
}

impl Default for OpenAiLlm {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Llm for OpenAiLlm {
	#[instrument(skip(self, request), fields(model = request.model.name(), output = request.output.name()))]
	async fn complete(&self, request: &CompletionRequest) -> Result<RawAnswer> {
		let message = ChatCompletionRequestUserMessageArgs::default()
			.content(request.prompt.as_str())
			.build()?;

		let mut builder = CreateChatCompletionRequestArgs::default();
		builder
			.model(request.model.name())
			.temperature(request.temperature)
			.messages(vec![message.into()]);

		if request.output != OutputKind::Text {
			let (schema, description) = response_schema(request.output);
			let mut function = FunctionObjectArgs::default();
			function.name(RESPONSE_FN).parameters(json!({
				"type": "object",
				"properties": { "response": schema },
				"required": ["response"],
			}));
			if !description.is_empty() {
				function.description(description);
			}

			builder
				.tools(vec![ChatCompletionToolArgs::default()
					.r#type(ChatCompletionToolType::Function)
					.function(function.build()?)
					.build()?])
				.tool_choice(ChatCompletionToolChoiceOption::Named(ChatCompletionNamedToolChoice {
					r#type: ChatCompletionToolType::Function,
					function: FunctionName { name: RESPONSE_FN.to_string() },
				}));
		}

		debug!(tags = ?request.tags, metadata = ?request.metadata, "sending chat completion");

		let response = self.client.chat().create(builder.build()?).await?;
		let choice = response.choices.into_iter().next().ok_or(AiError::EmptyResponse)?;

		if request.output == OutputKind::Text {
			return choice.message.content.map(RawAnswer::Text).ok_or(AiError::EmptyResponse);
		}

		let call = choice
			.message
			.tool_calls
			.and_then(|calls| calls.into_iter().next())
			.ok_or_else(|| {
				AiError::BadResponse("model did not produce the requested function call".to_string())
			})?;

		let arguments: serde_json::Value =
			serde_json::from_str(&call.function.arguments).map_err(|e| {
				AiError::BadResponse(format!("unparsable function-call arguments: {}", e))
			})?;

		arguments
			.get("response")
			.cloned()
			.map(RawAnswer::Structured)
			.ok_or_else(|| AiError::BadResponse("function arguments miss `response`".to_string()))
	}
}

/// JSON schema of the `response` property, per output kind.
///
/// Mirrors the structured answers the library expects back: plain scalars
/// for numbers and booleans, an array of strings for lists, and an array of
/// `{key, value}` pairs for maps.
fn response_schema(kind: OutputKind) -> (serde_json::Value, &'static str) {
	match kind {
		OutputKind::Text => (json!({ "type": "string" }), ""),
		OutputKind::Int => (json!({ "type": "integer" }), ""),
		OutputKind::Float => (json!({ "type": "number" }), ""),
		OutputKind::Bool => (json!({ "type": "boolean" }), ""),
		OutputKind::List =>
			(json!({ "type": "array", "items": { "type": "string" } }), ""),
		OutputKind::Map => (
			json!({
				"type": "array",
				"items": {
					"type": "object",
					"properties": {
						"key": { "type": "string" },
						"value": { "type": "string" },
					},
					"required": ["key", "value"],
				},
			}),
			"An object that defines its own list of properties.",
		),
	}
}
