//! Chatbot mode: an append-only conversation over an [`Ai`] configuration.
//!
//! Each turn renders the whole transcript as the prompt, labeled with the
//! configured speaker names, so the model sees the full history. There is no
//! protocol state beyond the list of exchanges.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{cache::CacheScope, llm::Model, types::Result, Ai};

/// One question/answer turn of a [`Chat`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
	pub question: String,
	pub answer: String,
	/// RFC 3339 timestamp of when the answer arrived.
	pub timestamp: String,
}

/// An append-only conversation.
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> llm_value::Result<()> {
/// use llm_value::Chat;
///
/// let mut chat = Chat::new();
/// println!("{}", chat.say("You are a sarcastic chatbot. Hello!").await?);
/// println!("{}", chat.say("What did I just say?").await?);
/// # Ok(())
/// # }
/// ```
pub struct Chat {
	settings: Ai,
	question_label: String,
	answer_label: String,
	exchanges: Vec<Exchange>,
}

impl Default for Chat {
	fn default() -> Self {
		Self::new()
	}
}

impl Chat {
	pub fn new() -> Self {
		Self::with_labels("Question", "Answer")
	}

	/// Use custom speaker labels for the rendered transcript.
	pub fn with_labels(question: impl Into<String>, answer: impl Into<String>) -> Self {
		Self {
			settings: Ai::new(""),
			question_label: question.into(),
			answer_label: answer.into(),
			exchanges: Vec::new(),
		}
	}

	pub fn model(mut self, model: Model) -> Self {
		self.settings = self.settings.model(model);
		self
	}

	pub fn temperature(mut self, temperature: f32) -> Self {
		self.settings = self.settings.temperature(temperature);
		self
	}

	pub fn llm(mut self, llm: std::sync::Arc<dyn crate::llm::Llm>) -> Self {
		self.settings = self.settings.llm(llm);
		self
	}

	pub fn caching(mut self, caching: bool) -> Self {
		self.settings = self.settings.caching(caching);
		self
	}

	pub fn cache_scope(mut self, scope: CacheScope) -> Self {
		self.settings = self.settings.cache_scope(scope);
		self
	}

	/// The conversation so far.
	pub fn exchanges(&self) -> &[Exchange] {
		&self.exchanges
	}

	/// Send the next message and append the exchange to the history.
	pub async fn say(&mut self, msg: impl Into<String>) -> Result<String> {
		let question = msg.into();
		let answer =
			self.settings.clone().prompt(self.transcript(&question)).text().await?;

		self.exchanges.push(Exchange {
			question,
			answer: answer.clone(),
			timestamp: Utc::now().to_rfc3339(),
		});

		Ok(answer)
	}

	/// The full labeled transcript, ending with an empty answer label for
	/// the model to continue from.
	fn transcript(&self, next: &str) -> String {
		let mut out = String::new();
		for exchange in &self.exchanges {
			out.push_str(&format!(
				"{}: {}\n{}: {}\n",
				self.question_label, exchange.question, self.answer_label, exchange.answer
			));
		}
		out.push_str(&format!("{}: {}\n{}: ", self.question_label, next, self.answer_label));
		out
	}
}
