use std::{
	collections::VecDeque,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
};

use async_trait::async_trait;

use crate::{
	llm::{CompletionRequest, Llm, RawAnswer},
	types::{AiError, Result},
};

/// Scripted model backend for tests.
///
/// Pops replies in order; the final reply repeats so cache tests can assert
/// on the call count. Every request sent is recorded.
pub struct MockLlm {
	replies: Mutex<VecDeque<RawAnswer>>,
	requests: Mutex<Vec<CompletionRequest>>,
	calls: AtomicUsize,
}

impl MockLlm {
	pub fn scripted(replies: Vec<RawAnswer>) -> Arc<Self> {
		Arc::new(Self {
			replies: Mutex::new(replies.into()),
			requests: Mutex::new(Vec::new()),
			calls: AtomicUsize::new(0),
		})
	}

	pub fn text(reply: &str) -> Arc<Self> {
		Self::scripted(vec![RawAnswer::Text(reply.to_string())])
	}

	pub fn structured(value: serde_json::Value) -> Arc<Self> {
		Self::scripted(vec![RawAnswer::Structured(value)])
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn prompts(&self) -> Vec<String> {
		self.requests.lock().unwrap().iter().map(|r| r.prompt.clone()).collect()
	}

	pub fn requests(&self) -> Vec<CompletionRequest> {
		self.requests.lock().unwrap().clone()
	}
}

#[async_trait]
impl Llm for MockLlm {
	async fn complete(&self, request: &CompletionRequest) -> Result<RawAnswer> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.requests.lock().unwrap().push(request.clone());

		let mut replies = self.replies.lock().unwrap();
		if replies.len() > 1 {
			Ok(replies.pop_front().expect("script is non-empty"))
		} else {
			replies.front().cloned().ok_or(AiError::EmptyResponse)
		}
	}
}
