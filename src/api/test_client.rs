//! Implements the `ChatModel` trait using in-memory replies for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without calling a model endpoint.

use crate::api::{ChatModel, ChatRequest, ChatResponse};
use crate::error::Res;
use anyhow::anyhow;
use std::collections::VecDeque;

/// A scripted reply for `TestModel`.
#[derive(Debug, Clone, PartialEq)]
pub enum TestReply {
    /// Answer with this response.
    Response(ChatResponse),
    /// Answer with nothing at all.
    Nothing,
    /// Fail as if the network request failed with this message.
    Fail(String),
}

/// An implementation of `ChatModel` that answers from a queue of scripted replies. When the queue
/// is empty, every request is answered with the seed receipt from this module. Requests are
/// recorded so tests can inspect what would have been sent.
#[derive(Debug, Clone, Default)]
pub struct TestModel {
    replies: VecDeque<TestReply>,
    requests: Vec<ChatRequest>,
}

impl TestModel {
    pub fn new(replies: impl IntoIterator<Item = TestReply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    /// The requests received so far.
    pub fn requests(&self) -> &[ChatRequest] {
        &self.requests
    }
}

#[async_trait::async_trait]
impl ChatModel for TestModel {
    async fn complete(&mut self, request: &ChatRequest) -> Res<Option<ChatResponse>> {
        self.requests.push(request.clone());
        match self.replies.pop_front() {
            Some(TestReply::Response(response)) => Ok(Some(response)),
            Some(TestReply::Nothing) => Ok(None),
            Some(TestReply::Fail(message)) => Err(anyhow!(message)),
            None => Ok(Some(seed_response())),
        }
    }
}

/// The response given when no scripted reply is queued.
pub(crate) fn seed_response() -> ChatResponse {
    ChatResponse::tool_call(crate::extract::ITEMIZE_RECEIPT, SEED_RECEIPT)
}

/// Seed receipt arguments.
pub(crate) const SEED_RECEIPT: &str = r##"{
  "vendor": "Corner Deli",
  "date": "2024-03-01",
  "items": [
    {"name": "Sandwich", "price": 8.50, "quantity": 1, "category": "meal"},
    {"name": "Chips", "price": 2.00, "quantity": 2, "category": "groceries"}
  ],
  "payment_method": "credit"
}"##;
