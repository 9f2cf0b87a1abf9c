//! The boundary to the language model.
//!
//! The `ChatModel` trait is implemented by `OpenAiModel`, which makes real HTTP requests, and
//! `TestModel`, which answers from memory. `Mode` decides which one `chat_model` constructs.

mod chat;
mod openai_client;
mod test_client;

pub use chat::{
    ChatRequest, ChatResponse, Choice, ContentPart, FunctionCall, FunctionDefinition, ImageUrl,
    Message, MessageContent, ResponseMessage, Role, Tool, ToolCall, ToolChoice, ToolKind,
};
pub use test_client::{TestModel, TestReply};

use crate::error::{ErrorType, IntoResult, Res};
use crate::{Config, Result};
use openai_client::OpenAiModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// When this environment variable is set and non-empty, `Mode::from_env` returns `Mode::Test`.
pub const TEST_MODE_ENV: &str = "RECEIPTS_IN_TEST_MODE";

/// Sends chat completion requests. One call to `complete` is one outbound request.
#[async_trait::async_trait]
pub trait ChatModel {
    /// Returns `Ok(None)` when the endpoint answered with nothing at all.
    async fn complete(&mut self, request: &ChatRequest) -> Res<Option<ChatResponse>>;
}

/// Which `ChatModel` implementation to use.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Talk to the configured endpoint over HTTP.
    #[default]
    OpenAi,
    /// Answer every request from memory with a canned receipt.
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::OpenAi,
        }
    }
}

/// How failed requests to the model endpoint are retried.
///
/// Only transport failures are retried. The default makes exactly one attempt.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// The total number of attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// How long to wait between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Creates the `ChatModel` for `mode`. In `Mode::OpenAi` the API key is read from the
/// environment variable named by the config.
pub fn chat_model(config: &Config, mode: Mode) -> Result<Box<dyn ChatModel + Send>> {
    debug!("Creating the chat model in {mode} mode");
    match mode {
        Mode::Test => Ok(Box::new(TestModel::default())),
        Mode::OpenAi => {
            let api_key = config.api_key().pub_result(ErrorType::Config)?;
            let model = OpenAiModel::new(config.endpoint().clone(), api_key, config.timeout())
                .pub_result(ErrorType::Config)?;
            Ok(Box::new(model))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default_is_single_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_retry_policy_zero_attempts_is_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff_ms: 0,
        };
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.backoff(), Duration::ZERO);
    }

    #[test]
    fn test_mode_strings() {
        assert_eq!(Mode::OpenAi.to_string(), "open_ai");
        assert_eq!("test".parse::<Mode>().unwrap(), Mode::Test);
    }
}
