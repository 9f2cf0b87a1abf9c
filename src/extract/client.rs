//! Sends an encoded receipt image to the model with the `itemize_receipt` tool.

use crate::api::{
    ChatModel, ChatRequest, ChatResponse, ContentPart, ImageUrl, Message, RetryPolicy,
    ToolChoice,
};
use crate::error::{Error, ErrorType};
use crate::extract::schema::itemize_receipt_tool;
use crate::image::EncodedImage;
use crate::Result;
use anyhow::anyhow;
use tracing::{debug, warn};

/// Fixes the role of the model and tells it what to do with an image that is not a receipt.
pub const SYSTEM_PROMPT: &str = "You are a processor of receipts. If the provided image is not a \
receipt, DON'T DESCRIBE IT! Ask for a receipt.";

/// Sampling temperature for every request. Zero keeps extractions reproducible.
pub const TEMPERATURE: f32 = 0.0;

/// Owns the `ChatModel` handle and issues one extraction request per receipt.
pub struct ExtractionClient {
    model: Box<dyn ChatModel + Send>,
    model_name: String,
    retry: RetryPolicy,
}

impl ExtractionClient {
    pub fn new(
        model: Box<dyn ChatModel + Send>,
        model_name: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            retry,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Builds the request for `image`: the system prompt, a user message carrying only the image,
    /// the `itemize_receipt` tool with automatic tool choice, and temperature zero.
    pub fn request(&self, image: &EncodedImage) -> ChatRequest {
        ChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(vec![ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                }]),
            ],
            tools: vec![itemize_receipt_tool()],
            tool_choice: ToolChoice::Auto,
            temperature: TEMPERATURE,
        }
    }

    /// Sends the extraction request for `image` and returns the raw response.
    ///
    /// With the default `RetryPolicy` this makes exactly one request.
    ///
    /// # Errors
    /// - `ErrorType::NoResponse` if the endpoint returned nothing or a response without choices.
    /// - `ErrorType::Transport` if the request failed; the underlying error is the root cause.
    pub async fn extract(&mut self, image: &EncodedImage) -> Result<ChatResponse> {
        let request = self.request(image);
        let attempts = self.retry.attempts();
        let mut attempt = 1;
        let reply = loop {
            match self.model.complete(&request).await {
                Ok(reply) => break reply,
                Err(e) if attempt < attempts => {
                    warn!(
                        "Request to {} failed (attempt {attempt} of {attempts}), retrying: {e:#}",
                        self.model_name
                    );
                    tokio::time::sleep(self.retry.backoff()).await;
                    attempt += 1;
                }
                Err(e) => return Err(Error::new(ErrorType::Transport, e)),
            }
        };

        match reply {
            Some(response) if !response.choices.is_empty() => {
                debug!("Response received from {}: {response:?}", self.model_name);
                Ok(response)
            }
            _ => Err(Error::new(
                ErrorType::NoResponse,
                anyhow!("No response received from {}", self.model_name),
            )),
        }
    }
}
