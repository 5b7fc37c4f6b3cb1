//! Client for the vision/chat completion integrations. Requests follow the
//! chat-message-list shape with optional image attachments; responses expose
//! `choices[0].message.content` as the analysis text.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config;

const VISION_PATH: &str = "/integrations/gpt-vision/";
const CHAT_PATH: &str = "/integrations/chat-gpt/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message carrying a text part plus an image attachment.
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion API returned status {status}: {detail}")]
    Api { status: StatusCode, detail: String },
    #[error("completion response carried no choices")]
    EmptyChoices,
}

#[derive(Debug, Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    base_url: String,
}

impl VisionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config::normalize_base_url(&base_url.into()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::backend_url_from_env())
    }

    /// Ask the vision endpoint about `prompt`, optionally attaching an image.
    pub async fn analyze(
        &self,
        prompt: &str,
        image_url: Option<&str>,
    ) -> Result<String, VisionError> {
        let message = match image_url {
            Some(url) => ChatMessage::user_with_image(prompt, url),
            None => ChatMessage::user(prompt),
        };
        self.complete(
            VISION_PATH,
            &CompletionRequest {
                messages: vec![message],
            },
        )
        .await
    }

    /// Send a model search query to the chat endpoint. The response is parsed
    /// for shape and then discarded; nothing downstream consumes it yet.
    pub async fn search_models(&self, query: &str) -> Result<(), VisionError> {
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(
                    "You are a helpful AI assistant that helps users find the right \
                     cancer research models based on their search queries.",
                ),
                ChatMessage::user(format!("Find relevant cancer research models for: {query}")),
            ],
        };
        self.complete(CHAT_PATH, &request).await.map(|_| ())
    }

    async fn complete(
        &self,
        path: &str,
        request: &CompletionRequest,
    ) -> Result<String, VisionError> {
        let endpoint = format!("{}{}", self.base_url, path);
        debug!(%endpoint, "sending completion request");

        let response = self.http.post(&endpoint).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %detail, "completion API request failed");
            return Err(VisionError::Api { status, detail });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(VisionError::EmptyChoices)
    }
}
