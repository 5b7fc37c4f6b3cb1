//! Chat session: the upload → analyze → transcript flow. Upload failures are
//! surfaced through `last_error`; analysis failures either set `last_error`
//! or degrade to a fallback assistant message, mirroring a forgiving chat UI.

use chrono::Local;
use tracing::{error, warn};

use crate::upload::{UploadClient, UploadInput};
use crate::vision::VisionClient;

pub const IMAGE_ANALYSIS_PROMPT: &str =
    "Analyze this histopathology image for cellular structures and potential abnormalities";
pub const DATA_ANALYSIS_PROMPT: &str =
    "Analyze this gene expression data and provide insights about patterns and potential \
     biological significance";

const IMAGE_UPLOAD_NOTICE: &str = "I've uploaded a new image for analysis";
const DATA_UPLOAD_NOTICE: &str = "I've uploaded gene expression data for analysis";
const ANALYSIS_FALLBACK: &str = "Sorry, I couldn't analyze that aspect of the data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub timestamp: String,
    pub sender: Sender,
    pub text: String,
}

impl Message {
    fn now(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            sender,
            text: text.into(),
        }
    }
}

pub struct ChatSession {
    uploader: UploadClient,
    vision: VisionClient,
    pub messages: Vec<Message>,
    pub images: Vec<String>,
    pub data_files: Vec<String>,
    pub last_error: Option<String>,
}

impl ChatSession {
    pub fn new(uploader: UploadClient, vision: VisionClient) -> Self {
        Self {
            uploader,
            vision,
            messages: Vec::new(),
            images: Vec::new(),
            data_files: Vec::new(),
            last_error: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(UploadClient::from_env(), VisionClient::from_env())
    }

    pub fn is_uploading(&self) -> bool {
        self.uploader.is_uploading()
    }

    /// Upload an image, then ask the vision endpoint to analyze it. On
    /// success the transcript gains a user notice and the assistant's
    /// analysis; failures land in `last_error`.
    pub async fn upload_image(&mut self, input: UploadInput) {
        self.last_error = None;
        let uploaded = match self.uploader.upload(input).await {
            Ok(uploaded) => uploaded,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return;
            }
        };
        self.images.push(uploaded.url.clone());

        match self
            .vision
            .analyze(IMAGE_ANALYSIS_PROMPT, Some(&uploaded.url))
            .await
        {
            Ok(analysis) => {
                self.messages
                    .push(Message::now(Sender::User, IMAGE_UPLOAD_NOTICE));
                self.messages.push(Message::now(Sender::Assistant, analysis));
            }
            Err(err) => {
                error!(error = %err, "image analysis failed");
                self.last_error = Some("Failed to analyze image".to_string());
            }
        }
    }

    /// Same flow as `upload_image` for tabular gene expression data.
    pub async fn upload_data(&mut self, input: UploadInput) {
        self.last_error = None;
        let uploaded = match self.uploader.upload(input).await {
            Ok(uploaded) => uploaded,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return;
            }
        };
        self.data_files.push(uploaded.url.clone());

        match self
            .vision
            .analyze(DATA_ANALYSIS_PROMPT, Some(&uploaded.url))
            .await
        {
            Ok(analysis) => {
                self.messages
                    .push(Message::now(Sender::User, DATA_UPLOAD_NOTICE));
                self.messages.push(Message::now(Sender::Assistant, analysis));
            }
            Err(err) => {
                error!(error = %err, "data analysis failed");
                self.last_error = Some("Failed to analyze data".to_string());
            }
        }
    }

    /// Send a chat message, attaching the most recently uploaded image and
    /// falling back to the latest data file. Analysis failures are swallowed
    /// into a fallback assistant message.
    pub async fn send_message(&mut self, text: &str) {
        self.messages.push(Message::now(Sender::User, text));

        let attachment = self
            .images
            .last()
            .or_else(|| self.data_files.last())
            .cloned();
        let reply = self.vision.analyze(text, attachment.as_deref()).await;

        match reply {
            Ok(analysis) => self.messages.push(Message::now(Sender::Assistant, analysis)),
            Err(err) => {
                error!(error = %err, "chat analysis failed");
                self.messages
                    .push(Message::now(Sender::Assistant, ANALYSIS_FALLBACK));
            }
        }
    }

    /// Fire a model search request; the result is discarded either way.
    pub async fn search(&self, query: &str) {
        if let Err(err) = self.vision.search_models(query).await {
            warn!(error = %err, "model search failed");
        }
    }
}
