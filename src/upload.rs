//! Upload client: sends one payload to the backend upload endpoint and
//! returns the stored file's absolute URL.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::config;

/// One payload per call; the variant alone picks the request encoding.
#[derive(Debug, Clone)]
pub enum UploadInput {
    /// File contents, sent as a multipart form with a single `file` field.
    File { filename: String, bytes: Vec<u8> },
    /// Remote URL for the backend to fetch, sent as JSON `{"url": ...}`.
    Url(String),
    /// Base64-encoded payload, sent as JSON `{"base64": ...}`.
    Base64(String),
    /// Raw bytes, sent as an octet-stream body.
    Buffer(Vec<u8>),
}

impl UploadInput {
    /// Read a local file into the `File` variant, keeping its filename.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(UploadInput::File { filename, bytes })
    }
}

/// Successful upload: where the backend stored the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Uploaded {
    /// Always absolute; relative backend answers are prefixed with the base URL.
    pub url: String,
    pub mime_type: Option<String>,
}

/// Every failure mode of one upload call, rendered with a uniform
/// `Upload failed:` prefix so callers can surface the message directly.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload failed: File too large.")]
    FileTooLarge,
    #[error("Upload failed: {0}")]
    Server(String),
    #[error("Upload failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}

/// Client for the backend `/api/upload` endpoint.
///
/// Cloning is cheap and clones share the loading flag, so a UI task can
/// observe `is_uploading` while another task drives the request.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    base_url: String,
    uploading: Arc<AtomicBool>,
}

impl UploadClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config::normalize_base_url(&base_url.into()),
            uploading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::backend_url_from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True while an upload request is in flight. Overlapping uploads through
    /// clones of one client are not coordinated; the flag is last-write-wins.
    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    /// Send one payload to the backend. A single POST: no retries, no
    /// timeout, no cancellation.
    pub async fn upload(&self, input: UploadInput) -> Result<Uploaded, UploadError> {
        self.uploading.store(true, Ordering::SeqCst);
        let _clear = scopeguard::guard(Arc::clone(&self.uploading), |flag| {
            flag.store(false, Ordering::SeqCst);
        });

        let endpoint = format!("{}/api/upload", self.base_url);
        debug!(%endpoint, "uploading payload");

        let request = match input {
            UploadInput::File { filename, bytes } => {
                let mime = mime_guess::from_path(&filename).first_or_octet_stream();
                let part = Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str(mime.as_ref())?;
                self.http
                    .post(&endpoint)
                    .multipart(Form::new().part("file", part))
            }
            UploadInput::Url(url) => self.http.post(&endpoint).json(&json!({ "url": url })),
            UploadInput::Base64(data) => self.http.post(&endpoint).json(&json!({ "base64": data })),
            UploadInput::Buffer(bytes) => self
                .http
                .post(&endpoint)
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::PAYLOAD_TOO_LARGE {
                return Err(UploadError::FileTooLarge);
            }
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %detail, "upload rejected by backend");
            return Err(UploadError::Server(detail));
        }

        let body: UploadResponse = response.json().await?;
        // Backends may answer with a path like /files/x.png; make it absolute.
        let url = if body.url.starts_with("http") {
            body.url
        } else {
            format!("{}{}", self.base_url, body.url)
        };
        Ok(Uploaded {
            url,
            mime_type: body.mime_type,
        })
    }
}
