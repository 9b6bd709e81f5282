// HTTP client for the external analysis service

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;

use super::error::BackendError;
use super::types::{AnalyzeRequest, DeckFile, SpeechRequest};
use crate::config::BackendConfig;

/// Thin pass-through client. No retries, no caching: every failure is
/// reported to the caller as-is.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Forward a deck file as multipart `file` to `/upload`
    pub async fn upload(&self, deck: DeckFile) -> Result<Value, BackendError> {
        tracing::debug!(
            file = %deck.file_name,
            bytes = deck.bytes.len(),
            "Forwarding deck upload"
        );

        let mut part = Part::bytes(deck.bytes).file_name(deck.file_name);
        if let Some(content_type) = deck.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.config.endpoint("/upload"))
            .multipart(form)
            .send()
            .await?;

        read_json(ensure_success(response).await?).await
    }

    /// Forward an analyze request to `/analyze`; the JSON answer is returned unchanged
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<Value, BackendError> {
        tracing::debug!(
            slide_index = request.slide_index,
            personas = request.personas.len(),
            slides = request.slides.len(),
            "Forwarding analyze request"
        );

        let response = self
            .client
            .post(self.config.endpoint("/analyze"))
            .json(request)
            .send()
            .await?;

        read_json(ensure_success(response).await?).await
    }

    /// Fetch the service's persona list from `/personas`
    pub async fn personas(&self) -> Result<Value, BackendError> {
        let response = self
            .client
            .get(self.config.endpoint("/personas"))
            .send()
            .await?;

        read_json(ensure_success(response).await?).await
    }

    /// Liveness probe against `/health`
    pub async fn health(&self) -> Result<Value, BackendError> {
        let response = self
            .client
            .get(self.config.endpoint("/health"))
            .send()
            .await?;

        read_json(ensure_success(response).await?).await
    }

    /// Request speech audio from `/tts`.
    ///
    /// Returns the successful response with its body unread so the caller can
    /// stream the audio through.
    pub async fn speech(&self, request: &SpeechRequest) -> Result<Response, BackendError> {
        tracing::debug!(
            persona_id = %request.persona_id,
            chars = request.text.len(),
            "Forwarding speech request"
        );

        let response = self
            .client
            .post(self.config.endpoint("/tts"))
            .json(request)
            .send()
            .await?;

        ensure_success(response).await
    }
}

/// Turn a non-success response into `BackendError::Status` with the body attached
async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "Analysis service error: {}", body);
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_json(response: Response) -> Result<Value, BackendError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}
