// Gateway client
//
// `DeckGateway` is the seam the review driver talks through. `GatewayClient`
// implements it over HTTP against the gateway's routes; tests swap in fakes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use super::error::ReviewError;
use crate::backend::{AnalyzeRequest, DeckFile, SpeechRequest};
use crate::config::constants::routes;

/// Calls the review driver needs from the gateway
#[async_trait]
pub trait DeckGateway: Send + Sync {
    /// Upload a deck; answers `{deck_name, deck_type, summary, slides}`
    async fn upload(&self, deck: DeckFile) -> Result<Value, ReviewError>;

    /// Analyze one slide; answers the debate result JSON
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<Value, ReviewError>;

    async fn personas(&self) -> Result<Value, ReviewError>;

    /// Synthesize speech for a persona; answers MP3 bytes
    async fn speak(&self, request: &SpeechRequest) -> Result<Vec<u8>, ReviewError>;

    async fn health(&self) -> Result<Value, ReviewError>;

    /// Whether the gateway has its model credential configured
    async fn credential_loaded(&self) -> Result<bool, ReviewError>;
}

/// HTTP implementation of `DeckGateway`
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("Failed to create gateway HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }
}

#[async_trait]
impl DeckGateway for GatewayClient {
    async fn upload(&self, deck: DeckFile) -> Result<Value, ReviewError> {
        let mut part = Part::bytes(deck.bytes).file_name(deck.file_name);
        if let Some(content_type) = deck.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }

        let response = self
            .client
            .post(self.url(routes::UPLOAD))
            .multipart(Form::new().part("file", part))
            .send()
            .await?;

        read_json(check(response).await?).await
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<Value, ReviewError> {
        let response = self
            .client
            .post(self.url(routes::ANALYZE))
            .json(request)
            .send()
            .await?;

        read_json(check(response).await?).await
    }

    async fn personas(&self) -> Result<Value, ReviewError> {
        let response = self.client.get(self.url(routes::PERSONAS)).send().await?;
        read_json(check(response).await?).await
    }

    async fn speak(&self, request: &SpeechRequest) -> Result<Vec<u8>, ReviewError> {
        let response = self
            .client
            .post(self.url(routes::TTS))
            .json(request)
            .send()
            .await?;

        let bytes = check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> Result<Value, ReviewError> {
        let response = self.client.get(self.url(routes::HEALTH)).send().await?;
        read_json(check(response).await?).await
    }

    async fn credential_loaded(&self) -> Result<bool, ReviewError> {
        let response = self
            .client
            .get(self.url(routes::CHECK_API_KEY))
            .send()
            .await?;
        let body = read_json(check(response).await?).await?;

        body.get("loaded")
            .and_then(Value::as_bool)
            .ok_or_else(|| ReviewError::InvalidResponse(format!("missing 'loaded' in {body}")))
    }
}

/// Map a gateway error body `{error, details?}` to `ReviewError::Gateway`
async fn check(response: Response) -> Result<Response, ReviewError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: Option<Value> = serde_json::from_str(&text).ok();
    let field = |key: &str| {
        body.as_ref()
            .and_then(|b| b.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Err(ReviewError::Gateway {
        status: status.as_u16(),
        message: field("error").unwrap_or_else(|| format!("Gateway returned {}", status)),
        details: field("details").or_else(|| body.is_none().then_some(text).filter(|t| !t.is_empty())),
    })
}

async fn read_json(response: Response) -> Result<Value, ReviewError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| ReviewError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;

    #[tokio::test]
    async fn test_error_body_is_decoded() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", routes::ANALYZE)
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Failed to analyze slide","details":"Analysis service returned 500: boom"}"#)
            .create_async()
            .await;

        let client = GatewayClient::new(server.url(), None).unwrap();
        let request = AnalyzeRequest {
            slide_index: 0,
            personas: vec!["ai_architect".to_string()],
            slides: vec![json!({"title": "Problem"})],
            deck_type: None,
        };
        let err = client.analyze(&request).await.unwrap_err();
        match err {
            ReviewError::Gateway {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to analyze slide");
                assert!(details.unwrap().contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_plain_text_error_becomes_details() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", routes::PERSONAS)
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = GatewayClient::new(format!("{}/", server.url()), None).unwrap();
        let err = client.personas().await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_credential_loaded() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", routes::CHECK_API_KEY)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"loaded":true}"#)
            .create_async()
            .await;

        let client = GatewayClient::new(server.url(), None).unwrap();
        assert!(client.credential_loaded().await.unwrap());
    }
}
