// HTTP handlers for the gateway routes
//
// Each handler validates what the browser sent, forwards it to the analysis
// service and hands the answer back. Nothing is cached or retried here.

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::{GatewayError, GatewayResult};
use super::GatewayState;
use crate::backend::{is_presentation, AnalyzeRequest, DeckFile, SpeechRequest};
use crate::config::constants::routes;

/// Build the gateway router
pub fn create_router(state: Arc<GatewayState>) -> Router {
    let upload_limit = state.config().server.max_upload_bytes;
    let cors = state.config().server.cors_permissive;

    let router = Router::new()
        .route(
            routes::UPLOAD,
            post(handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(routes::ANALYZE, post(handle_analyze))
        .route(routes::PERSONAS, get(handle_personas))
        .route(routes::TTS, post(handle_speech))
        .route(routes::HEALTH, get(handle_health))
        .route(routes::CHECK_API_KEY, get(handle_check_api_key))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Body limit hits become 413; anything else is a malformed upload
fn upload_read_error(err: MultipartError, context: &str, limit: usize) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected: larger than {} bytes", limit);
        GatewayError::too_large(format!("Deck is larger than the {limit} byte upload limit"))
    } else {
        GatewayError::bad_request(format!("{context}: {err}"))
    }
}

/// POST /api/python/upload
///
/// Expects a multipart body with one `file` field. Responds with
/// `{deck_name, deck_type, summary, slides}`; `deck_name` is the filename the
/// client sent, not anything the service reports.
pub async fn handle_upload(
    State(state): State<Arc<GatewayState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> GatewayResult<Json<Value>> {
    let mut multipart = multipart.map_err(|_| GatewayError::bad_request("No file provided"))?;
    let limit = state.config().server.max_upload_bytes;

    let mut deck = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_read_error(e, "Malformed upload", limit))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        if !is_presentation(&file_name, content_type.as_deref()) {
            return Err(GatewayError::bad_request(
                "Please upload a PowerPoint file (.pptx)",
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_read_error(e, "Failed to read upload", limit))?;

        let mut file = DeckFile::new(file_name, bytes.to_vec());
        if let Some(content_type) = content_type {
            file = file.with_content_type(content_type);
        }
        deck = Some(file);
        break;
    }

    let Some(deck) = deck else {
        return Err(GatewayError::bad_request("No file provided"));
    };

    let deck_name = deck.file_name.clone();
    tracing::info!(file = %deck_name, bytes = deck.bytes.len(), "Uploading deck");

    let data = state.backend().upload(deck).await.map_err(|e| {
        tracing::error!("Error uploading file: {}", e);
        GatewayError::upstream("Failed to upload file to Python backend", e)
    })?;

    let field = |key: &str| data.get(key).cloned().unwrap_or(Value::Null);
    Ok(Json(json!({
        "deck_name": deck_name,
        "deck_type": field("deck_type"),
        "summary": field("summary"),
        "slides": field("slides"),
    })))
}

/// Loosely-typed analyze body; validated into `AnalyzeRequest`
#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    slide_index: Option<Value>,
    #[serde(default)]
    personas: Option<Vec<String>>,
    #[serde(default)]
    slides: Option<Vec<Value>>,
    #[serde(default)]
    deck_type: Option<String>,
}

impl AnalyzeBody {
    pub fn validate(self) -> GatewayResult<AnalyzeRequest> {
        let (Some(slide_index), Some(personas), Some(slides)) =
            (self.slide_index, self.personas, self.slides)
        else {
            return Err(GatewayError::bad_request(
                "Missing required fields: slide_index, personas, or slides",
            ));
        };

        let slide_index = slide_index
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| {
                GatewayError::bad_request("slide_index must be a non-negative integer")
            })?;

        if personas.is_empty() {
            return Err(GatewayError::bad_request("Select at least one persona"));
        }

        Ok(AnalyzeRequest {
            slide_index,
            personas,
            slides,
            deck_type: self.deck_type,
        })
    }
}

/// POST /api/python/analyze
pub async fn handle_analyze(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> GatewayResult<Json<Value>> {
    let Json(body) = body.map_err(|e| GatewayError::bad_request(format!("Invalid JSON body: {e}")))?;
    let request = body.validate()?;

    tracing::info!(
        slide_index = request.slide_index,
        personas = ?request.personas,
        "Analyzing slide"
    );

    let data = state.backend().analyze(&request).await.map_err(|e| {
        tracing::error!("Error analyzing slide: {}", e);
        GatewayError::upstream("Failed to analyze slide", e)
    })?;

    Ok(Json(data))
}

/// GET /api/python/personas
pub async fn handle_personas(State(state): State<Arc<GatewayState>>) -> GatewayResult<Json<Value>> {
    let data = state.backend().personas().await.map_err(|e| {
        tracing::error!("Error fetching personas: {}", e);
        GatewayError::upstream("Failed to fetch personas from Python backend", e)
    })?;
    Ok(Json(data))
}

#[derive(Debug, Deserialize)]
pub struct SpeechBody {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    persona_id: Option<String>,
}

/// POST /api/python/tts
///
/// Streams the service's audio through without buffering it.
pub async fn handle_speech(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<SpeechBody>, JsonRejection>,
) -> GatewayResult<Response> {
    let Json(body) = body.map_err(|_| GatewayError::bad_request("Missing text or persona_id"))?;
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(text), Some(persona_id)) = (non_blank(body.text), non_blank(body.persona_id)) else {
        return Err(GatewayError::bad_request("Missing text or persona_id"));
    };

    let upstream = state
        .backend()
        .speech(&SpeechRequest { text, persona_id })
        .await
        .map_err(|e| {
            tracing::error!("Error generating audio: {}", e);
            GatewayError::upstream("Failed to generate audio", e)
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CONTENT_DISPOSITION, "inline; filename=audio.mp3"),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

/// GET /api/python/health
pub async fn handle_health(State(state): State<Arc<GatewayState>>) -> GatewayResult<Json<Value>> {
    match state.backend().health().await {
        Ok(data) => Ok(Json(data)),
        Err(e) => {
            tracing::warn!("Python backend health check failed: {}", e);
            Err(GatewayError::Unavailable(e))
        }
    }
}

/// GET /api/check-api-key
///
/// Reports whether the credential is set, never its value.
pub async fn handle_check_api_key(State(state): State<Arc<GatewayState>>) -> Json<Value> {
    Json(json!({ "loaded": state.config().credential_loaded() }))
}
