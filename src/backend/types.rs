// Request shapes forwarded to the analysis service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::constants::PPTX_MIME;

/// Body of `POST /analyze`.
///
/// `slides` stays as raw JSON: the service gets back exactly what `/upload`
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub slide_index: usize,
    pub personas: Vec<String>,
    pub slides: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_type: Option<String>,
}

/// Body of `POST /tts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub persona_id: String,
}

/// A deck file on its way to `POST /upload`
#[derive(Debug, Clone)]
pub struct DeckFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DeckFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Whether a file looks like a presentation the service can parse:
/// a `.pptx` extension (any case) or the pptx MIME type
pub fn is_presentation(file_name: &str, content_type: Option<&str>) -> bool {
    let by_extension = file_name.to_lowercase().ends_with(".pptx");
    let by_mime = content_type
        .map(|ct| ct.eq_ignore_ascii_case(PPTX_MIME))
        .unwrap_or(false);
    by_extension || by_mime
}
