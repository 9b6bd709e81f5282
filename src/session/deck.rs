// Deck model: slides, upload summary, and the placeholder deck
//
// The gateway's upload answer is loosely typed JSON. It is normalized here
// right after the call so the rest of the crate only sees `DeckUpload`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Deck type used for the placeholder deck
pub const PLACEHOLDER_DECK_TYPE: &str = "AI/ML Startup Pitch Deck";

const PLACEHOLDER_TITLES: [&str; 12] = [
    "Problem Statement",
    "Market Opportunity",
    "Our Solution",
    "Technology Architecture",
    "Business Model",
    "Go-to-Market Strategy",
    "Competitive Landscape",
    "Team",
    "Traction & Milestones",
    "Financials",
    "Investment Ask",
    "Vision & Roadmap",
];

/// One slide. Serializes in the shape the analysis service expects back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// 0-based position, stable for the deck's lifetime
    pub index: usize,
    /// 1-based slide number as the service reports it
    pub number: u32,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_name: Option<String>,
}

impl Slide {
    /// Normalize the slide at `index` from the service's JSON
    pub fn from_value(index: usize, value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::trim);
        let number = value
            .get("number")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or_else(|| slide_number(index));

        Self {
            index,
            number,
            title: text("title")
                .filter(|t| !t.is_empty())
                .unwrap_or("Untitled Slide")
                .to_string(),
            content: text("content").unwrap_or_default().to_string(),
            notes: text("notes").filter(|n| !n.is_empty()).map(str::to_string),
            shape_count: value
                .get("shape_count")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok()),
            layout_name: text("layout_name").map(str::to_string),
        }
    }

    pub fn has_notes(&self) -> bool {
        self.notes.is_some()
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

fn slide_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Deck statistics, always derived from the normalized slides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub total_slides: usize,
    pub avg_content_length: usize,
    pub slides_with_notes: usize,
    pub slide_titles: Vec<String>,
    pub total_words: usize,
}

impl UploadSummary {
    pub fn from_slides(slides: &[Slide]) -> Self {
        if slides.is_empty() {
            return Self::default();
        }

        let total_chars: usize = slides.iter().map(|s| s.content.chars().count()).sum();
        let avg = (total_chars as f64 / slides.len() as f64).round() as usize;

        Self {
            total_slides: slides.len(),
            avg_content_length: avg,
            slides_with_notes: slides.iter().filter(|s| s.has_notes()).count(),
            slide_titles: slides.iter().map(|s| s.title.clone()).collect(),
            total_words: slides.iter().map(Slide::word_count).sum(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DeckError {
    #[error("Upload response is not a JSON object")]
    NotAnObject,
    #[error("Upload response has no slides array")]
    MissingSlides,
}

/// A parsed deck, ready to be recorded in the session store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckUpload {
    pub deck_name: String,
    /// Classification reported by the service, if any
    pub deck_type: Option<String>,
    pub summary: UploadSummary,
    pub slides: Vec<Slide>,
    /// True when this is the stand-in deck used after a failed upload
    pub placeholder: bool,
}

impl DeckUpload {
    /// Normalize the gateway's `{deck_name, deck_type, summary, slides}` answer.
    ///
    /// The summary is recomputed from the slides; a disagreeing upstream
    /// summary is logged and ignored.
    pub fn from_gateway(value: &Value) -> Result<Self, DeckError> {
        let object = value.as_object().ok_or(DeckError::NotAnObject)?;
        let raw_slides = object
            .get("slides")
            .and_then(Value::as_array)
            .ok_or(DeckError::MissingSlides)?;

        let slides: Vec<Slide> = raw_slides
            .iter()
            .enumerate()
            .map(|(index, raw)| Slide::from_value(index, raw))
            .collect();
        let summary = UploadSummary::from_slides(&slides);

        if let Some(reported) = object
            .get("summary")
            .and_then(|s| s.get("total_slides"))
            .and_then(Value::as_u64)
        {
            if reported as usize != summary.total_slides {
                tracing::warn!(
                    reported,
                    parsed = summary.total_slides,
                    "Upload summary disagrees with slide list; using the slide list"
                );
            }
        }

        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            deck_name: text("deck_name").unwrap_or_else(|| "unknown".to_string()),
            deck_type: text("deck_type"),
            summary,
            slides,
            placeholder: false,
        })
    }

    /// Fixed twelve-slide deck used so the flow stays exercisable when the
    /// analysis service cannot parse an upload
    pub fn placeholder(deck_name: impl Into<String>) -> Self {
        let slides: Vec<Slide> = PLACEHOLDER_TITLES
            .iter()
            .enumerate()
            .map(|(index, title)| Slide {
                index,
                number: slide_number(index),
                title: title.to_string(),
                content: format!("Sample content for slide {}", index + 1),
                notes: (index % 2 == 0).then(|| format!("Speaker notes for slide {}", index + 1)),
                shape_count: None,
                layout_name: None,
            })
            .collect();

        Self {
            deck_name: deck_name.into(),
            deck_type: Some(PLACEHOLDER_DECK_TYPE.to_string()),
            summary: UploadSummary::from_slides(&slides),
            slides,
            placeholder: true,
        }
    }
}
