// Errors seen by the review driver

use thiserror::Error;

use crate::session::DeckError;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Select at least one persona before analyzing")]
    NoPersonasSelected,

    #[error("{file_name} is not a PowerPoint file (.pptx)")]
    NotAPresentation { file_name: String },

    #[error("Upload a deck before analyzing")]
    NoDeck,

    #[error("Slide {index} is out of range (deck has {total} slides)")]
    SlideOutOfRange { index: usize, total: usize },

    /// The gateway answered with an error body `{error, details?}`
    #[error("{}", describe(.message, .details))]
    Gateway {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("Gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

fn describe(message: &str, details: &Option<String>) -> String {
    match details {
        Some(details) => format!("{message} ({details})"),
        None => message.to_string(),
    }
}

impl ReviewError {
    /// Rejected before any network call was made
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ReviewError::NoPersonasSelected
                | ReviewError::NotAPresentation { .. }
                | ReviewError::NoDeck
                | ReviewError::SlideOutOfRange { .. }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ReviewError::Gateway { status, .. } => Some(*status),
            _ => None,
        }
    }
}
