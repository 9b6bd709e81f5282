// Session module
// Client state for a review session and the normalized upstream payloads it holds

pub mod debate;
mod deck;
pub(crate) mod lenient;
mod store;

pub use debate::{
    ClientQuestion, Critique, CritiqueIssue, DebateConsensus, DebateResult, DebateRound,
    PersonaDebate, PriorityAction, Recommendation, Synthesis, TranscriptEntry, UnifiedFeedback,
};
pub use deck::{DeckError, DeckUpload, Slide, UploadSummary, PLACEHOLDER_DECK_TYPE};
pub use store::{AnalysisTicket, DeckInfo, RecordOutcome, SessionStore};
