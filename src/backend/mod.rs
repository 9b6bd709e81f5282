// Analysis service client
// Everything that leaves this process for the external service goes through here

mod client;
mod error;
mod types;

pub use client::BackendClient;
pub use error::BackendError;
pub use types::{is_presentation, AnalyzeRequest, DeckFile, SpeechRequest};
