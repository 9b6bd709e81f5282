// Review driver
//
// Issues gateway calls for one review session and applies their results to
// the session store. Analyze requests for several slides may run at once;
// their results are applied here, one at a time, as they complete.

use futures::stream::{self, StreamExt};
use serde_json::Value;

use super::client::DeckGateway;
use super::error::ReviewError;
use crate::backend::{is_presentation, AnalyzeRequest, DeckFile, SpeechRequest};
use crate::config::constants::DEFAULT_DECK_TYPE;
use crate::personas::PersonaCatalog;
use crate::report::ResultsReport;
use crate::session::{AnalysisTicket, DebateResult, DeckInfo, DeckUpload, RecordOutcome, SessionStore};

/// Default number of slides analyzed concurrently
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Outcome of one slide in a batch analysis
#[derive(Debug)]
pub struct SlideAnalysis {
    pub slide_index: usize,
    pub outcome: Result<RecordOutcome, ReviewError>,
}

pub struct ReviewSession<G> {
    gateway: G,
    store: SessionStore,
    demo_fallback: bool,
    concurrency: usize,
}

impl<G: DeckGateway> ReviewSession<G> {
    /// Start a session with `catalog` loaded (every persona selected)
    pub fn new(gateway: G, catalog: PersonaCatalog) -> Self {
        let mut store = SessionStore::new();
        store.load_personas(catalog);
        Self {
            gateway,
            store,
            demo_fallback: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Substitute the placeholder deck when an upload fails
    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// Reload the catalog from the gateway's `/personas`.
    ///
    /// Resets the selection to everyone, like any catalog load.
    pub async fn refresh_personas(&mut self) -> Result<usize, ReviewError> {
        let payload = self.gateway.personas().await?;
        let catalog = PersonaCatalog::from_service_payload(&payload, self.store.catalog())
            .map_err(|e| ReviewError::InvalidResponse(format!("{e:#}")))?;
        let count = catalog.len();
        self.store.load_personas(catalog);
        Ok(count)
    }

    /// Upload a deck and record it.
    ///
    /// Anything that is not a `.pptx` is rejected locally and never falls back.
    /// Other failures leave the store untouched, unless the demo fallback is
    /// enabled, in which case the placeholder deck is recorded instead.
    pub async fn upload(&mut self, deck: DeckFile) -> Result<&DeckInfo, ReviewError> {
        let file_name = deck.file_name.clone();
        if !is_presentation(&file_name, deck.content_type.as_deref()) {
            return Err(ReviewError::NotAPresentation { file_name });
        }

        let parsed = match self.gateway.upload(deck).await {
            Ok(value) => DeckUpload::from_gateway(&value).map_err(ReviewError::from),
            Err(e) => Err(e),
        };

        let upload = match parsed {
            Ok(upload) => upload,
            Err(e) if self.demo_fallback => {
                tracing::warn!("Upload failed ({}); using placeholder deck", e);
                DeckUpload::placeholder(file_name)
            }
            Err(e) => {
                tracing::error!("Upload failed: {}", e);
                return Err(e);
            }
        };

        self.store.record_upload(upload);
        self.store.deck().ok_or(ReviewError::NoDeck)
    }

    fn ensure_ready(&self) -> Result<(), ReviewError> {
        if self.store.selected_ids().is_empty() {
            return Err(ReviewError::NoPersonasSelected);
        }
        if !self.store.has_deck() {
            return Err(ReviewError::NoDeck);
        }
        Ok(())
    }

    fn build_request(&self, slide_index: usize) -> Result<AnalyzeRequest, ReviewError> {
        let slides = self.store.slides();
        if slide_index >= slides.len() {
            return Err(ReviewError::SlideOutOfRange {
                index: slide_index,
                total: slides.len(),
            });
        }

        let slides = slides
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;

        Ok(AnalyzeRequest {
            slide_index,
            personas: self.store.selected_ids(),
            slides,
            deck_type: Some(
                self.store
                    .deck()
                    .and_then(|d| d.deck_type.clone())
                    .unwrap_or_else(|| DEFAULT_DECK_TYPE.to_string()),
            ),
        })
    }

    /// Analyze one slide with the selected personas.
    ///
    /// Rejected locally, with no network call, when nothing is selected, no
    /// deck is loaded, or the index is outside the deck.
    pub async fn analyze_slide(&mut self, slide_index: usize) -> Result<RecordOutcome, ReviewError> {
        self.ensure_ready()?;
        let request = self.build_request(slide_index)?;
        let ticket = self.store.begin_analysis(slide_index);

        tracing::info!(
            slide = slide_index,
            personas = request.personas.len(),
            "Analyzing slide"
        );
        let value = self.gateway.analyze(&request).await?;
        Ok(self
            .store
            .record_debate_result(ticket, DebateResult::from_value(value)))
    }

    /// Analyze several slides concurrently.
    ///
    /// Fails up front only for session-wide problems (no selection, no deck);
    /// per-slide failures are reported in the returned list, in completion
    /// order.
    pub async fn analyze_slides(
        &mut self,
        indices: &[usize],
    ) -> Result<Vec<SlideAnalysis>, ReviewError> {
        self.ensure_ready()?;

        let mut results = Vec::with_capacity(indices.len());
        let mut pending: Vec<(AnalysisTicket, AnalyzeRequest)> = Vec::new();
        for &slide_index in indices {
            match self.build_request(slide_index) {
                Ok(request) => pending.push((self.store.begin_analysis(slide_index), request)),
                Err(e) => results.push(SlideAnalysis {
                    slide_index,
                    outcome: Err(e),
                }),
            }
        }

        let concurrency = self.concurrency;
        let gateway = &self.gateway;
        let store = &mut self.store;
        let mut completions = stream::iter(pending)
            .map(|(ticket, request)| async move { (ticket, gateway.analyze(&request).await) })
            .buffer_unordered(concurrency);

        while let Some((ticket, response)) = completions.next().await {
            let outcome = response.map(|value| {
                store.record_debate_result(ticket, DebateResult::from_value(value))
            });
            if let Err(e) = &outcome {
                tracing::warn!(slide = ticket.slide_index, "Slide analysis failed: {}", e);
            }
            results.push(SlideAnalysis {
                slide_index: ticket.slide_index,
                outcome,
            });
        }

        Ok(results)
    }

    /// Analyze every slide of the current deck
    pub async fn analyze_all(&mut self) -> Result<Vec<SlideAnalysis>, ReviewError> {
        let indices: Vec<usize> = (0..self.store.slides().len()).collect();
        self.analyze_slides(&indices).await
    }

    /// Speech audio for `text` in a persona's voice
    pub async fn speak(
        &self,
        persona_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Vec<u8>, ReviewError> {
        let request = SpeechRequest {
            text: text.into(),
            persona_id: persona_id.into(),
        };
        self.gateway.speak(&request).await
    }

    /// Results export of everything analyzed so far
    pub fn report(&self) -> ResultsReport {
        ResultsReport::from_store(&self.store)
    }
}
