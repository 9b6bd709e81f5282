// Session store
// One review session's client state and the transitions allowed on it

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::debate::DebateResult;
use super::deck::{DeckUpload, Slide, UploadSummary};
use crate::personas::{PersonaCatalog, PersonaCategory};

/// Issued when an analyze call starts; presented again with its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub slide_index: usize,
    pub request_id: u64,
    pub generation: u64,
}

/// What `record_debate_result` did with a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Applied,
    /// A later request for the same slide was already applied
    Stale,
    /// The slide index is not part of the current deck
    OutOfRange,
    /// The ticket was issued before the current deck was uploaded
    PreviousDeck,
}

impl RecordOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, RecordOutcome::Applied)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckInfo {
    pub deck_name: String,
    pub deck_type: Option<String>,
    pub summary: UploadSummary,
    pub placeholder: bool,
}

/// Client state for one review session.
///
/// Every transition takes `&mut self` and either applies fully or not at all.
/// Invariants held after each call:
/// - the selection only contains catalog ids
/// - every debate key indexes the current slides
/// - a new deck clears all debate results
#[derive(Debug, Clone)]
pub struct SessionStore {
    session_id: Uuid,
    catalog: PersonaCatalog,
    categories: BTreeMap<PersonaCategory, Vec<String>>,
    selection: BTreeSet<String>,
    deck: Option<DeckInfo>,
    slides: Vec<Slide>,
    current_slide: usize,
    debates: BTreeMap<usize, DebateResult>,
    generation: u64,
    next_request_id: u64,
    applied: BTreeMap<usize, u64>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            catalog: PersonaCatalog::default(),
            categories: BTreeMap::new(),
            selection: BTreeSet::new(),
            deck: None,
            slides: Vec::new(),
            current_slide: 0,
            debates: BTreeMap::new(),
            generation: 0,
            next_request_id: 0,
            applied: BTreeMap::new(),
        }
    }

    /// Replace the catalog. Every persona starts out selected.
    pub fn load_personas(&mut self, catalog: PersonaCatalog) {
        self.categories = catalog.by_category();
        self.selection = catalog.ids().into_iter().collect();
        self.catalog = catalog;
        tracing::debug!(
            session = %self.session_id,
            personas = self.catalog.len(),
            "Persona catalog loaded"
        );
    }

    /// Flip one persona's membership. Returns whether it is now selected.
    /// Ids outside the catalog are ignored and report `false`.
    pub fn toggle_persona(&mut self, id: &str) -> bool {
        if !self.catalog.contains(id) {
            tracing::debug!("Ignoring toggle for unknown persona: {}", id);
            return false;
        }
        if self.selection.remove(id) {
            false
        } else {
            self.selection.insert(id.to_string());
            true
        }
    }

    /// Replace the selection with the catalog-known subset of `ids`
    pub fn replace_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.selection = ids
            .into_iter()
            .filter(|id| self.catalog.contains(id.as_ref()))
            .map(|id| id.as_ref().to_string())
            .collect();
    }

    /// Replace the deck. Clears every debate result and invalidates tickets
    /// issued for the previous deck.
    pub fn record_upload(&mut self, upload: DeckUpload) {
        let DeckUpload {
            deck_name,
            deck_type,
            summary,
            slides,
            placeholder,
        } = upload;

        tracing::info!(
            session = %self.session_id,
            deck = %deck_name,
            slides = slides.len(),
            placeholder,
            "Deck recorded"
        );

        self.deck = Some(DeckInfo {
            deck_name,
            deck_type,
            summary,
            placeholder,
        });
        self.slides = slides;
        self.current_slide = 0;
        self.debates.clear();
        self.applied.clear();
        self.generation += 1;
    }

    /// Stamp a new analyze request for `slide_index`
    pub fn begin_analysis(&mut self, slide_index: usize) -> AnalysisTicket {
        self.next_request_id += 1;
        AnalysisTicket {
            slide_index,
            request_id: self.next_request_id,
            generation: self.generation,
        }
    }

    /// Apply a completed analysis, unless a newer one for the same slide
    /// already landed or the deck has changed since the ticket was issued.
    pub fn record_debate_result(
        &mut self,
        ticket: AnalysisTicket,
        result: DebateResult,
    ) -> RecordOutcome {
        if ticket.generation != self.generation {
            tracing::warn!(
                slide = ticket.slide_index,
                request = ticket.request_id,
                "Discarding result for a previous deck"
            );
            return RecordOutcome::PreviousDeck;
        }
        if ticket.slide_index >= self.slides.len() {
            tracing::warn!(
                slide = ticket.slide_index,
                slides = self.slides.len(),
                "Discarding result for a slide outside the deck"
            );
            return RecordOutcome::OutOfRange;
        }
        if let Some(&applied) = self.applied.get(&ticket.slide_index) {
            if applied > ticket.request_id {
                tracing::warn!(
                    slide = ticket.slide_index,
                    request = ticket.request_id,
                    applied,
                    "Discarding stale analysis result"
                );
                return RecordOutcome::Stale;
            }
        }

        self.applied.insert(ticket.slide_index, ticket.request_id);
        self.debates.insert(ticket.slide_index, result);
        RecordOutcome::Applied
    }

    /// Move the cursor, clamped to the deck. Returns the new position.
    pub fn select_slide(&mut self, index: usize) -> usize {
        self.current_slide = index.min(self.slides.len().saturating_sub(1));
        self.current_slide
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    pub fn categories(&self) -> &BTreeMap<PersonaCategory, Vec<String>> {
        &self.categories
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    /// Selected persona ids in catalog order
    pub fn selected_ids(&self) -> Vec<String> {
        self.catalog
            .iter()
            .filter(|p| self.selection.contains(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn deck(&self) -> Option<&DeckInfo> {
        self.deck.as_ref()
    }

    pub fn has_deck(&self) -> bool {
        self.deck.is_some()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn current_slide(&self) -> usize {
        self.current_slide
    }

    pub fn debates(&self) -> &BTreeMap<usize, DebateResult> {
        &self.debates
    }

    pub fn debate(&self, slide_index: usize) -> Option<&DebateResult> {
        self.debates.get(&slide_index)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with_deck(slides: usize) -> SessionStore {
        let mut store = SessionStore::new();
        store.load_personas(PersonaCatalog::builtin().unwrap());
        let raw: Vec<_> = (0..slides)
            .map(|i| json!({"title": format!("Slide {i}"), "content": "text"}))
            .collect();
        let upload = DeckUpload::from_gateway(&json!({"deck_name": "deck.pptx", "slides": raw}))
            .unwrap();
        store.record_upload(upload);
        store
    }

    fn result_with_score(score: f64) -> DebateResult {
        DebateResult::from_value(json!({
            "debate_round": {"debates": [{"persona_id": "ai_architect", "critique": {"overall_score": score}}]}
        }))
    }

    #[test]
    fn test_catalog_load_selects_everyone() {
        let store = store_with_deck(1);
        assert_eq!(store.selected_ids(), store.catalog().ids());
        assert_eq!(store.categories().values().map(Vec::len).sum::<usize>(), 6);
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let mut store = store_with_deck(1);
        let before = store.selected_ids();

        assert!(!store.toggle_persona("ai_investor"));
        assert!(!store.is_selected("ai_investor"));
        assert!(store.toggle_persona("ai_investor"));
        assert_eq!(store.selected_ids(), before);
    }

    #[test]
    fn test_toggle_unknown_persona_is_ignored() {
        let mut store = store_with_deck(1);
        let before = store.selected_ids();
        assert!(!store.toggle_persona("ghost"));
        assert_eq!(store.selected_ids(), before);
    }

    #[test]
    fn test_replace_selection_filters_to_catalog() {
        let mut store = store_with_deck(1);
        store.replace_selection(["ai_ethics_expert", "ghost", "ai_architect"]);
        assert_eq!(store.selected_ids(), vec!["ai_architect", "ai_ethics_expert"]);
    }

    #[test]
    fn test_upload_replaces_slides_and_clears_debates() {
        let mut store = store_with_deck(3);
        let ticket = store.begin_analysis(2);
        assert!(store.record_debate_result(ticket, result_with_score(6.0)).applied());
        store.select_slide(2);

        let upload = DeckUpload::from_gateway(&json!({"deck_name": "v2.pptx", "slides": [{"title": "Only"}]}))
            .unwrap();
        store.record_upload(upload);

        assert_eq!(store.slides().len(), 1);
        assert_eq!(store.deck().unwrap().summary.total_slides, 1);
        assert!(store.debates().is_empty());
        assert_eq!(store.current_slide(), 0);
    }

    #[test]
    fn test_ticket_from_previous_deck_is_discarded() {
        let mut store = store_with_deck(3);
        let ticket = store.begin_analysis(0);
        store.record_upload(DeckUpload::placeholder("offline.pptx"));
        assert_eq!(
            store.record_debate_result(ticket, result_with_score(9.0)),
            RecordOutcome::PreviousDeck
        );
        assert!(store.debate(0).is_none());
    }

    #[test]
    fn test_older_completion_does_not_overwrite_newer() {
        let mut store = store_with_deck(2);
        let first = store.begin_analysis(1);
        let second = store.begin_analysis(1);

        assert!(store.record_debate_result(second, result_with_score(8.0)).applied());
        assert_eq!(
            store.record_debate_result(first, result_with_score(3.0)),
            RecordOutcome::Stale
        );
        let kept = store.debate(1).unwrap().critique_scores().next();
        assert_eq!(kept, Some(8.0));
    }

    #[test]
    fn test_out_of_range_result_is_discarded() {
        let mut store = store_with_deck(2);
        let ticket = store.begin_analysis(5);
        assert_eq!(
            store.record_debate_result(ticket, result_with_score(5.0)),
            RecordOutcome::OutOfRange
        );
        assert!(store.debates().keys().all(|&k| k < store.slides().len()));
    }

    #[test]
    fn test_select_slide_clamps() {
        let mut store = store_with_deck(4);
        assert_eq!(store.select_slide(2), 2);
        assert_eq!(store.select_slide(40), 3);

        let mut empty = SessionStore::new();
        assert_eq!(empty.select_slide(3), 0);
    }

    #[test]
    fn test_generation_and_session_id() {
        let mut store = store_with_deck(2);
        let id = store.session_id();
        let before = store.generation();
        store.record_upload(DeckUpload::placeholder("again.pptx"));
        assert!(store.generation() > before);
        assert_eq!(store.session_id(), id);
        assert_ne!(SessionStore::new().session_id(), id);
    }
}
