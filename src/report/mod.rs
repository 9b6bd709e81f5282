// Results export
// JSON report of everything analyzed in a session

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::{DebateResult, SessionStore, Synthesis};
use crate::views::ResultsView;

/// Synthesis block of one analyzed slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSynthesis {
    #[serde(rename = "slideIdx")]
    pub slide_index: usize,
    pub synthesis: Synthesis,
}

/// The downloadable analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsReport {
    pub deck_name: String,
    pub deck_type: String,
    pub analysis_date: DateTime<Utc>,
    /// Average critique score with one decimal, e.g. "7.5"
    pub overall_score: String,
    pub slides_analyzed: usize,
    pub total_slides: usize,
    pub debates: BTreeMap<usize, DebateResult>,
    pub synthesis: Vec<SlideSynthesis>,
}

impl ResultsReport {
    pub fn from_store(store: &SessionStore) -> Self {
        Self::from_store_at(store, Utc::now())
    }

    pub fn from_store_at(store: &SessionStore, analysis_date: DateTime<Utc>) -> Self {
        let view = ResultsView::from_store(store);
        let synthesis = store
            .debates()
            .iter()
            .filter_map(|(&slide_index, result)| {
                result.synthesis.clone().map(|synthesis| SlideSynthesis {
                    slide_index,
                    synthesis,
                })
            })
            .collect();

        Self {
            deck_name: view.deck_name,
            deck_type: view.deck_type,
            analysis_date,
            overall_score: format!("{:.1}", view.overall_score.unwrap_or(0.0)),
            slides_analyzed: view.slides_analyzed,
            total_slides: view.total_slides,
            debates: store.debates().clone(),
            synthesis,
        }
    }

    /// `pitch-deck-analysis-YYYY-MM-DD.json`
    pub fn default_file_name(&self) -> String {
        format!(
            "pitch-deck-analysis-{}.json",
            self.analysis_date.format("%Y-%m-%d")
        )
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize results report")
    }

    /// Write the report. A directory target gets the default file name.
    pub fn write(&self, target: &Path) -> Result<PathBuf> {
        let path = if target.is_dir() {
            target.join(self.default_file_name())
        } else {
            target.to_path_buf()
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, self.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        tracing::info!("Report written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::PersonaCatalog;
    use crate::session::DeckUpload;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn analyzed_store() -> SessionStore {
        let mut store = SessionStore::new();
        store.load_personas(PersonaCatalog::builtin().unwrap());
        let upload = DeckUpload::from_gateway(&json!({
            "deck_name": "deck.pptx",
            "deck_type": "AI/ML Platform",
            "slides": [{"title": "Problem"}, {"title": "Solution"}]
        }))
        .unwrap();
        store.record_upload(upload);

        let ticket = store.begin_analysis(1);
        store.record_debate_result(
            ticket,
            DebateResult::from_value(json!({
                "debate_round": {"debates": [
                    {"persona_id": "ai_architect", "critique": {"overall_score": 7}},
                    {"persona_id": "ai_investor", "critique": {"overall_score": 8}}
                ]},
                "synthesis": {"overall_score": 7.5, "consensus_issues": ["No pricing"]}
            })),
        );
        store
    }

    fn fixed_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_report_fields() {
        let report = ResultsReport::from_store_at(&analyzed_store(), fixed_date());
        assert_eq!(report.deck_name, "deck.pptx");
        assert_eq!(report.deck_type, "AI/ML Platform");
        assert_eq!(report.overall_score, "7.5");
        assert_eq!(report.slides_analyzed, 1);
        assert_eq!(report.total_slides, 2);
        assert_eq!(report.synthesis.len(), 1);
        assert_eq!(report.synthesis[0].slide_index, 1);
        assert_eq!(report.default_file_name(), "pitch-deck-analysis-2024-03-09.json");
    }

    #[test]
    fn test_empty_report_fallbacks() {
        let report = ResultsReport::from_store_at(&SessionStore::new(), fixed_date());
        assert_eq!(report.deck_name, "unknown");
        assert_eq!(report.deck_type, "Unknown");
        assert_eq!(report.overall_score, "0.0");
        assert!(report.debates.is_empty());
    }

    #[test]
    fn test_write_into_directory() {
        let dir = TempDir::new().unwrap();
        let report = ResultsReport::from_store_at(&analyzed_store(), fixed_date());
        let path = report.write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("pitch-deck-analysis-2024-03-09.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["analysis_date"], "2024-03-09T14:30:00Z");
        assert_eq!(written["overall_score"], "7.5");
        assert_eq!(written["synthesis"][0]["slideIdx"], 1);
        assert!(written["synthesis"][0].get("slide_index").is_none());
        assert_eq!(
            written["debates"]["1"]["debate_round"]["debates"][1]["critique"]["overall_score"],
            8.0
        );
    }
}
