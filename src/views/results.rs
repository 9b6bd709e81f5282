// Results view-model
// Deck-wide roll-up of every analyzed slide

use serde::Serialize;
use std::fmt;

use super::critique::average;
use crate::session::{DebateResult, SessionStore};

/// Bucket for an individual critique score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// 7 to 10
    High,
    /// 5 to 6
    Medium,
    /// 0 to 4
    Low,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            ScoreBand::High
        } else if score >= 5.0 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ScoreDistribution {
    fn add(&mut self, score: f64) {
        match ScoreBand::from_score(score) {
            ScoreBand::High => self.high += 1,
            ScoreBand::Medium => self.medium += 1,
            ScoreBand::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixRow {
    pub severity: String,
    pub issue: String,
    pub fix: String,
}

/// One analyzed slide in the roll-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideResult {
    pub slide_index: usize,
    pub title: String,
    pub average_score: Option<f64>,
    pub consensus_score: Option<f64>,
    pub priority_fixes: Vec<FixRow>,
    /// First three priority actions, as `(priority, action)`
    pub top_actions: Vec<(String, String)>,
    pub deal_breakers: Vec<String>,
    pub strengths_to_maintain: Vec<String>,
}

impl SlideResult {
    fn new(slide_index: usize, title: String, result: &DebateResult) -> Self {
        let scores: Vec<f64> = result.critique_scores().collect();
        let feedback = result.unified_feedback();

        Self {
            slide_index,
            title,
            average_score: average(&scores),
            consensus_score: feedback.and_then(|f| f.overall_consensus_score),
            priority_fixes: result
                .synthesis
                .as_ref()
                .map(|s| {
                    s.priority_fixes
                        .iter()
                        .map(|fix| FixRow {
                            severity: fix.severity.clone().unwrap_or_else(|| "Minor".to_string()),
                            issue: fix.issue.clone().unwrap_or_else(|| "Unknown".to_string()),
                            fix: fix.fix.clone().unwrap_or_else(|| "Unknown".to_string()),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            top_actions: feedback
                .map(|f| {
                    f.priority_actions
                        .iter()
                        .take(3)
                        .map(|a| {
                            (
                                a.priority.clone().unwrap_or_default(),
                                a.action.clone().unwrap_or_default(),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default(),
            deal_breakers: feedback.map(|f| f.deal_breakers.clone()).unwrap_or_default(),
            strengths_to_maintain: feedback
                .map(|f| f.strengths_to_maintain.clone())
                .unwrap_or_default(),
        }
    }
}

/// Deck-wide results panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub deck_name: String,
    pub deck_type: String,
    /// Mean of every valid critique score across all analyzed slides
    pub overall_score: Option<f64>,
    pub slides_analyzed: usize,
    pub total_slides: usize,
    pub total_critiques: usize,
    pub distribution: ScoreDistribution,
    pub slides: Vec<SlideResult>,
}

impl ResultsView {
    pub fn from_store(store: &SessionStore) -> Self {
        let deck = store.deck();
        let mut all_scores = Vec::new();
        let mut distribution = ScoreDistribution::default();
        let mut total_critiques = 0;
        let mut slides = Vec::with_capacity(store.debates().len());

        for (&index, result) in store.debates() {
            total_critiques += result.debates().len();
            for score in result.critique_scores() {
                distribution.add(score);
                all_scores.push(score);
            }
            let title = store
                .slides()
                .get(index)
                .map(|s| s.title.clone())
                .unwrap_or_else(|| format!("Slide {}", index + 1));
            slides.push(SlideResult::new(index, title, result));
        }

        Self {
            deck_name: deck
                .map(|d| d.deck_name.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            deck_type: deck
                .and_then(|d| d.deck_type.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            overall_score: average(&all_scores),
            slides_analyzed: store.debates().len(),
            total_slides: store.slides().len(),
            total_critiques,
            distribution,
            slides,
        }
    }

    pub fn has_results(&self) -> bool {
        self.slides_analyzed > 0
    }
}

impl fmt::Display for ResultsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.deck_name, self.deck_type)?;
        match self.overall_score {
            Some(score) => writeln!(f, "Overall score: {:.1}/10", score)?,
            None => writeln!(f, "Overall score: N/A")?,
        }
        writeln!(
            f,
            "Slides analyzed: {}/{} ({} critiques: {} high, {} medium, {} low)",
            self.slides_analyzed,
            self.total_slides,
            self.total_critiques,
            self.distribution.high,
            self.distribution.medium,
            self.distribution.low
        )?;

        for slide in &self.slides {
            write!(f, "\nSlide {}: {}", slide.slide_index + 1, slide.title)?;
            if let Some(score) = slide.consensus_score {
                write!(f, " (consensus {}/10)", score)?;
            }
            writeln!(f)?;
            for fix in &slide.priority_fixes {
                writeln!(f, "  [{}] {}", fix.severity, fix.issue)?;
                writeln!(f, "      Fix: {}", fix.fix)?;
            }
            for (priority, action) in &slide.top_actions {
                writeln!(f, "  [{}] {}", priority, action)?;
            }
            for item in &slide.deal_breakers {
                writeln!(f, "  ! {}", item)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::PersonaCatalog;
    use crate::session::DeckUpload;
    use serde_json::json;

    fn store_with_results() -> SessionStore {
        let mut store = SessionStore::new();
        store.load_personas(PersonaCatalog::builtin().unwrap());
        store.record_upload(DeckUpload::placeholder("deck.pptx"));

        let first = store.begin_analysis(0);
        store.record_debate_result(
            first,
            DebateResult::from_value(json!({
                "debate_round": {"debates": [
                    {"persona_id": "ai_architect", "critique": {"overall_score": 8}},
                    {"persona_id": "ai_investor", "critique": {"overall_score": 4}}
                ]},
                "synthesis": {"priority_fixes": [{"issue": "No moat", "severity": "Critical"}]}
            })),
        );
        let second = store.begin_analysis(3);
        store.record_debate_result(
            second,
            DebateResult::from_value(json!({
                "debate_round": {"debates": [
                    {"persona_id": "ai_architect", "critique": {"overall_score": 6}},
                    {"persona_id": "ai_investor", "error": "rate limited"}
                ]}
            })),
        );
        store
    }

    #[test]
    fn test_overall_average_across_slides() {
        let view = ResultsView::from_store(&store_with_results());
        assert_eq!(view.overall_score, Some(6.0));
        assert_eq!(view.slides_analyzed, 2);
        assert_eq!(view.total_slides, 12);
        assert_eq!(view.total_critiques, 4);
        assert_eq!(
            view.distribution,
            ScoreDistribution {
                high: 1,
                medium: 1,
                low: 1
            }
        );
    }

    #[test]
    fn test_slide_rows() {
        let view = ResultsView::from_store(&store_with_results());
        assert_eq!(view.slides[0].title, "Problem Statement");
        assert_eq!(view.slides[0].priority_fixes[0].fix, "Unknown");
        assert_eq!(view.slides[1].slide_index, 3);
        assert_eq!(view.slides[1].average_score, Some(6.0));
    }

    #[test]
    fn test_empty_store_fallbacks() {
        let view = ResultsView::from_store(&SessionStore::new());
        assert_eq!(view.deck_name, "unknown");
        assert_eq!(view.deck_type, "Unknown");
        assert!(!view.has_results());
        assert!(view.to_string().contains("N/A"));
    }
}
