// Individual critiques view-model

use serde::Serialize;
use std::fmt;

use super::results::ScoreBand;
use crate::session::{CritiqueIssue, DebateResult, PersonaDebate, Recommendation, SessionStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub severity: String,
    pub issue: String,
    pub reasoning: Option<String>,
}

impl From<&CritiqueIssue> for IssueRow {
    fn from(issue: &CritiqueIssue) -> Self {
        let (severity, reasoning) = match issue {
            CritiqueIssue::Text(_) => (None, None),
            CritiqueIssue::Detailed(detail) => (detail.severity.clone(), detail.reasoning.clone()),
        };
        Self {
            severity: severity.unwrap_or_else(|| "Minor".to_string()),
            issue: issue.summary().to_string(),
            reasoning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRow {
    pub priority: String,
    pub action: String,
    pub rationale: Option<String>,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(rec: &Recommendation) -> Self {
        let (priority, rationale) = match rec {
            Recommendation::Text(_) => (None, None),
            Recommendation::Detailed(detail) => (detail.priority.clone(), detail.rationale.clone()),
        };
        Self {
            priority: priority.unwrap_or_else(|| "Medium".to_string()),
            action: rec.summary().to_string(),
            rationale,
        }
    }
}

/// One persona's card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CritiqueRow {
    pub persona_id: Option<String>,
    pub persona_name: String,
    pub emoji: Option<String>,
    pub role: Option<String>,
    pub score: Option<f64>,
    pub band: Option<ScoreBand>,
    pub error: Option<String>,
    pub strengths: Vec<String>,
    pub issues: Vec<IssueRow>,
    pub recommendations: Vec<RecommendationRow>,
    pub questions: Vec<String>,
    /// Raw model output, shown when the critique has no structure
    pub raw_response: Option<String>,
}

impl CritiqueRow {
    fn from_debate(debate: &PersonaDebate, store: Option<&SessionStore>) -> Self {
        let known = debate
            .persona_id
            .as_deref()
            .and_then(|id| store.and_then(|s| s.catalog().get(id)));
        let critique = debate.critique.as_ref();
        let score = debate.score();
        let unstructured = critique.map_or(true, |c| c.is_unstructured());

        Self {
            persona_id: debate.persona_id.clone(),
            persona_name: debate
                .persona_name
                .clone()
                .or_else(|| known.map(|p| p.name.clone()))
                .or_else(|| debate.persona_id.clone())
                .unwrap_or_else(|| "Unknown Expert".to_string()),
            emoji: debate.emoji.clone().or_else(|| known.map(|p| p.emoji.clone())),
            role: debate.role.clone().or_else(|| known.map(|p| p.role.clone())),
            score,
            band: score.map(ScoreBand::from_score),
            error: debate.error.clone(),
            strengths: critique.map(|c| c.key_strengths.clone()).unwrap_or_default(),
            issues: critique
                .map(|c| c.critical_issues.iter().map(IssueRow::from).collect())
                .unwrap_or_default(),
            recommendations: critique
                .map(|c| c.recommendations.iter().map(RecommendationRow::from).collect())
                .unwrap_or_default(),
            questions: critique
                .map(|c| c.questions_to_answer.clone())
                .unwrap_or_default(),
            raw_response: unstructured
                .then(|| debate.raw_response.clone())
                .flatten(),
        }
    }
}

/// The per-persona critique panel for one slide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CritiqueView {
    pub slide_index: usize,
    pub slide_title: Option<String>,
    pub rows: Vec<CritiqueRow>,
    /// Critiques with no error and a numeric score
    pub valid_count: usize,
    pub average_score: Option<f64>,
    pub elapsed_time: Option<f64>,
}

impl CritiqueView {
    pub fn for_slide(store: &SessionStore, slide_index: usize) -> Option<Self> {
        let result = store.debate(slide_index)?;
        let mut view = Self::build(slide_index, result, Some(store));
        if view.slide_title.is_none() {
            view.slide_title = store.slides().get(slide_index).map(|s| s.title.clone());
        }
        Some(view)
    }

    pub fn from_result(slide_index: usize, result: &DebateResult) -> Self {
        Self::build(slide_index, result, None)
    }

    fn build(slide_index: usize, result: &DebateResult, store: Option<&SessionStore>) -> Self {
        let rows: Vec<CritiqueRow> = result
            .debates()
            .iter()
            .map(|d| CritiqueRow::from_debate(d, store))
            .collect();
        let scores: Vec<f64> = result.critique_scores().collect();
        let round = result.debate_round.as_ref();

        Self {
            slide_index,
            slide_title: round.and_then(|r| r.slide_title.clone()),
            rows,
            valid_count: scores.len(),
            average_score: average(&scores),
            elapsed_time: round.and_then(|r| r.elapsed_time),
        }
    }
}

pub(crate) fn average(scores: &[f64]) -> Option<f64> {
    (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
}

impl fmt::Display for CritiqueView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slide {}", self.slide_index + 1)?;
        if let Some(title) = &self.slide_title {
            write!(f, ": {}", title)?;
        }
        writeln!(f)?;
        match self.average_score {
            Some(avg) => writeln!(
                f,
                "  Average score: {:.1}/10 across {} of {} experts",
                avg,
                self.valid_count,
                self.rows.len()
            )?,
            None => writeln!(f, "  Average score: N/A")?,
        }

        for row in &self.rows {
            let emoji = row.emoji.as_deref().unwrap_or("");
            match (&row.error, row.score) {
                (Some(error), _) => writeln!(f, "  {} {}: error: {}", emoji, row.persona_name, error)?,
                (None, Some(score)) => writeln!(f, "  {} {}: {}/10", emoji, row.persona_name, score)?,
                (None, None) => writeln!(f, "  {} {}: no score", emoji, row.persona_name)?,
            }
            for issue in &row.issues {
                writeln!(f, "    [{}] {}", issue.severity, issue.issue)?;
            }
            for rec in &row.recommendations {
                writeln!(f, "    -> [{}] {}", rec.priority, rec.action)?;
            }
        }
        Ok(())
    }
}
