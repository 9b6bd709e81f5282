// Consensus view-model
// The collaborative round for one slide, with every absent field tolerated

use serde::Serialize;
use std::fmt;

use crate::session::{ClientQuestion, DebateResult, PriorityAction, SessionStore};

/// How strongly the experts agree, from the consensus score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusBand {
    Strong,
    Mixed,
    SignificantConcerns,
}

impl ConsensusBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            ConsensusBand::Strong
        } else if score >= 5.0 {
            ConsensusBand::Mixed
        } else {
            ConsensusBand::SignificantConcerns
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            ConsensusBand::Strong => "Strong consensus - proceed with confidence",
            ConsensusBand::Mixed => "Mixed feedback - address concerns",
            ConsensusBand::SignificantConcerns => "Significant concerns - major revisions needed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

impl ActionPriority {
    pub const ALL: [ActionPriority; 3] = [ActionPriority::High, ActionPriority::Medium, ActionPriority::Low];

    /// Exact label match; anything else is ungrouped
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "High" => Some(ActionPriority::High),
            "Medium" => Some(ActionPriority::Medium),
            "Low" => Some(ActionPriority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPriority::High => "High",
            ActionPriority::Medium => "Medium",
            ActionPriority::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRow {
    pub action: String,
    pub rationale: Option<String>,
    pub estimated_effort: String,
}

impl From<&PriorityAction> for ActionRow {
    fn from(action: &PriorityAction) -> Self {
        Self {
            action: action.action.clone().unwrap_or_default(),
            rationale: action.rationale.clone(),
            estimated_effort: action
                .estimated_effort
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementRow {
    pub point: String,
    pub supporting_experts: Vec<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisagreementRow {
    pub topic: String,
    /// (expert, position) pairs for each side that is present
    pub viewpoints: Vec<(String, String)>,
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptLine {
    pub speaker: String,
    pub emoji: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRow {
    pub question: String,
    pub asked_by: Vec<String>,
}

/// Everything the consensus panel shows for one slide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusView {
    pub slide_index: usize,
    pub score: Option<f64>,
    pub band: Option<ConsensusBand>,
    pub summary: Option<String>,
    pub priority_actions: Vec<(ActionPriority, Vec<ActionRow>)>,
    pub agreements: Vec<AgreementRow>,
    pub disagreements: Vec<DisagreementRow>,
    pub questions: Vec<QuestionRow>,
    pub deal_breakers: Vec<String>,
    pub strengths_to_maintain: Vec<String>,
    pub next_steps: Vec<String>,
    pub transcript: Vec<TranscriptLine>,
    /// Error reported by the collaborative round, if it failed
    pub error: Option<String>,
}

impl ConsensusView {
    /// Build the view for a slide; `None` when the slide has not been analyzed
    pub fn for_slide(store: &SessionStore, slide_index: usize) -> Option<Self> {
        store
            .debate(slide_index)
            .map(|result| Self::from_result(slide_index, result))
    }

    pub fn from_result(slide_index: usize, result: &DebateResult) -> Self {
        let consensus = result.consensus();
        let feedback = result.unified_feedback();
        let score = feedback.and_then(|f| f.overall_consensus_score);

        let priority_actions = feedback
            .map(|f| {
                ActionPriority::ALL
                    .iter()
                    .filter_map(|&priority| {
                        let rows: Vec<ActionRow> = f
                            .priority_actions
                            .iter()
                            .filter(|a| {
                                a.priority.as_deref().and_then(ActionPriority::from_label)
                                    == Some(priority)
                            })
                            .map(ActionRow::from)
                            .collect();
                        (!rows.is_empty()).then_some((priority, rows))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let agreements = feedback
            .map(|f| {
                f.areas_of_agreement
                    .iter()
                    .filter_map(|a| {
                        Some(AgreementRow {
                            point: a.point.clone()?,
                            supporting_experts: a.supporting_experts.clone(),
                            severity: a.severity.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let disagreements = feedback
            .map(|f| {
                f.areas_of_disagreement
                    .iter()
                    .map(|d| DisagreementRow {
                        topic: d.topic.clone().unwrap_or_else(|| "Unknown topic".to_string()),
                        viewpoints: [&d.viewpoint_a, &d.viewpoint_b]
                            .into_iter()
                            .flatten()
                            .map(|v| {
                                (
                                    v.expert.clone().unwrap_or_else(|| "Expert".to_string()),
                                    v.position.clone().unwrap_or_default(),
                                )
                            })
                            .collect(),
                        resolution: d.resolution.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let questions = feedback
            .map(|f| {
                f.questions_for_client
                    .iter()
                    .filter(|q| !q.question().is_empty())
                    .map(|q| QuestionRow {
                        question: q.question().to_string(),
                        asked_by: match q {
                            ClientQuestion::Detailed(detail) => detail.asked_by.clone(),
                            ClientQuestion::Text(_) => Vec::new(),
                        },
                    })
                    .collect()
            })
            .unwrap_or_default();

        let transcript = consensus
            .map(|c| {
                c.debate_transcript
                    .iter()
                    .map(|entry| TranscriptLine {
                        speaker: entry.speaker_name().to_string(),
                        emoji: entry.emoji.clone(),
                        text: entry.text().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            slide_index,
            score,
            band: score.map(ConsensusBand::from_score),
            summary: consensus.and_then(|c| c.debate_summary.clone()),
            priority_actions,
            agreements,
            disagreements,
            questions,
            deal_breakers: feedback.map(|f| f.deal_breakers.clone()).unwrap_or_default(),
            strengths_to_maintain: feedback
                .map(|f| f.strengths_to_maintain.clone())
                .unwrap_or_default(),
            next_steps: feedback
                .map(|f| f.recommended_next_steps.clone())
                .unwrap_or_default(),
            transcript,
            error: result
                .collaborative_debate
                .as_ref()
                .and_then(|c| c.error.clone()),
        }
    }

    /// Whether there is anything to show beyond an empty panel
    pub fn has_feedback(&self) -> bool {
        self.score.is_some() || !self.priority_actions.is_empty() || !self.transcript.is_empty()
    }
}

impl fmt::Display for ConsensusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Consensus for slide {}", self.slide_index + 1)?;
        match (self.score, self.band) {
            (Some(score), Some(band)) => writeln!(f, "  Score: {}/10 ({})", score, band.verdict())?,
            _ => writeln!(f, "  No consensus score")?,
        }
        if let Some(error) = &self.error {
            writeln!(f, "  Collaborative round failed: {}", error)?;
        }
        if let Some(summary) = &self.summary {
            writeln!(f, "  {}", summary)?;
        }

        for (priority, rows) in &self.priority_actions {
            writeln!(f, "  {} priority actions:", priority.as_str())?;
            for row in rows {
                writeln!(f, "    - {} (effort: {})", row.action, row.estimated_effort)?;
            }
        }
        if !self.deal_breakers.is_empty() {
            writeln!(f, "  Deal breakers:")?;
            for item in &self.deal_breakers {
                writeln!(f, "    ! {}", item)?;
            }
        }
        for row in &self.disagreements {
            writeln!(f, "  Disagreement: {}", row.topic)?;
            for (expert, position) in &row.viewpoints {
                writeln!(f, "    {}: {}", expert, position)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(feedback: serde_json::Value) -> DebateResult {
        DebateResult::from_value(json!({
            "collaborative_debate": {
                "collaborative_debate": {
                    "unified_feedback": feedback,
                    "debate_summary": "Experts agree the market slide is thin",
                    "debate_transcript": [
                        {"speaker": "Dr. Sarah Chen", "message": "The architecture is vague."},
                        {"content": "Agreed."}
                    ]
                }
            }
        }))
    }

    #[test]
    fn test_bands() {
        assert_eq!(ConsensusBand::from_score(7.0), ConsensusBand::Strong);
        assert_eq!(ConsensusBand::from_score(6.9), ConsensusBand::Mixed);
        assert_eq!(ConsensusBand::from_score(5.0), ConsensusBand::Mixed);
        assert_eq!(ConsensusBand::from_score(4.5), ConsensusBand::SignificantConcerns);
    }

    #[test]
    fn test_priority_actions_grouped_in_order() {
        let view = ConsensusView::from_result(
            0,
            &result(json!({
                "overall_consensus_score": 6,
                "priority_actions": [
                    {"action": "Add TAM numbers", "priority": "Low"},
                    {"action": "Explain moat", "priority": "High", "estimated_effort": "2 days"},
                    {"action": "Cite benchmarks", "priority": "High"},
                    {"action": "Mystery", "priority": "Urgent"}
                ]
            })),
        );

        assert_eq!(view.band, Some(ConsensusBand::Mixed));
        let groups: Vec<_> = view
            .priority_actions
            .iter()
            .map(|(p, rows)| (*p, rows.len()))
            .collect();
        assert_eq!(groups, vec![(ActionPriority::High, 2), (ActionPriority::Low, 1)]);
        assert_eq!(view.priority_actions[0].1[1].estimated_effort, "Unknown");
    }

    #[test]
    fn test_transcript_fallbacks() {
        let view = ConsensusView::from_result(0, &result(json!({})));
        assert_eq!(view.transcript.len(), 2);
        assert_eq!(view.transcript[1].speaker, "Expert");
        assert_eq!(view.transcript[1].text, "Agreed.");
        assert!(view.score.is_none());
        assert!(view.band.is_none());
    }

    #[test]
    fn test_missing_collaborative_round() {
        let view = ConsensusView::from_result(2, &DebateResult::default());
        assert!(!view.has_feedback());
        assert!(view.to_string().contains("No consensus score"));
    }

    #[test]
    fn test_disagreement_viewpoints() {
        let view = ConsensusView::from_result(
            0,
            &result(json!({
                "areas_of_disagreement": [{
                    "viewpoint_a": {"expert": "Investor", "position": "Too early"},
                    "resolution": "Show pilots"
                }]
            })),
        );
        let row = &view.disagreements[0];
        assert_eq!(row.topic, "Unknown topic");
        assert_eq!(row.viewpoints, vec![("Investor".to_string(), "Too early".to_string())]);
    }
}
