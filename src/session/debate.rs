// Analysis results for one slide
//
// Normalized shape of the analysis service's `/analyze` answer. Every nested
// field is optional (or an empty list) so consumers must handle absence.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

/// Everything the service produced for one slide
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateResult {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub debate_round: Option<DebateRound>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub collaborative_debate: Option<CollaborativeDebate>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<Synthesis>,
    /// Prompt-cache diagnostics; opaque to this crate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_stats: Option<Value>,
}

impl DebateResult {
    /// Normalize a raw `/analyze` answer. Non-objects yield an empty result.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            tracing::warn!("Analyze response is not a JSON object; treating it as empty");
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!("Could not normalize analyze response: {}", e);
            Self::default()
        })
    }

    /// Per-persona critiques, empty when the round is missing
    pub fn debates(&self) -> &[PersonaDebate] {
        self.debate_round
            .as_ref()
            .map(|round| round.debates.as_slice())
            .unwrap_or(&[])
    }

    /// The consensus block, if the collaborative round produced one
    pub fn unified_feedback(&self) -> Option<&UnifiedFeedback> {
        self.consensus()?.unified_feedback.as_ref()
    }

    pub fn consensus(&self) -> Option<&DebateConsensus> {
        self.collaborative_debate
            .as_ref()?
            .collaborative_debate
            .as_ref()
    }

    /// Scores of every critique that has one
    pub fn critique_scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.debates().iter().filter_map(PersonaDebate::score)
    }
}

/// Round of individual critiques, one per selected persona
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateRound {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub slide_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub slide_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub debates: Vec<PersonaDebate>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_stats: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaDebate {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub persona_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Absent when the persona's answer could not be parsed; see `raw_response`
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub critique: Option<Critique>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PersonaDebate {
    /// Score of a usable critique: no error and a numeric overall score
    pub fn score(&self) -> Option<f64> {
        if self.error.is_some() {
            return None;
        }
        self.critique.as_ref()?.overall_score
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    #[serde(default, deserialize_with = "lenient::score", skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub key_strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub critical_issues: Vec<CritiqueIssue>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub questions_to_answer: Vec<String>,
}

impl Critique {
    /// Nothing structured came back (the view falls back to the raw response)
    pub fn is_unstructured(&self) -> bool {
        self.key_strengths.is_empty() && self.critical_issues.is_empty()
    }
}

/// Issue raised by a persona: free text or a structured entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CritiqueIssue {
    Text(String),
    Detailed(IssueDetail),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueDetail {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl CritiqueIssue {
    pub fn summary(&self) -> &str {
        match self {
            CritiqueIssue::Text(text) => text,
            CritiqueIssue::Detailed(detail) => detail.issue.as_deref().unwrap_or("Unknown issue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recommendation {
    Text(String),
    Detailed(RecommendationDetail),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDetail {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Recommendation {
    pub fn summary(&self) -> &str {
        match self {
            Recommendation::Text(text) => text,
            Recommendation::Detailed(detail) => detail.action.as_deref().unwrap_or("Unknown"),
        }
    }
}

/// Output of the collaborative (cross-persona) round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollaborativeDebate {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub collaborative_debate: Option<DebateConsensus>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub raw_debate: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub participating_experts: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateConsensus {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub unified_feedback: Option<UnifiedFeedback>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub debate_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub debate_transcript: Vec<TranscriptEntry>,
}

/// One turn of the experts' conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub persona_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl TranscriptEntry {
    pub fn speaker_name(&self) -> &str {
        self.speaker
            .as_deref()
            .or(self.persona_name.as_deref())
            .unwrap_or("Expert")
    }

    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.content.as_deref())
            .unwrap_or_default()
    }
}

/// Consensus across personas for one slide
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedFeedback {
    #[serde(default, deserialize_with = "lenient::score", skip_serializing_if = "Option::is_none")]
    pub overall_consensus_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub areas_of_agreement: Vec<Agreement>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub areas_of_disagreement: Vec<Disagreement>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub priority_actions: Vec<PriorityAction>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub questions_for_client: Vec<ClientQuestion>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub strengths_to_maintain: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub deal_breakers: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub recommended_next_steps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub point: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub supporting_experts: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Disagreement {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub viewpoint_a: Option<Viewpoint>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub viewpoint_b: Option<Viewpoint>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub expert: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityAction {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub estimated_effort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientQuestion {
    Text(String),
    Detailed(ClientQuestionDetail),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientQuestionDetail {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub why_important: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub asked_by: Vec<String>,
}

impl ClientQuestion {
    pub fn question(&self) -> &str {
        match self {
            ClientQuestion::Text(text) => text,
            ClientQuestion::Detailed(detail) => detail.question.as_deref().unwrap_or_default(),
        }
    }
}

/// Prioritized fixes and a rewritten slide
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    #[serde(default, deserialize_with = "lenient::score", skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub consensus_issues: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub technical_concerns: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub business_concerns: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub ethical_concerns: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub priority_fixes: Vec<PriorityFix>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub improved_slide_content: Option<ImprovedSlide>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub questions_investors_will_ask: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub strengths_to_emphasize: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityFix {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImprovedSlide {
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub key_points: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt", skip_serializing_if = "Option::is_none")]
    pub speaker_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_upstream_answer() {
        let result = DebateResult::from_value(json!({
            "debate_round": {"debates": [{"persona_id": "ai_architect", "critique": {"overall_score": 8}}]}
        }));
        assert_eq!(result.debates().len(), 1);
        assert_eq!(result.debates()[0].score(), Some(8.0));
        assert!(result.collaborative_debate.is_none());
        assert!(result.synthesis.is_none());
        assert!(result.unified_feedback().is_none());
    }

    #[test]
    fn test_non_object_answer_is_empty() {
        let result = DebateResult::from_value(json!("internal error"));
        assert_eq!(result, DebateResult::default());
        assert!(result.debates().is_empty());
    }

    #[test]
    fn test_raw_text_critique_falls_back_to_raw_response() {
        let result = DebateResult::from_value(json!({
            "debate_round": {"debates": [{
                "persona_id": "ai_investor",
                "critique": "The market sizing is hand-wavy.",
                "raw_response": "The market sizing is hand-wavy."
            }]}
        }));
        let debate = &result.debates()[0];
        assert!(debate.critique.is_none());
        assert_eq!(debate.score(), None);
        assert_eq!(debate.raw_response.as_deref(), Some("The market sizing is hand-wavy."));
    }

    #[test]
    fn test_errored_critique_has_no_score() {
        let debate: PersonaDebate = serde_json::from_value(json!({
            "persona_id": "mlops_engineer",
            "critique": {"overall_score": 3},
            "error": "rate limited"
        }))
        .unwrap();
        assert_eq!(debate.score(), None);
    }

    #[test]
    fn test_mixed_issue_and_recommendation_shapes() {
        let critique: Critique = serde_json::from_value(json!({
            "overall_score": "6",
            "critical_issues": [
                "No latency numbers",
                {"severity": "Critical", "issue": "Cold start unaddressed", "reasoning": "No data"},
                {"severity": "Minor"}
            ],
            "recommendations": [{"priority": "High", "action": "Add benchmarks"}, "Cut jargon"]
        }))
        .unwrap();
        assert_eq!(critique.overall_score, Some(6.0));
        let issues: Vec<&str> = critique.critical_issues.iter().map(CritiqueIssue::summary).collect();
        assert_eq!(issues, vec!["No latency numbers", "Cold start unaddressed", "Unknown issue"]);
        let recs: Vec<&str> = critique.recommendations.iter().map(Recommendation::summary).collect();
        assert_eq!(recs, vec!["Add benchmarks", "Cut jargon"]);
    }

    #[test]
    fn test_unified_feedback_path() {
        let result = DebateResult::from_value(json!({
            "collaborative_debate": {
                "collaborative_debate": {
                    "unified_feedback": {
                        "overall_consensus_score": 6,
                        "deal_breakers": ["No moat"],
                        "questions_for_client": ["Who labels data?", {"question": "Unit economics?", "asked_by": ["Jennifer Wu"]}]
                    },
                    "debate_summary": "Experts split on defensibility.",
                    "debate_transcript": [{"persona_name": "Alex Kim", "content": "Where is the moat?"}]
                },
                "participating_experts": 3
            }
        }));
        let unified = result.unified_feedback().unwrap();
        assert_eq!(unified.overall_consensus_score, Some(6.0));
        assert_eq!(unified.deal_breakers, vec!["No moat"]);
        assert_eq!(unified.questions_for_client[1].question(), "Unit economics?");

        let consensus = result.consensus().unwrap();
        assert_eq!(consensus.debate_transcript[0].speaker_name(), "Alex Kim");
        assert_eq!(consensus.debate_transcript[0].text(), "Where is the moat?");
    }

    #[test]
    fn test_malformed_subtree_does_not_poison_siblings() {
        let result = DebateResult::from_value(json!({
            "debate_round": "timed out",
            "synthesis": {"overall_score": 7, "priority_fixes": [{"severity": "Major", "fix": "Show retention"}]}
        }));
        assert!(result.debate_round.is_none());
        let synthesis = result.synthesis.unwrap();
        assert_eq!(synthesis.overall_score, Some(7.0));
        assert_eq!(synthesis.priority_fixes[0].fix.as_deref(), Some("Show retention"));
    }
}
