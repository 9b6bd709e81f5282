// View-models
// Read-only projections of the session store for the consensus, critique
// and results panels. Display impls give the CLI its plain-text rendering.

mod consensus;
mod critique;
mod results;

pub use consensus::{
    ActionPriority, ActionRow, AgreementRow, ConsensusBand, ConsensusView, DisagreementRow,
    QuestionRow, TranscriptLine,
};
pub use critique::{CritiqueRow, CritiqueView, IssueRow, RecommendationRow};
pub use results::{FixRow, ResultsView, ScoreBand, ScoreDistribution, SlideResult};
