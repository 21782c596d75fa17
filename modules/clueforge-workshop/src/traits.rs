// Boundaries of the clue pipeline.
//
// GenerativeCollaborator: every model-backed stage (draft, polish, solve,
//   double-duty judge). LlmWorkshop is the gateway-backed implementation,
//   ScriptedWorkshop the test double.
// WordSupply: hands out (word, mechanism) pairs and owns the "already used
//   this run" bookkeeping. Implementations must make a draw atomic.

use async_trait::async_trait;

use clueforge_checks::DoubleDutyVerdict;
use clueforge_common::{
    ClueCandidate, Enumeration, Solution, SurfaceReading, WordplayComponents, WordplayMechanism,
};

use crate::error::CollaboratorError;

#[async_trait]
pub trait GenerativeCollaborator: Send + Sync {
    /// Machinery only, no surface. `feedback` carries what went wrong with
    /// the previous attempt, if any.
    async fn draft_wordplay(
        &self,
        answer: &str,
        mechanism: WordplayMechanism,
        enumeration: &Enumeration,
        feedback: Option<&str>,
    ) -> Result<WordplayComponents, CollaboratorError>;

    /// Turn validated wordplay into a clue that reads as English.
    async fn polish_surface(
        &self,
        candidate: &ClueCandidate,
    ) -> Result<SurfaceReading, CollaboratorError>;

    /// Blind solve: sees the surface and enumeration, nothing else.
    async fn solve(
        &self,
        surface: &str,
        enumeration: &Enumeration,
    ) -> Result<Solution, CollaboratorError>;

    /// Does any single word act as both definition and indicator?
    async fn judge_double_duty(
        &self,
        candidate: &ClueCandidate,
    ) -> Result<DoubleDutyVerdict, CollaboratorError>;
}

/// One draw from a [`WordSupply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draw {
    Word {
        word: String,
        mechanism: WordplayMechanism,
    },
    Exhausted,
}

#[async_trait]
pub trait WordSupply: Send + Sync {
    /// Next unused word, restricted to `mechanism` when given. A word handed
    /// out once is never handed out again in the same run.
    async fn next(&self, mechanism: Option<WordplayMechanism>) -> Draw;

    /// Record that `word` went into the pipeline.
    async fn mark_used(&self, word: &str);
}
