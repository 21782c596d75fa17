// Gateway-backed GenerativeCollaborator.
//
// Two model tiers: `logic` drafts wordplay, solves blind and judges double
// duty; `surface` writes the clue text. Every reply is parsed with
// `extract_json`, so prose around the JSON or a fenced block is tolerated.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use ai_client::{extract_json, ChatModel, Completion, StructuredOutput};
use clueforge_checks::DoubleDutyVerdict;
use clueforge_common::{
    letters_only, ClueCandidate, Enumeration, Solution, SurfaceReading, WordplayComponents,
    WordplayMechanism,
};

use crate::error::CollaboratorError;
use crate::traits::GenerativeCollaborator;

const DRAFT_MAX_TOKENS: u32 = 400;
const SURFACE_MAX_TOKENS: u32 = 300;
const SOLVE_MAX_TOKENS: u32 = 400;
const JUDGE_MAX_TOKENS: u32 = 200;

// =============================================================================
// Prompts
// =============================================================================

const DRAFT_SYSTEM: &str = "\
You are a Ximenean cryptic crossword wordplay generator. Produce ONLY the \
mechanical wordplay for the answer you are given, not a finished clue.

Rules:
- The fodder is copied into the clue character for character. Never use a \
synonym as fodder.
- Every fodder word must be a real English word. No letter strings, no \
invented abbreviations.
- The answer, or the answer plus S, ED or ING, must not appear in the fodder.
- Anagram: the fodder has exactly the letters of the answer.
- Hidden word: the answer runs consecutively across at least two fodder \
words. Mark it with brackets in the mechanism, e.g. 'r[ADIO ORTA]rio'.
- Charade: list the pieces in `parts`; they concatenate to the answer.
- Container: `outer` wraps `inner` to make the answer; both are real words.
- Reversal: the fodder, read backwards, is the answer.
- Use horizontal indicators only; never 'up', 'rising', 'over' or 'on'.

Examples:
Anagram: fodder 'dirty room', indicator 'confused' -> DORMITORY.
Reversal: fodder 'lager', indicator 'returned' -> REGAL.
Container: outer 'PAT', inner 'IN', indicator 'grips' -> PAINT.";

const SURFACE_SYSTEM: &str = "\
You are a Ximenean cryptic crossword surface writer. You receive validated \
wordplay and write one economical, deceptive clue.

Rules:
- Start from definition + fodder + indicator. Add a word only if the \
sentence needs it to read naturally; at most two link words.
- Use the fodder exactly as given. Never substitute a synonym.
- The definition must be a synonym of the answer, and must appear verbatim \
in the clue. It must not be the fodder.
- Never write the answer itself anywhere in the clue.
- No standalone letters or fragments; mask single letters with standard \
abbreviations (one = I, north = N, king = K).
- No directional indicators ('up', 'rising', 'over', 'on').
- The surface must read as a plausible English sentence, not a listing.";

const SOLVE_SYSTEM: &str = "\
You are an expert cryptic crossword solver. Work step by step:
0. Look for a hidden word first: consecutive letters spanning words that fit \
the enumeration exactly.
1. Find the definition, usually at the start or end.
2. Find the indicators and the wordplay.
3. Work the wordplay and check the answer is a synonym of the definition.
Answer in JSON only, with reasoning of at most 50 words.";

const JUDGE_SYSTEM: &str = "\
You are a strict but fair Ximenean auditor checking for double duty. Double \
duty happens ONLY when the same single word is both the wordplay indicator \
and the whole definition. A definition that is merely a synonym of the \
answer is NOT double duty.

Examples:
PASS: 'Serenity in pieces (5)': 'serenity' defines, 'in pieces' indicates.
PASS: 'Confused enlist soldiers to be quiet (6)': 'confused' indicates, \
'be quiet' defines.
FAIL: 'Shredded lettuce': 'shredded' indicates the anagram and defines 'torn'.";

fn draft_prompt(
    answer: &str,
    mechanism: WordplayMechanism,
    enumeration: &Enumeration,
    feedback: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Generate the wordplay components for the answer \"{answer}\" {enumeration} \
         using the mechanism \"{mechanism}\".\n\
         Check every letter of {answer} against your fodder before you reply."
    );
    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\n\nPREVIOUS ATTEMPT FAILED:\n{feedback}\n\nCorrect this in your new attempt."
        ));
    }
    prompt
}

fn surface_prompt(candidate: &ClueCandidate) -> String {
    let wordplay = &candidate.wordplay;
    let hint = wordplay.definition_hint.as_deref().unwrap_or("");
    let mut prompt = format!(
        "Write a complete cryptic clue from these VALIDATED components.\n\n\
         Answer: {answer}\n\
         Enumeration: {enumeration}\n\
         Mechanism: {mechanism}\n\
         Fodder: {fodder}\n\
         Indicator: {indicator}\n\
         How it works: {description}\n\
         Definition hint: {hint}\n",
        answer = candidate.target_answer,
        enumeration = candidate.enumeration,
        mechanism = candidate.mechanism,
        fodder = wordplay.fodder,
        indicator = wordplay.indicator,
        description = wordplay.mechanism_description,
    );
    if !wordplay.parts.is_empty() {
        prompt.push_str(&format!("Parts: {}\n", wordplay.parts.join(" + ")));
    }
    if let (Some(outer), Some(inner)) = (&wordplay.outer, &wordplay.inner) {
        prompt.push_str(&format!("Outer: {outer}\nInner: {inner}\n"));
    }
    prompt.push_str(&format!(
        "\nUse the exact fodder '{}'. Do not write '{}' anywhere in the clue. \
         Return the clue, the exact definition span, and a short explanation.",
        wordplay.fodder, candidate.target_answer
    ));
    prompt
}

fn solve_prompt(surface: &str, enumeration: &Enumeration) -> String {
    format!(
        "Solve this cryptic crossword clue.\n\n\
         Clue: \"{surface}\"\n\
         Enumeration: {enumeration}\n\n\
         The answer must be a synonym of the definition, not a rearrangement of \
         the fodder that happens to fit."
    )
}

fn judge_prompt(candidate: &ClueCandidate) -> String {
    format!(
        "CLUE: \"{clue}\"\n\
         DEFINITION: \"{definition}\"\n\
         FODDER: \"{fodder}\"\n\
         INDICATOR: \"{indicator}\"\n\
         MECHANISM: \"{description}\"\n\n\
         Is any single word both the indicator and the definition?",
        clue = candidate.surface_text,
        definition = candidate.definition_span,
        fodder = candidate.wordplay.fodder,
        indicator = candidate.wordplay.indicator,
        description = candidate.wordplay.mechanism_description,
    )
}

// =============================================================================
// Response shapes
// =============================================================================

/// Blind solver reply.
#[derive(Debug, Deserialize, JsonSchema)]
struct SolverReply {
    /// Step-by-step explanation, at most 50 words.
    reasoning: String,
    /// The part of the clue that is the straight definition.
    #[serde(default)]
    definition_part: String,
    /// The part that holds the wordplay.
    #[serde(default)]
    wordplay_part: String,
    /// The answer in capitals.
    answer: String,
    /// High, Medium or Low.
    confidence: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
enum DutyCall {
    Pass,
    Fail,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DoubleDutyReply {
    verdict: DutyCall,
    /// One or two sentences.
    explanation: String,
}

// =============================================================================
// LlmWorkshop
// =============================================================================

pub struct LlmWorkshop {
    logic: Arc<dyn ChatModel>,
    surface: Arc<dyn ChatModel>,
    temperature: f32,
}

impl LlmWorkshop {
    pub fn new(logic: Arc<dyn ChatModel>, surface: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self {
            logic,
            surface,
            temperature,
        }
    }

    /// One model for every stage.
    pub fn single(model: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self::new(model.clone(), model, temperature)
    }

    async fn ask<T: StructuredOutput>(
        &self,
        model: &dyn ChatModel,
        system: &str,
        user: String,
        max_tokens: u32,
    ) -> Result<T, CollaboratorError> {
        let request = Completion::new(system, user)
            .temperature(self.temperature)
            .max_tokens(max_tokens)
            .schema(T::type_name(), T::strict_schema());
        let text = model.complete(request).await?;
        debug!(model = model.model(), reply_len = text.len(), "Structured reply received");
        Ok(extract_json(&text)?)
    }
}

#[async_trait]
impl GenerativeCollaborator for LlmWorkshop {
    async fn draft_wordplay(
        &self,
        answer: &str,
        mechanism: WordplayMechanism,
        enumeration: &Enumeration,
        feedback: Option<&str>,
    ) -> Result<WordplayComponents, CollaboratorError> {
        let prompt = draft_prompt(answer, mechanism, enumeration, feedback);
        self.ask(self.logic.as_ref(), DRAFT_SYSTEM, prompt, DRAFT_MAX_TOKENS)
            .await
    }

    async fn polish_surface(
        &self,
        candidate: &ClueCandidate,
    ) -> Result<SurfaceReading, CollaboratorError> {
        let reading: SurfaceReading = self
            .ask(
                self.surface.as_ref(),
                SURFACE_SYSTEM,
                surface_prompt(candidate),
                SURFACE_MAX_TOKENS,
            )
            .await?;
        if reading.clue.trim().is_empty() {
            return Err(CollaboratorError::MalformedResponse(
                "surface writer returned an empty clue".into(),
            ));
        }
        Ok(reading)
    }

    async fn solve(
        &self,
        surface: &str,
        enumeration: &Enumeration,
    ) -> Result<Solution, CollaboratorError> {
        let reply: SolverReply = self
            .ask(
                self.logic.as_ref(),
                SOLVE_SYSTEM,
                solve_prompt(surface, enumeration),
                SOLVE_MAX_TOKENS,
            )
            .await?;
        debug!(
            answer = reply.answer.as_str(),
            "Solver reasoning: {}",
            reply.reasoning
        );
        let span = |s: String| {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        };
        Ok(Solution {
            answer: letters_only(&reply.answer),
            confidence: serde_json::from_value(serde_json::Value::String(
                reply.confidence.to_lowercase(),
            ))
            .unwrap_or_default(),
            reasoning: reply.reasoning,
            definition_part: span(reply.definition_part),
            wordplay_part: span(reply.wordplay_part),
        })
    }

    async fn judge_double_duty(
        &self,
        candidate: &ClueCandidate,
    ) -> Result<DoubleDutyVerdict, CollaboratorError> {
        let reply: DoubleDutyReply = self
            .ask(
                self.logic.as_ref(),
                JUDGE_SYSTEM,
                judge_prompt(candidate),
                JUDGE_MAX_TOKENS,
            )
            .await?;
        Ok(match reply.verdict {
            DutyCall::Pass => DoubleDutyVerdict::pass(reply.explanation),
            DutyCall::Fail => DoubleDutyVerdict::fail(reply.explanation),
        })
    }
}
