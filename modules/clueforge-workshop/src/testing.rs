// Test doubles for the clue pipeline.
//
// - ScriptedWorkshop (GenerativeCollaborator): per-stage queues of canned
//   replies. The last reply of a queue repeats forever.
// - VecSupply (WordSupply): a fixed list of words, or one word repeated
//   without end.
//
// Plus `silent_wordplay()` and friends for the SILENT anagram that passes
// every stage.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use clueforge_checks::DoubleDutyVerdict;
use clueforge_common::{
    ClueCandidate, Enumeration, Solution, SolverConfidence, SurfaceReading, WordplayComponents,
    WordplayMechanism,
};

use crate::error::CollaboratorError;
use crate::traits::{Draw, GenerativeCollaborator, WordSupply};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn silent_wordplay() -> WordplayComponents {
    WordplayComponents {
        fodder: "listen".into(),
        indicator: "confused".into(),
        mechanism_description: "anagram of listen".into(),
        definition_hint: Some("quiet".into()),
        ..Default::default()
    }
}

pub fn silent_surface() -> SurfaceReading {
    SurfaceReading {
        clue: "Confused listen for quiet (6)".into(),
        definition: "quiet".into(),
        explanation: Some("Anagram (confused) of LISTEN; definition 'quiet'".into()),
    }
}

pub fn solution(answer: &str) -> Solution {
    Solution {
        answer: answer.into(),
        confidence: SolverConfidence::High,
        reasoning: String::new(),
        definition_part: None,
        wordplay_part: None,
    }
}

// ---------------------------------------------------------------------------
// ScriptedWorkshop
// ---------------------------------------------------------------------------

struct Script<T> {
    steps: Mutex<VecDeque<Result<T, CollaboratorError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn push(&mut self, step: Result<T, CollaboratorError>) {
        match self.steps.get_mut() {
            Ok(steps) => steps.push_back(step),
            Err(poisoned) => poisoned.into_inner().push_back(step),
        }
    }

    async fn next(&self, stage: &str) -> Result<T, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        let mut steps = lock(&self.steps);
        if steps.len() > 1 {
            if let Some(step) = steps.pop_front() {
                return step;
            }
        }
        steps.front().cloned().unwrap_or_else(|| {
            Err(CollaboratorError::MalformedResponse(format!(
                "ScriptedWorkshop: nothing scripted for {stage}"
            )))
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Canned collaborator. Builder pattern: `.draft()`, `.surface()`,
/// `.answer()`, `.double_duty()`, plus `*_error()` and `*_delay()` variants.
pub struct ScriptedWorkshop {
    drafts: Script<WordplayComponents>,
    surfaces: Script<SurfaceReading>,
    solutions: Script<Solution>,
    verdicts: Script<DoubleDutyVerdict>,
    feedback_seen: Mutex<Vec<Option<String>>>,
}

impl Default for ScriptedWorkshop {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedWorkshop {
    pub fn new() -> Self {
        Self {
            drafts: Script::new(),
            surfaces: Script::new(),
            solutions: Script::new(),
            verdicts: Script::new(),
            feedback_seen: Mutex::new(Vec::new()),
        }
    }

    /// Every stage scripted to produce the SILENT anagram.
    pub fn silent() -> Self {
        Self::new()
            .draft(silent_wordplay())
            .surface(silent_surface())
            .answer("SILENT")
            .double_duty(DoubleDutyVerdict::pass("Definition and indicator are separate"))
    }

    /// SILENT scripted for every stage after drafting; queue drafts with
    /// `.draft()`.
    pub fn silent_after_draft() -> Self {
        Self::new()
            .surface(silent_surface())
            .answer("SILENT")
            .double_duty(DoubleDutyVerdict::pass("Definition and indicator are separate"))
    }

    pub fn draft(mut self, wordplay: WordplayComponents) -> Self {
        self.drafts.push(Ok(wordplay));
        self
    }

    pub fn draft_error(mut self, error: CollaboratorError) -> Self {
        self.drafts.push(Err(error));
        self
    }

    pub fn surface(mut self, reading: SurfaceReading) -> Self {
        self.surfaces.push(Ok(reading));
        self
    }

    pub fn surface_error(mut self, error: CollaboratorError) -> Self {
        self.surfaces.push(Err(error));
        self
    }

    pub fn answer(mut self, answer: &str) -> Self {
        self.solutions.push(Ok(solution(answer)));
        self
    }

    pub fn solve_error(mut self, error: CollaboratorError) -> Self {
        self.solutions.push(Err(error));
        self
    }

    /// Every solve sleeps this long before answering.
    pub fn solve_delay(mut self, delay: Duration) -> Self {
        self.solutions.delay = Some(delay);
        self
    }

    pub fn double_duty(mut self, verdict: DoubleDutyVerdict) -> Self {
        self.verdicts.push(Ok(verdict));
        self
    }

    pub fn double_duty_error(mut self, error: CollaboratorError) -> Self {
        self.verdicts.push(Err(error));
        self
    }

    pub fn draft_calls(&self) -> usize {
        self.drafts.calls()
    }

    pub fn polish_calls(&self) -> usize {
        self.surfaces.calls()
    }

    pub fn solve_calls(&self) -> usize {
        self.solutions.calls()
    }

    pub fn judge_calls(&self) -> usize {
        self.verdicts.calls()
    }

    /// Most solves sleeping at once. Only counted when a solve delay is set.
    pub fn peak_concurrent_solves(&self) -> usize {
        self.solutions.peak()
    }

    /// Feedback passed to each drafting call, in order.
    pub fn drafting_feedback(&self) -> Vec<Option<String>> {
        lock(&self.feedback_seen).clone()
    }
}

#[async_trait]
impl GenerativeCollaborator for ScriptedWorkshop {
    async fn draft_wordplay(
        &self,
        _answer: &str,
        _mechanism: WordplayMechanism,
        _enumeration: &Enumeration,
        feedback: Option<&str>,
    ) -> Result<WordplayComponents, CollaboratorError> {
        lock(&self.feedback_seen).push(feedback.map(str::to_string));
        self.drafts.next("draft_wordplay").await
    }

    async fn polish_surface(
        &self,
        _candidate: &ClueCandidate,
    ) -> Result<SurfaceReading, CollaboratorError> {
        self.surfaces.next("polish_surface").await
    }

    async fn solve(
        &self,
        _surface: &str,
        _enumeration: &Enumeration,
    ) -> Result<Solution, CollaboratorError> {
        self.solutions.next("solve").await
    }

    async fn judge_double_duty(
        &self,
        _candidate: &ClueCandidate,
    ) -> Result<DoubleDutyVerdict, CollaboratorError> {
        self.verdicts.next("judge_double_duty").await
    }
}

// ---------------------------------------------------------------------------
// VecSupply
// ---------------------------------------------------------------------------

enum Source {
    Finite(VecDeque<(String, WordplayMechanism)>),
    Repeat(String, WordplayMechanism),
}

/// In-memory word supply that records every draw and every `mark_used`.
pub struct VecSupply {
    source: Mutex<Source>,
    draws: AtomicUsize,
    used: Mutex<Vec<String>>,
}

impl VecSupply {
    pub fn new<S: Into<String>>(words: impl IntoIterator<Item = (S, WordplayMechanism)>) -> Self {
        let words = words.into_iter().map(|(w, m)| (w.into(), m)).collect();
        Self::with_source(Source::Finite(words))
    }

    /// Never runs dry.
    pub fn repeating(word: &str, mechanism: WordplayMechanism) -> Self {
        Self::with_source(Source::Repeat(word.to_string(), mechanism))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source: Mutex::new(source),
            draws: AtomicUsize::new(0),
            used: Mutex::new(Vec::new()),
        }
    }

    pub fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    pub fn used(&self) -> Vec<String> {
        lock(&self.used).clone()
    }
}

#[async_trait]
impl WordSupply for VecSupply {
    async fn next(&self, mechanism: Option<WordplayMechanism>) -> Draw {
        let mut source = lock(&self.source);
        let drawn = match &mut *source {
            Source::Repeat(word, m) => {
                (mechanism.is_none() || mechanism == Some(*m)).then(|| (word.clone(), *m))
            }
            Source::Finite(words) => words
                .iter()
                .position(|(_, m)| mechanism.is_none() || mechanism == Some(*m))
                .and_then(|i| words.remove(i)),
        };
        match drawn {
            Some((word, mechanism)) => {
                self.draws.fetch_add(1, Ordering::SeqCst);
                Draw::Word { word, mechanism }
            }
            None => Draw::Exhausted,
        }
    }

    async fn mark_used(&self, word: &str) {
        lock(&self.used).push(word.to_string());
    }
}
