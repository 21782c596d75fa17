use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enumeration::Enumeration;
use crate::error::ClueError;
use crate::normalize::letters_only;

// --- Mechanisms ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WordplayMechanism {
    Anagram,
    HiddenWord,
    Charade,
    Container,
    Reversal,
    Homophone,
    DoubleDefinition,
    AllInOne,
}

impl WordplayMechanism {
    pub const ALL: [WordplayMechanism; 8] = [
        WordplayMechanism::Anagram,
        WordplayMechanism::HiddenWord,
        WordplayMechanism::Charade,
        WordplayMechanism::Container,
        WordplayMechanism::Reversal,
        WordplayMechanism::Homophone,
        WordplayMechanism::DoubleDefinition,
        WordplayMechanism::AllInOne,
    ];

    /// Sound-alikes, double definitions and &lits cannot be disproved by
    /// string operations.
    pub fn requires_semantic_check(self) -> bool {
        matches!(
            self,
            WordplayMechanism::Homophone
                | WordplayMechanism::DoubleDefinition
                | WordplayMechanism::AllInOne
        )
    }

    pub fn slug(self) -> &'static str {
        match self {
            WordplayMechanism::Anagram => "anagram",
            WordplayMechanism::HiddenWord => "hidden_word",
            WordplayMechanism::Charade => "charade",
            WordplayMechanism::Container => "container",
            WordplayMechanism::Reversal => "reversal",
            WordplayMechanism::Homophone => "homophone",
            WordplayMechanism::DoubleDefinition => "double_definition",
            WordplayMechanism::AllInOne => "all_in_one",
        }
    }
}

impl fmt::Display for WordplayMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordplayMechanism::Anagram => write!(f, "Anagram"),
            WordplayMechanism::HiddenWord => write!(f, "Hidden Word"),
            WordplayMechanism::Charade => write!(f, "Charade"),
            WordplayMechanism::Container => write!(f, "Container"),
            WordplayMechanism::Reversal => write!(f, "Reversal"),
            WordplayMechanism::Homophone => write!(f, "Homophone"),
            WordplayMechanism::DoubleDefinition => write!(f, "Double Definition"),
            WordplayMechanism::AllInOne => write!(f, "&lit"),
        }
    }
}

impl FromStr for WordplayMechanism {
    type Err = ClueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '&')
            .collect();
        match key.as_str() {
            "anagram" => Ok(Self::Anagram),
            "hiddenword" | "hidden" => Ok(Self::HiddenWord),
            "charade" => Ok(Self::Charade),
            "container" | "insertion" => Ok(Self::Container),
            "reversal" => Ok(Self::Reversal),
            "homophone" => Ok(Self::Homophone),
            "doubledefinition" | "doubledef" => Ok(Self::DoubleDefinition),
            "allinone" | "&lit" | "andlit" => Ok(Self::AllInOne),
            _ => Err(ClueError::MalformedInput(format!("unknown mechanism {s:?}"))),
        }
    }
}

// --- Wordplay ---

/// The machinery of a clue as drafted by the setter.
///
/// `fodder` must appear character-for-character in the surface; it is never
/// a synonym of something that does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WordplayComponents {
    /// Raw material the wordplay manipulates.
    pub fodder: String,
    /// Word or phrase signalling the mechanism.
    pub indicator: String,
    /// One-line account of how fodder becomes answer.
    pub mechanism_description: String,
    /// Container: the word that goes around.
    #[serde(default)]
    pub outer: Option<String>,
    /// Container: the word that goes inside.
    #[serde(default)]
    pub inner: Option<String>,
    /// Charade: pieces in order.
    #[serde(default)]
    pub parts: Vec<String>,
    /// Suggested definition for the surface writer.
    #[serde(default)]
    pub definition_hint: Option<String>,
}

/// A polished surface as returned by the surface writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurfaceReading {
    /// The clue text, enumeration optional.
    pub clue: String,
    /// The exact span of `clue` that defines the answer.
    pub definition: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SolverConfidence {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

/// What a blind solver made of a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Solution {
    pub answer: String,
    #[serde(default)]
    pub confidence: SolverConfidence,
    #[serde(default)]
    pub reasoning: String,
    /// The span the solver read as the definition.
    #[serde(default)]
    pub definition_part: Option<String>,
    /// The span the solver read as wordplay.
    #[serde(default)]
    pub wordplay_part: Option<String>,
}

// --- Candidate ---

/// One (answer, mechanism) pairing moving through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ClueCandidate {
    /// Uppercase letters only.
    pub target_answer: String,
    pub mechanism: WordplayMechanism,
    pub enumeration: Enumeration,
    pub wordplay: WordplayComponents,
    pub surface_text: String,
    pub definition_span: String,
}

impl ClueCandidate {
    /// Build a candidate from an answer as written (`"ICE CREAM"`,
    /// `"well-to-do"`), deriving the enumeration from its word breaks.
    pub fn new(word: &str, mechanism: WordplayMechanism) -> Result<Self, ClueError> {
        let enumeration = Enumeration::from_answer(word)?;
        Ok(Self::assemble(letters_only(word), mechanism, enumeration))
    }

    /// Build a candidate with an explicit enumeration. A count that disagrees
    /// with the answer is allowed here and caught by the length check.
    pub fn with_enumeration(
        word: &str,
        mechanism: WordplayMechanism,
        enumeration: &str,
    ) -> Result<Self, ClueError> {
        // Reject non-letter junk in the answer the same way `new` does.
        Enumeration::from_answer(word)?;
        let enumeration: Enumeration = enumeration.parse()?;
        Ok(Self::assemble(letters_only(word), mechanism, enumeration))
    }

    fn assemble(target_answer: String, mechanism: WordplayMechanism, enumeration: Enumeration) -> Self {
        Self {
            target_answer,
            mechanism,
            enumeration,
            wordplay: WordplayComponents::default(),
            surface_text: String::new(),
            definition_span: String::new(),
        }
    }

    pub fn with_wordplay(mut self, wordplay: WordplayComponents) -> Self {
        self.wordplay = wordplay;
        self
    }

    pub fn with_surface(mut self, surface: impl Into<String>, definition: impl Into<String>) -> Self {
        self.surface_text = surface.into();
        self.definition_span = definition.into();
        self
    }

    /// Surface text, with the enumeration appended if the writer left it off.
    pub fn clue_with_enumeration(&self) -> String {
        let enumeration = self.enumeration.to_string();
        let surface = self.surface_text.trim();
        if surface.ends_with(&enumeration) {
            surface.to_string()
        } else {
            format!("{surface} {enumeration}")
        }
    }
}

// --- Outcomes ---

/// A named, explained pass/fail from a mechanical check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub check_name: String,
    pub is_valid: bool,
    pub message: String,
    #[serde(default)]
    pub requires_semantic_check: bool,
}

impl ValidationOutcome {
    pub fn pass(check_name: &str, message: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            is_valid: true,
            message: message.into(),
            requires_semantic_check: false,
        }
    }

    pub fn fail(check_name: &str, message: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            is_valid: false,
            message: message.into(),
            requires_semantic_check: false,
        }
    }

    pub fn semantic(check_name: &str, message: impl Into<String>) -> Self {
        Self {
            requires_semantic_check: true,
            ..Self::pass(check_name, message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    /// Soft warning: reported, but does not fail the clue.
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn passed(self) -> bool {
        !matches!(self, CheckStatus::Fail)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Warn => write!(f, "WARN"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCheckKind {
    Direction,
    DoubleDuty,
    IndicatorFairness,
    Identity,
    FodderPresence,
    FillerBudget,
    IndicatorGrammar,
    NarrativeIntegrity,
    Obscurity,
    WordValidity,
}

impl AuditCheckKind {
    /// Fixed report order.
    pub const ALL: [AuditCheckKind; 10] = [
        AuditCheckKind::Direction,
        AuditCheckKind::DoubleDuty,
        AuditCheckKind::IndicatorFairness,
        AuditCheckKind::Identity,
        AuditCheckKind::FodderPresence,
        AuditCheckKind::FillerBudget,
        AuditCheckKind::IndicatorGrammar,
        AuditCheckKind::NarrativeIntegrity,
        AuditCheckKind::Obscurity,
        AuditCheckKind::WordValidity,
    ];
}

impl fmt::Display for AuditCheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditCheckKind::Direction => "direction",
            AuditCheckKind::DoubleDuty => "double-duty",
            AuditCheckKind::IndicatorFairness => "indicator-fairness",
            AuditCheckKind::Identity => "identity",
            AuditCheckKind::FodderPresence => "fodder-presence",
            AuditCheckKind::FillerBudget => "filler-budget",
            AuditCheckKind::IndicatorGrammar => "indicator-grammar",
            AuditCheckKind::NarrativeIntegrity => "narrative-integrity",
            AuditCheckKind::Obscurity => "obscurity",
            AuditCheckKind::WordValidity => "word-validity",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditCheck {
    pub kind: AuditCheckKind,
    pub status: CheckStatus,
    pub feedback: String,
}

/// Fairness audit of one finished clue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    /// One entry per [`AuditCheckKind`], in [`AuditCheckKind::ALL`] order.
    pub checks: Vec<AuditCheck>,
    /// Passed (or warned) checks over total checks.
    pub fairness_score: f64,
    /// 0.0 to 1.0.
    pub technical_compliance: f64,
    /// 1 to 5.
    pub difficulty_level: u8,
    /// 0 to 105; the top five points are a brevity bonus.
    pub narrative_naturalness: u8,
}

impl AuditResult {
    /// No check failed outright. Warnings are allowed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status.passed())
    }

    pub fn check(&self, kind: AuditCheckKind) -> Option<&AuditCheck> {
        self.checks.iter().find(|c| c.kind == kind)
    }

    pub fn status(&self, kind: AuditCheckKind) -> Option<CheckStatus> {
        self.check(kind).map(|c| c.status)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &AuditCheck> {
        self.checks.iter().filter(|c| !c.status.passed())
    }

    /// Failed checks as one block of feedback for the next drafting attempt.
    pub fn feedback_summary(&self) -> String {
        self.failed_checks()
            .map(|c| format!("{}: {}", c.kind, c.feedback))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// --- Lifecycle ---

/// Named states of one candidate's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    DraftingWordplay,
    ValidatingMechanics,
    PolishingSurface,
    Solving,
    Judging,
    Auditing,
    TerminalPass,
    TerminalFail,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::TerminalPass | LifecycleState::TerminalFail)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::DraftingWordplay => write!(f, "DRAFTING_WORDPLAY"),
            LifecycleState::ValidatingMechanics => write!(f, "VALIDATING_MECHANICS"),
            LifecycleState::PolishingSurface => write!(f, "POLISHING_SURFACE"),
            LifecycleState::Solving => write!(f, "SOLVING"),
            LifecycleState::Judging => write!(f, "JUDGING"),
            LifecycleState::Auditing => write!(f, "AUDITING"),
            LifecycleState::TerminalPass => write!(f, "TERMINAL_PASS"),
            LifecycleState::TerminalFail => write!(f, "TERMINAL_FAIL"),
        }
    }
}

/// One entry in a candidate's diagnostic trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageEvent {
    Drafted {
        attempt: u32,
        mechanical_attempt: u32,
    },
    MechanicalRejected {
        mechanical_attempt: u32,
        feedback: String,
    },
    HiddenWordPrecheckFailed {
        feedback: String,
    },
    MechanicalAccepted {
        mechanical_attempt: u32,
    },
    CollaboratorFailed {
        state: LifecycleState,
        error: String,
    },
    Polished {
        surface: String,
    },
    SurfaceRejected {
        feedback: String,
    },
    Solved {
        answer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        definition_part: Option<String>,
    },
    Judged {
        passed: bool,
        similarity: f64,
        feedback: String,
    },
    Audited {
        passed: bool,
        fairness_score: f64,
        failed_checks: Vec<AuditCheckKind>,
    },
    Regenerating {
        feedback: String,
    },
}

/// The stage that sank a failed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Wordplay never produced the answer.
    Mechanical,
    /// Surface broke a guard (answer visible, definition missing, ...).
    Surface,
    /// Blind solver disagreed with the answer.
    Solver,
    /// Fairness audit failed.
    Audit,
    /// Model call failed or timed out.
    Collaborator,
}

/// Extra fields carried by a passed clue for publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub clue_id: String,
    /// Surface with enumeration.
    pub clue: String,
    /// Letter count of the answer.
    pub length: usize,
    /// Order in which a front end reveals letters, a permutation of 0..length.
    pub reveal_order: Vec<usize>,
}

/// Terminal record of one candidate. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub word: String,
    pub mechanism: WordplayMechanism,
    pub enumeration: String,
    pub passed: bool,
    pub surface_text: String,
    pub definition: String,
    pub wordplay: Option<WordplayComponents>,
    pub mechanical_valid: bool,
    pub mechanical_outcomes: Vec<ValidationOutcome>,
    pub solver_answer: Option<String>,
    pub referee_similarity: Option<f64>,
    pub audit: Option<AuditResult>,
    pub regeneration_attempts: u32,
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication: Option<Publication>,
    pub trail: Vec<StageEvent>,
}
