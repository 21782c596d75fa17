//! One candidate's run from drafted wordplay to a terminal verdict.
//!
//! Each state is a method that does its work and names the next state. The
//! two budgets live on [`Run`] and are only touched by [`ClueLifecycle::draft`]
//! (mechanical attempts) and [`ClueLifecycle::reject`] (regenerations), so no
//! path can loop past them.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use clueforge_checks::{
    all_valid, check_surface, feedback_for, hidden_word_precheck, validate, Referee, RuleAuditor,
};
use clueforge_common::{
    AuditResult, ClueCandidate, ClueError, FailureKind, LifecycleState, PipelinePolicy,
    PipelineResult, StageEvent, ValidationOutcome, WordplayComponents, WordplayMechanism,
};

use crate::error::CollaboratorError;
use crate::publication::publish;
use crate::traits::GenerativeCollaborator;

/// Whether the lifecycle may move from `from` to `to`.
pub fn transition_allowed(from: LifecycleState, to: LifecycleState) -> bool {
    use LifecycleState::*;
    matches!(
        (from, to),
        (DraftingWordplay, DraftingWordplay | ValidatingMechanics | TerminalFail)
            | (ValidatingMechanics, DraftingWordplay | PolishingSurface | TerminalFail)
            | (PolishingSurface, Solving | DraftingWordplay | TerminalFail)
            | (Solving, Judging | DraftingWordplay | TerminalFail)
            | (Judging, Auditing | DraftingWordplay | TerminalFail)
            | (Auditing, TerminalPass | DraftingWordplay | TerminalFail)
    )
}

/// Mutable bookkeeping for a single candidate. Never shared between tasks.
struct Run {
    candidate: ClueCandidate,
    state: LifecycleState,
    /// Full-pipeline regenerations used so far.
    regenerations: u32,
    /// Drafts made since the last regeneration.
    mechanical_attempt: u32,
    /// Why the previous full attempt was thrown away.
    regeneration_feedback: Option<String>,
    /// Why the previous draft in this attempt was rejected.
    draft_feedback: Option<String>,
    mechanical_valid: bool,
    mechanical_outcomes: Vec<ValidationOutcome>,
    solver_answer: Option<String>,
    referee_similarity: Option<f64>,
    audit: Option<AuditResult>,
    failure: Option<FailureKind>,
    error: Option<String>,
    trail: Vec<StageEvent>,
}

impl Run {
    fn new(candidate: ClueCandidate) -> Self {
        Self {
            candidate,
            state: LifecycleState::DraftingWordplay,
            regenerations: 0,
            mechanical_attempt: 0,
            regeneration_feedback: None,
            draft_feedback: None,
            mechanical_valid: false,
            mechanical_outcomes: Vec::new(),
            solver_answer: None,
            referee_similarity: None,
            audit: None,
            failure: None,
            error: None,
            trail: Vec::new(),
        }
    }

    fn advance(&mut self, next: LifecycleState) {
        debug_assert!(
            transition_allowed(self.state, next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(
            word = %self.candidate.target_answer,
            from = %self.state,
            to = %next,
            "Lifecycle transition"
        );
        self.state = next;
    }

    /// Everything the drafter should hear about earlier failures.
    fn combined_feedback(&self) -> Option<String> {
        match (&self.regeneration_feedback, &self.draft_feedback) {
            (None, None) => None,
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (Some(earlier), Some(latest)) => Some(format!("{earlier}\n{latest}")),
        }
    }

    fn collaborator_failed(&mut self, state: LifecycleState, error: &CollaboratorError) {
        warn!(
            word = %self.candidate.target_answer,
            state = %state,
            error = %error,
            "Collaborator call failed"
        );
        self.error = Some(error.to_string());
        self.trail.push(StageEvent::CollaboratorFailed {
            state,
            error: error.to_string(),
        });
    }

    /// Wipe the per-attempt state and carry `feedback` into the next draft.
    fn restart(&mut self, feedback: String) {
        self.regenerations += 1;
        self.mechanical_attempt = 0;
        self.regeneration_feedback = Some(format!(
            "A previous version of this clue was rejected:\n{feedback}"
        ));
        self.draft_feedback = None;
        self.mechanical_valid = false;
        self.mechanical_outcomes.clear();
        self.solver_answer = None;
        self.referee_similarity = None;
        self.audit = None;
        self.candidate.wordplay = WordplayComponents::default();
        self.candidate.surface_text.clear();
        self.candidate.definition_span.clear();
    }

    fn finish(self) -> PipelineResult {
        let passed = self.state == LifecycleState::TerminalPass;
        let failure = if passed { None } else { self.failure };
        let error = match failure {
            Some(FailureKind::Collaborator) => self.error,
            _ => None,
        };
        let publication = passed.then(|| publish(&self.candidate));
        let ClueCandidate {
            target_answer,
            mechanism,
            enumeration,
            wordplay,
            surface_text,
            definition_span,
        } = self.candidate;

        PipelineResult {
            word: target_answer,
            mechanism,
            enumeration: enumeration.to_string(),
            passed,
            surface_text,
            definition: definition_span,
            wordplay: (wordplay != WordplayComponents::default()).then_some(wordplay),
            mechanical_valid: self.mechanical_valid,
            mechanical_outcomes: self.mechanical_outcomes,
            solver_answer: self.solver_answer,
            referee_similarity: self.referee_similarity,
            audit: self.audit,
            regeneration_attempts: self.regenerations,
            failure,
            error,
            publication,
            trail: self.trail,
        }
    }
}

/// Drives candidates through draft, mechanical check, polish, blind solve,
/// referee and audit.
pub struct ClueLifecycle {
    collaborator: Arc<dyn GenerativeCollaborator>,
    auditor: RuleAuditor,
    referee: Referee,
    policy: PipelinePolicy,
}

impl ClueLifecycle {
    pub fn new(collaborator: Arc<dyn GenerativeCollaborator>, policy: PipelinePolicy) -> Self {
        Self {
            collaborator,
            auditor: RuleAuditor::new(),
            referee: Referee::new(policy.referee_mode),
            policy,
        }
    }

    pub fn with_auditor(mut self, auditor: RuleAuditor) -> Self {
        self.auditor = auditor;
        self
    }

    pub fn policy(&self) -> &PipelinePolicy {
        &self.policy
    }

    /// Build a candidate from a raw word and run it. Malformed words are
    /// rejected here and never enter the pipeline.
    pub async fn run_word(
        &self,
        word: &str,
        mechanism: WordplayMechanism,
    ) -> Result<PipelineResult, ClueError> {
        let candidate = ClueCandidate::new(word, mechanism)?;
        Ok(self.run(candidate).await)
    }

    /// Run to a terminal state. Stage failures end up in the result, never
    /// as an `Err`.
    pub async fn run(&self, candidate: ClueCandidate) -> PipelineResult {
        info!(
            word = %candidate.target_answer,
            mechanism = %candidate.mechanism,
            enumeration = %candidate.enumeration,
            "Starting candidate"
        );
        let mut run = Run::new(candidate);

        while !run.state.is_terminal() {
            let next = match run.state {
                LifecycleState::DraftingWordplay => self.draft(&mut run).await,
                LifecycleState::ValidatingMechanics => self.validate_mechanics(&mut run),
                LifecycleState::PolishingSurface => self.polish(&mut run).await,
                LifecycleState::Solving => self.solve(&mut run).await,
                LifecycleState::Judging => self.judge(&mut run),
                LifecycleState::Auditing => self.audit(&mut run).await,
                LifecycleState::TerminalPass | LifecycleState::TerminalFail => break,
            };
            run.advance(next);
        }

        let result = run.finish();
        info!(
            word = %result.word,
            mechanism = %result.mechanism,
            passed = result.passed,
            regenerations = result.regeneration_attempts,
            failure = ?result.failure,
            "Candidate finished"
        );
        result
    }

    /// Bound a collaborator call by the policy timeout.
    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, CollaboratorError> {
        let limit = self.policy.call_timeout;
        tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(CollaboratorError::Timeout(limit)))
    }

    async fn draft(&self, run: &mut Run) -> LifecycleState {
        run.mechanical_attempt += 1;
        let feedback = run.combined_feedback();
        let candidate = &run.candidate;
        let drafted = self
            .call(self.collaborator.draft_wordplay(
                &candidate.target_answer,
                candidate.mechanism,
                &candidate.enumeration,
                feedback.as_deref(),
            ))
            .await;

        match drafted {
            Ok(wordplay) => {
                debug!(
                    word = %run.candidate.target_answer,
                    fodder = wordplay.fodder.as_str(),
                    indicator = wordplay.indicator.as_str(),
                    "Wordplay drafted"
                );
                run.candidate.wordplay = wordplay;
                run.trail.push(StageEvent::Drafted {
                    attempt: run.regenerations + 1,
                    mechanical_attempt: run.mechanical_attempt,
                });
                LifecycleState::ValidatingMechanics
            }
            Err(e) => {
                run.collaborator_failed(LifecycleState::DraftingWordplay, &e);
                if run.mechanical_attempt < self.policy.max_mechanical_attempts {
                    run.draft_feedback =
                        Some(format!("The previous draft could not be used: {e}"));
                    LifecycleState::DraftingWordplay
                } else {
                    run.failure = Some(FailureKind::Collaborator);
                    LifecycleState::TerminalFail
                }
            }
        }
    }

    fn validate_mechanics(&self, run: &mut Run) -> LifecycleState {
        run.mechanical_outcomes = validate(&run.candidate);

        if all_valid(&run.mechanical_outcomes) {
            if let Some(precheck) = hidden_word_precheck(&run.candidate) {
                warn!(
                    word = %run.candidate.target_answer,
                    fodder = run.candidate.wordplay.fodder.as_str(),
                    "Hidden word precheck failed"
                );
                run.trail.push(StageEvent::HiddenWordPrecheckFailed {
                    feedback: precheck.message.clone(),
                });
                run.mechanical_outcomes.push(precheck);
                run.mechanical_valid = false;
                run.failure = Some(FailureKind::Mechanical);
                return LifecycleState::TerminalFail;
            }
            run.mechanical_valid = true;
            run.trail.push(StageEvent::MechanicalAccepted {
                mechanical_attempt: run.mechanical_attempt,
            });
            return LifecycleState::PolishingSurface;
        }

        run.mechanical_valid = false;
        let feedback = feedback_for(&run.mechanical_outcomes);
        info!(
            word = %run.candidate.target_answer,
            attempt = run.mechanical_attempt,
            max = self.policy.max_mechanical_attempts,
            feedback = feedback.as_str(),
            "Mechanical validation failed"
        );
        run.trail.push(StageEvent::MechanicalRejected {
            mechanical_attempt: run.mechanical_attempt,
            feedback: feedback.clone(),
        });

        if run.mechanical_attempt < self.policy.max_mechanical_attempts {
            run.draft_feedback = Some(format!("PREVIOUS ATTEMPT FAILED:\n{feedback}"));
            LifecycleState::DraftingWordplay
        } else {
            run.failure = Some(FailureKind::Mechanical);
            LifecycleState::TerminalFail
        }
    }

    async fn polish(&self, run: &mut Run) -> LifecycleState {
        let polished = self.call(self.collaborator.polish_surface(&run.candidate)).await;
        let reading = match polished {
            Ok(reading) => reading,
            Err(e) => {
                run.collaborator_failed(LifecycleState::PolishingSurface, &e);
                return self.reject(run, FailureKind::Collaborator, e.to_string());
            }
        };

        run.candidate.surface_text = reading.clue;
        run.candidate.definition_span = reading.definition;
        run.trail.push(StageEvent::Polished {
            surface: run.candidate.surface_text.clone(),
        });

        let guards = check_surface(&run.candidate);
        if all_valid(&guards) {
            return LifecycleState::Solving;
        }
        let feedback = feedback_for(&guards);
        info!(
            word = %run.candidate.target_answer,
            surface = run.candidate.surface_text.as_str(),
            feedback = feedback.as_str(),
            "Surface rejected"
        );
        run.trail.push(StageEvent::SurfaceRejected {
            feedback: feedback.clone(),
        });
        self.reject(run, FailureKind::Surface, feedback)
    }

    async fn solve(&self, run: &mut Run) -> LifecycleState {
        let candidate = &run.candidate;
        let solved = self
            .call(
                self.collaborator
                    .solve(&candidate.surface_text, &candidate.enumeration),
            )
            .await;

        match solved {
            Ok(solution) => {
                debug!(
                    word = %run.candidate.target_answer,
                    answer = solution.answer.as_str(),
                    confidence = ?solution.confidence,
                    "Blind solve returned"
                );
                run.trail.push(StageEvent::Solved {
                    answer: solution.answer.clone(),
                    definition_part: solution.definition_part.clone(),
                });
                run.solver_answer = Some(solution.answer);
                LifecycleState::Judging
            }
            Err(e) => {
                run.collaborator_failed(LifecycleState::Solving, &e);
                self.reject(run, FailureKind::Collaborator, e.to_string())
            }
        }
    }

    fn judge(&self, run: &mut Run) -> LifecycleState {
        let verdict = self.referee.judge(
            &run.candidate.target_answer,
            run.solver_answer.as_deref().unwrap_or_default(),
        );
        run.referee_similarity = Some(verdict.similarity);
        run.trail.push(StageEvent::Judged {
            passed: verdict.passed,
            similarity: verdict.similarity,
            feedback: verdict.feedback.clone(),
        });

        if verdict.passed {
            LifecycleState::Auditing
        } else {
            info!(
                word = %run.candidate.target_answer,
                solver_answer = verdict.solver_answer.as_str(),
                similarity = verdict.similarity,
                "Referee rejected solve"
            );
            let feedback = format!(
                "Blind solver answered '{}'. {}",
                verdict.solver_answer, verdict.feedback
            );
            self.reject(run, FailureKind::Solver, feedback)
        }
    }

    async fn audit(&self, run: &mut Run) -> LifecycleState {
        let judged = self
            .call(self.collaborator.judge_double_duty(&run.candidate))
            .await;
        let double_duty = match judged {
            Ok(verdict) => verdict,
            Err(e) => {
                run.collaborator_failed(LifecycleState::Auditing, &e);
                return self.reject(run, FailureKind::Collaborator, e.to_string());
            }
        };

        let audit = self.auditor.audit(&run.candidate, &double_duty);
        let passed = audit.passed();
        run.trail.push(StageEvent::Audited {
            passed,
            fairness_score: audit.fairness_score,
            failed_checks: audit.failed_checks().map(|c| c.kind).collect(),
        });
        let feedback = audit.feedback_summary();
        info!(
            word = %run.candidate.target_answer,
            passed,
            fairness = audit.fairness_score,
            "Audit complete"
        );
        run.audit = Some(audit);

        if passed {
            LifecycleState::TerminalPass
        } else {
            self.reject(run, FailureKind::Audit, feedback)
        }
    }

    /// A failure after the mechanical stage: spend a regeneration if one is
    /// left, otherwise stop.
    fn reject(&self, run: &mut Run, kind: FailureKind, feedback: String) -> LifecycleState {
        run.failure = Some(kind);
        if run.regenerations >= self.policy.max_regenerations {
            return LifecycleState::TerminalFail;
        }
        run.trail.push(StageEvent::Regenerating {
            feedback: feedback.clone(),
        });
        run.restart(feedback);
        info!(
            word = %run.candidate.target_answer,
            regeneration = run.regenerations,
            reason = ?kind,
            "Regenerating candidate"
        );
        LifecycleState::DraftingWordplay
    }
}
