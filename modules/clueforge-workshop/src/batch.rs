use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use clueforge_common::{BatchPlan, ClueCandidate, ClueError, MechanismFilter, PipelineResult};

use crate::lifecycle::ClueLifecycle;
use crate::traits::{Draw, WordSupply};

/// Running totals for one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    /// 1-based.
    pub batch: usize,
    pub attempted: usize,
    pub passed: usize,
    pub success_rate: f64,
}

/// Words the supply handed out that could not become candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedInput {
    pub word: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Every finished candidate, in completion order.
    pub results: Vec<PipelineResult>,
    /// The supply ran dry before the target was met.
    pub exhausted: bool,
    pub batches: Vec<BatchStats>,
    pub rejected_inputs: Vec<RejectedInput>,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn passed(&self) -> impl Iterator<Item = &PipelineResult> {
        self.results.iter().filter(|r| r.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &PipelineResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn pass_count(&self) -> usize {
        self.passed().count()
    }

    pub fn total_attempts(&self) -> usize {
        self.results.len()
    }

    pub fn success_rate(&self) -> f64 {
        rate(self.pass_count(), self.total_attempts())
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed of {} attempts ({:.0}%) in {} batches, {:.1}s",
            self.pass_count(),
            self.total_attempts(),
            self.success_rate() * 100.0,
            self.batches.len(),
            self.elapsed.as_secs_f64()
        )?;
        if self.exhausted {
            write!(f, ", word supply exhausted")?;
        }
        Ok(())
    }
}

fn rate(passed: usize, attempted: usize) -> f64 {
    if attempted == 0 {
        0.0
    } else {
        passed as f64 / attempted as f64
    }
}

/// Draws words in batches and runs each batch's candidates concurrently
/// until enough have passed.
pub struct BatchScheduler {
    lifecycle: Arc<ClueLifecycle>,
}

impl BatchScheduler {
    pub fn new(lifecycle: Arc<ClueLifecycle>) -> Self {
        Self { lifecycle }
    }

    /// Returns once `plan.target_pass_count` candidates have passed or the
    /// supply is exhausted. Candidates still in flight when the target is
    /// reached are dropped unfinished and do not appear in the outcome.
    pub async fn run(
        &self,
        plan: &BatchPlan,
        supply: &dyn WordSupply,
    ) -> Result<BatchOutcome, ClueError> {
        plan.validate()?;
        let started = Instant::now();
        let mut outcome = BatchOutcome::default();
        let mut passed = 0usize;
        let mut cursor = 0usize;
        let mut supply_dry = false;

        let policy = self.lifecycle.policy();
        info!(
            target = plan.target_pass_count,
            batch_size = plan.batch_size,
            concurrency = plan.max_concurrency,
            mechanical_attempts = policy.max_mechanical_attempts,
            regenerations = policy.max_regenerations,
            referee = ?policy.referee_mode,
            "Starting clue run"
        );

        while passed < plan.target_pass_count {
            let batch_number = outcome.batches.len() + 1;
            let mut candidates = Vec::with_capacity(plan.batch_size);

            for _ in 0..plan.batch_size {
                let (word, mechanism) = match draw(supply, &plan.mechanisms, &mut cursor).await {
                    Draw::Word { word, mechanism } => (word, mechanism),
                    Draw::Exhausted => {
                        supply_dry = true;
                        break;
                    }
                };
                supply.mark_used(&word).await;
                if !plan.mechanisms.allows(mechanism) {
                    warn!(word = word.as_str(), mechanism = %mechanism, "Supply ignored the mechanism filter");
                    outcome.rejected_inputs.push(RejectedInput {
                        word,
                        reason: format!("{mechanism} is outside the mechanism filter"),
                    });
                    continue;
                }
                match ClueCandidate::new(&word, mechanism) {
                    Ok(candidate) => candidates.push(candidate),
                    Err(e) => {
                        warn!(word = word.as_str(), error = %e, "Skipping malformed word");
                        outcome.rejected_inputs.push(RejectedInput {
                            word,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            if candidates.is_empty() {
                if !supply_dry {
                    warn!(batch = batch_number, "Batch drew no usable words; stopping");
                    supply_dry = true;
                }
                break;
            }

            info!(batch = batch_number, candidates = candidates.len(), "Running batch");
            let lifecycle = &self.lifecycle;
            let mut runs = stream::iter(candidates.into_iter().map(|c| lifecycle.run(c)))
                .buffer_unordered(plan.max_concurrency);

            let mut attempted = 0usize;
            let mut batch_passed = 0usize;
            while let Some(result) = runs.next().await {
                attempted += 1;
                if result.passed {
                    batch_passed += 1;
                    passed += 1;
                }
                outcome.results.push(result);
                if passed >= plan.target_pass_count {
                    break;
                }
            }
            drop(runs);

            let stats = BatchStats {
                batch: batch_number,
                attempted,
                passed: batch_passed,
                success_rate: rate(batch_passed, attempted),
            };
            info!(
                batch = stats.batch,
                attempted = stats.attempted,
                passed = stats.passed,
                total_passed = passed,
                target = plan.target_pass_count,
                "Batch complete"
            );
            outcome.batches.push(stats);

            if supply_dry {
                break;
            }
        }

        outcome.exhausted = supply_dry && passed < plan.target_pass_count;
        outcome.elapsed = started.elapsed();
        info!("Clue run complete. {outcome}");
        Ok(outcome)
    }
}

/// One word from the supply. A filtered plan cycles through its mechanisms,
/// falling through to the next one when a mechanism has nothing left.
async fn draw(supply: &dyn WordSupply, filter: &MechanismFilter, cursor: &mut usize) -> Draw {
    let mechanisms = match filter {
        MechanismFilter::Any => return supply.next(None).await,
        MechanismFilter::Only(list) if list.is_empty() => return supply.next(None).await,
        MechanismFilter::Only(list) => list,
    };

    let start = *cursor;
    *cursor += 1;
    for offset in 0..mechanisms.len() {
        let mechanism = mechanisms[(start + offset) % mechanisms.len()];
        if let Draw::Word { word, mechanism } = supply.next(Some(mechanism)).await {
            return Draw::Word { word, mechanism };
        }
    }
    Draw::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedWorkshop, VecSupply};
    use clueforge_common::{PipelinePolicy, WordplayMechanism};

    fn scheduler() -> BatchScheduler {
        let workshop = Arc::new(ScriptedWorkshop::silent());
        BatchScheduler::new(Arc::new(ClueLifecycle::new(workshop, PipelinePolicy::default())))
    }

    #[tokio::test]
    async fn zero_target_draws_nothing() {
        let supply = VecSupply::repeating("SILENT", WordplayMechanism::Anagram);
        let outcome = scheduler().run(&BatchPlan::new(0), &supply).await.unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(supply.draws(), 0);
    }

    #[tokio::test]
    async fn invalid_plan_is_rejected() {
        let supply = VecSupply::repeating("SILENT", WordplayMechanism::Anagram);
        let plan = BatchPlan {
            max_concurrency: 0,
            ..BatchPlan::new(1)
        };
        assert!(scheduler().run(&plan, &supply).await.is_err());
    }

    #[tokio::test]
    async fn filter_cycles_and_falls_through() {
        let supply = VecSupply::new([
            ("SILENT", WordplayMechanism::Anagram),
            ("LISTEN", WordplayMechanism::Anagram),
        ]);
        let filter = MechanismFilter::Only(vec![
            WordplayMechanism::Reversal,
            WordplayMechanism::Anagram,
        ]);
        let mut cursor = 0;
        assert!(matches!(
            draw(&supply, &filter, &mut cursor).await,
            Draw::Word { ref word, .. } if word == "SILENT"
        ));
        assert!(matches!(
            draw(&supply, &filter, &mut cursor).await,
            Draw::Word { ref word, .. } if word == "LISTEN"
        ));
        assert_eq!(draw(&supply, &filter, &mut cursor).await, Draw::Exhausted);
    }

    /// Hands out its words whatever mechanism is asked for.
    struct IgnoresFilter(VecSupply);

    #[async_trait::async_trait]
    impl WordSupply for IgnoresFilter {
        async fn next(&self, _mechanism: Option<WordplayMechanism>) -> Draw {
            self.0.next(None).await
        }

        async fn mark_used(&self, word: &str) {
            self.0.mark_used(word).await
        }
    }

    #[tokio::test]
    async fn words_outside_the_filter_are_rejected() {
        let supply = IgnoresFilter(VecSupply::new([
            ("REGAL", WordplayMechanism::Reversal),
            ("SILENT", WordplayMechanism::Anagram),
        ]));
        let plan = BatchPlan {
            mechanisms: MechanismFilter::Only(vec![WordplayMechanism::Anagram]),
            ..BatchPlan::new(1)
        };
        let outcome = scheduler().run(&plan, &supply).await.unwrap();

        assert_eq!(outcome.pass_count(), 1);
        assert_eq!(outcome.rejected_inputs.len(), 1);
        assert_eq!(outcome.rejected_inputs[0].word, "REGAL");
    }

    #[test]
    fn summary_mentions_exhaustion() {
        let outcome = BatchOutcome {
            exhausted: true,
            ..Default::default()
        };
        assert!(outcome.to_string().contains("exhausted"));
        assert_eq!(outcome.success_rate(), 0.0);
    }
}
