use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use clueforge_common::{FailureKind, PipelineResult};

use crate::batch::{BatchOutcome, BatchStats, RejectedInput};

#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub target_count: usize,
    pub total_attempts: usize,
    pub passed: usize,
    pub success_rate: f64,
    pub elapsed_seconds: f64,
    pub batches_processed: usize,
    /// The word supply ran out before the target was reached.
    pub exhausted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub mechanical_failures: usize,
    pub surface_failures: usize,
    pub solver_failures: usize,
    pub audit_failures: usize,
    /// Candidates sunk by a model error or timeout.
    pub errors: usize,
    pub rejected_inputs: usize,
}

/// The document a run leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub summary: RunSummary,
    pub batches: Vec<BatchStats>,
    pub clues: Vec<PipelineResult>,
    pub failed: Vec<PipelineResult>,
    pub rejected_inputs: Vec<RejectedInput>,
}

impl RunReport {
    pub fn new(outcome: &BatchOutcome, target_count: usize) -> Self {
        let mut summary = RunSummary {
            total: outcome.total_attempts(),
            passed: outcome.pass_count(),
            rejected_inputs: outcome.rejected_inputs.len(),
            ..Default::default()
        };
        for result in outcome.failed() {
            summary.failed += 1;
            match result.failure {
                Some(FailureKind::Mechanical) => summary.mechanical_failures += 1,
                Some(FailureKind::Surface) => summary.surface_failures += 1,
                Some(FailureKind::Solver) => summary.solver_failures += 1,
                Some(FailureKind::Audit) => summary.audit_failures += 1,
                Some(FailureKind::Collaborator) | None => summary.errors += 1,
            }
        }

        Self {
            metadata: RunMetadata {
                run_id: Uuid::new_v4(),
                generated_at: Utc::now(),
                target_count,
                total_attempts: outcome.total_attempts(),
                passed: outcome.pass_count(),
                success_rate: outcome.success_rate(),
                elapsed_seconds: outcome.elapsed.as_secs_f64(),
                batches_processed: outcome.batches.len(),
                exhausted: outcome.exhausted,
            },
            summary,
            batches: outcome.batches.clone(),
            clues: outcome.passed().cloned().collect(),
            failed: outcome.failed().cloned().collect(),
            rejected_inputs: outcome.rejected_inputs.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clueforge_common::WordplayMechanism;

    fn result(word: &str, passed: bool, failure: Option<FailureKind>) -> PipelineResult {
        PipelineResult {
            word: word.into(),
            mechanism: WordplayMechanism::Anagram,
            enumeration: format!("({})", word.len()),
            passed,
            surface_text: String::new(),
            definition: String::new(),
            wordplay: None,
            mechanical_valid: passed,
            mechanical_outcomes: Vec::new(),
            solver_answer: None,
            referee_similarity: None,
            audit: None,
            regeneration_attempts: 0,
            failure,
            error: None,
            publication: None,
            trail: Vec::new(),
        }
    }

    fn outcome() -> BatchOutcome {
        BatchOutcome {
            results: vec![
                result("SILENT", true, None),
                result("REGAL", false, Some(FailureKind::Mechanical)),
                result("BATTEN", false, Some(FailureKind::Audit)),
                result("CARPET", false, Some(FailureKind::Collaborator)),
            ],
            exhausted: true,
            rejected_inputs: vec![RejectedInput {
                word: "R2D2".into(),
                reason: "digits".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn summary_buckets_failures_by_stage() {
        let report = RunReport::new(&outcome(), 5);
        assert_eq!(
            report.summary,
            RunSummary {
                total: 4,
                passed: 1,
                failed: 3,
                mechanical_failures: 1,
                surface_failures: 0,
                solver_failures: 0,
                audit_failures: 1,
                errors: 1,
                rejected_inputs: 1,
            }
        );
        assert_eq!(report.metadata.success_rate, 0.25);
        assert!(report.metadata.exhausted);
    }

    #[test]
    fn clue_records_keep_their_diagnostic_fields() {
        let json: serde_json::Value =
            serde_json::from_str(&RunReport::new(&outcome(), 5).to_json().unwrap()).unwrap();
        let clue = &json["clues"][0];
        for field in [
            "word",
            "mechanism",
            "surface_text",
            "passed",
            "mechanical_valid",
            "solver_answer",
            "audit",
            "regeneration_attempts",
        ] {
            assert!(clue.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["failed"].as_array().unwrap().len(), 3);
        assert_eq!(json["metadata"]["target_count"], 5);
    }

    #[test]
    fn writes_into_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("report.json");
        RunReport::new(&outcome(), 5).write_to(&path).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("SILENT"));
    }
}
