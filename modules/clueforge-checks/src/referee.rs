use clueforge_common::{letters_only, RefereeMode};
use serde::Serialize;

/// Similarity a lenient referee accepts.
pub const LENIENT_THRESHOLD: f64 = 0.90;

/// Outcome of comparing the blind solver's answer with the intended one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefereeVerdict {
    pub passed: bool,
    pub expected: String,
    pub solver_answer: String,
    /// 0.0 to 1.0, normalized Levenshtein over the letters-only forms.
    pub similarity: f64,
    pub feedback: String,
}

/// Compares answers letters-only and uppercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct Referee {
    mode: RefereeMode,
}

impl Referee {
    pub fn new(mode: RefereeMode) -> Self {
        Self { mode }
    }

    pub fn judge(&self, expected: &str, solver_answer: &str) -> RefereeVerdict {
        let want = letters_only(expected);
        let got = letters_only(solver_answer);

        if got.is_empty() {
            return RefereeVerdict {
                passed: false,
                expected: expected.to_string(),
                solver_answer: solver_answer.to_string(),
                similarity: 0.0,
                feedback: "Solver failed to provide an answer".to_string(),
            };
        }

        if want == got {
            let feedback = if expected.trim() == solver_answer.trim() {
                "Exact match: solver found the answer.".to_string()
            } else {
                format!(
                    "Exact match: solver found the answer (written '{}', differs only in case or spacing).",
                    solver_answer.trim()
                )
            };
            return RefereeVerdict {
                passed: true,
                expected: expected.to_string(),
                solver_answer: solver_answer.to_string(),
                similarity: 1.0,
                feedback,
            };
        }

        let similarity = strsim::normalized_levenshtein(&want, &got);

        if self.mode == RefereeMode::Lenient && similarity >= LENIENT_THRESHOLD {
            return RefereeVerdict {
                passed: true,
                expected: expected.to_string(),
                solver_answer: solver_answer.to_string(),
                similarity,
                feedback: format!(
                    "Close match: solver proposed '{got}' for '{want}' (similarity {:.0}%).",
                    similarity * 100.0
                ),
            };
        }

        let mut parts = vec![format!("Mismatch: expected '{want}' but solver found '{got}'.")];
        if want.len() != got.len() {
            parts.push(format!(
                "Length mismatch: expected {} letters, got {}.",
                want.len(),
                got.len()
            ));
        }
        let pct = similarity * 100.0;
        parts.push(if similarity > 0.5 {
            format!("Answers are {pct:.1}% similar; the clue may be ambiguous or admit another answer.")
        } else if similarity > 0.3 {
            format!("Some similarity ({pct:.1}%); the solver may have half-read the clue.")
        } else {
            format!("Low similarity ({pct:.1}%); the solver likely misread the definition or wordplay.")
        });

        RefereeVerdict {
            passed: false,
            expected: expected.to_string(),
            solver_answer: solver_answer.to_string(),
            similarity,
            feedback: parts.join(" "),
        }
    }
}
