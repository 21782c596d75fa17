use clueforge_common::{AuditCheck, AuditCheckKind, CheckStatus, ClueCandidate, WordplayMechanism};

use super::rules::{RE_FRAGMENT, RE_WORD};
use crate::lexicon::is_priority_abbreviation;

fn failed(checks: &[AuditCheck], kind: AuditCheckKind) -> bool {
    checks
        .iter()
        .any(|c| c.kind == kind && c.status == CheckStatus::Fail)
}

/// Passed or warned checks over all checks.
pub(super) fn fairness_score(checks: &[AuditCheck]) -> f64 {
    if checks.is_empty() {
        return 0.0;
    }
    let passed = checks.iter().filter(|c| c.status.passed()).count();
    passed as f64 / checks.len() as f64
}

/// Starts at 1.0; each failed rule costs a fixed amount. Filler costs more
/// on longer surfaces.
pub(super) fn technical_compliance(candidate: &ClueCandidate, checks: &[AuditCheck]) -> f64 {
    let mut score: f64 = 1.0;

    if failed(checks, AuditCheckKind::FillerBudget) {
        let surface_words = words_in(&candidate.surface_text);
        score -= if surface_words > 10 {
            0.3
        } else if surface_words > 8 {
            0.2
        } else {
            0.15
        };
    }
    if failed(checks, AuditCheckKind::IndicatorGrammar) {
        score -= 0.3;
    }
    if failed(checks, AuditCheckKind::FodderPresence) {
        score -= 0.4;
    }
    if failed(checks, AuditCheckKind::WordValidity) {
        score -= 0.5;
    }
    if failed(checks, AuditCheckKind::Obscurity) {
        score -= 0.2;
    }
    if failed(checks, AuditCheckKind::NarrativeIntegrity) {
        score -= 0.25;
    }

    score.max(0.0)
}

/// 1 (direct) to 5 (master), from mechanism, definition handling,
/// abbreviation load and brevity.
pub(super) fn difficulty_level(candidate: &ClueCandidate) -> u8 {
    let mut level: i32 = 3;

    match candidate.mechanism {
        WordplayMechanism::HiddenWord | WordplayMechanism::Homophone => level -= 1,
        WordplayMechanism::Reversal | WordplayMechanism::Charade => level += 1,
        _ => {}
    }

    let definition = candidate.definition_span.trim().to_lowercase();
    if !definition.is_empty() && candidate.surface_text.to_lowercase().contains(&definition) {
        level -= 1;
    } else {
        level += 1;
    }

    let fodder = candidate.wordplay.fodder.to_uppercase();
    let abbreviations = RE_FRAGMENT
        .find_iter(&fodder)
        .filter(|m| is_priority_abbreviation(m.as_str()))
        .count();
    if abbreviations >= 3 {
        level += 1;
    }

    if candidate.surface_text.split_whitespace().count() <= 5 {
        level -= 1;
    }

    let pieces = candidate
        .wordplay
        .fodder
        .split('+')
        .count()
        .max(candidate.wordplay.parts.len());
    if pieces >= 4 {
        level += 1;
    }

    level.clamp(1, 5) as u8
}

/// 100 means the surface reads as a plain sentence. Short surfaces may earn
/// up to 105.
pub(super) fn narrative_naturalness(candidate: &ClueCandidate, checks: &[AuditCheck]) -> u8 {
    let mut score: i32 = 100;

    if failed(checks, AuditCheckKind::NarrativeIntegrity) {
        score -= 40;
    }
    if failed(checks, AuditCheckKind::FillerBudget) {
        score -= 20;
    }
    if failed(checks, AuditCheckKind::IndicatorGrammar) {
        score -= 15;
    }
    if failed(checks, AuditCheckKind::DoubleDuty) {
        score -= 10;
    }
    if failed(checks, AuditCheckKind::Obscurity) {
        score -= 10;
    }

    let count = candidate.surface_text.split_whitespace().count();
    if count <= 6 {
        score += 5;
    } else if count >= 12 {
        score -= 10;
    }

    score.clamp(0, 105) as u8
}

fn words_in(text: &str) -> usize {
    RE_WORD.find_iter(&text.to_lowercase()).count()
}
