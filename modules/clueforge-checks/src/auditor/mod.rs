mod metrics;
mod rules;

use std::sync::Arc;

use clueforge_common::{AuditCheck, AuditResult, ClueCandidate};
use tracing::debug;

use crate::lexicon::Lexicon;

/// The semantic judge's answer to "does one word serve as both definition
/// and indicator?".
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleDutyVerdict {
    pub passed: bool,
    pub feedback: String,
}

impl DoubleDutyVerdict {
    pub fn pass(feedback: impl Into<String>) -> Self {
        Self {
            passed: true,
            feedback: feedback.into(),
        }
    }

    pub fn fail(feedback: impl Into<String>) -> Self {
        Self {
            passed: false,
            feedback: feedback.into(),
        }
    }
}

/// Deterministic fairness audit. Every check is independent; the result
/// holds one [`AuditCheck`] per kind in fixed order.
#[derive(Clone, Default)]
pub struct RuleAuditor {
    lexicon: Option<Arc<dyn Lexicon>>,
}

impl RuleAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the dictionary-backed checks (word validity, gibberish
    /// fodder, non-word reversals).
    pub fn with_lexicon(mut self, lexicon: Arc<dyn Lexicon>) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn audit(&self, candidate: &ClueCandidate, double_duty: &DoubleDutyVerdict) -> AuditResult {
        let lexicon = self.lexicon.as_deref();

        let checks: Vec<AuditCheck> = vec![
            rules::direction(candidate),
            rules::double_duty(candidate, double_duty),
            rules::indicator_fairness(candidate),
            rules::identity(candidate),
            rules::fodder_presence(candidate),
            rules::filler_budget(candidate),
            rules::indicator_grammar(candidate),
            rules::narrative_integrity(candidate, lexicon),
            rules::obscurity(candidate, lexicon),
            rules::word_validity(candidate, lexicon),
        ];

        let result = AuditResult {
            fairness_score: metrics::fairness_score(&checks),
            technical_compliance: metrics::technical_compliance(candidate, &checks),
            difficulty_level: metrics::difficulty_level(candidate),
            narrative_naturalness: metrics::narrative_naturalness(candidate, &checks),
            checks,
        };

        debug!(
            answer = %candidate.target_answer,
            passed = result.passed(),
            fairness = result.fairness_score,
            compliance = result.technical_compliance,
            difficulty = result.difficulty_level,
            naturalness = result.narrative_naturalness,
            "Audit complete"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clueforge_common::{AuditCheckKind, CheckStatus, WordplayComponents, WordplayMechanism};

    use crate::lexicon::WordListLexicon;

    fn clue(
        answer: &str,
        mechanism: WordplayMechanism,
        fodder: &str,
        indicator: &str,
        surface: &str,
        definition: &str,
    ) -> ClueCandidate {
        ClueCandidate::new(answer, mechanism)
            .unwrap()
            .with_wordplay(WordplayComponents {
                fodder: fodder.into(),
                indicator: indicator.into(),
                mechanism_description: String::new(),
                ..Default::default()
            })
            .with_surface(surface, definition)
    }

    fn silent() -> ClueCandidate {
        clue(
            "SILENT",
            WordplayMechanism::Anagram,
            "listen",
            "confused",
            "Confused listen for quiet (6)",
            "quiet",
        )
    }

    fn ok() -> DoubleDutyVerdict {
        DoubleDutyVerdict::pass("Definition and indicator are separate")
    }

    fn status(result: &AuditResult, kind: AuditCheckKind) -> CheckStatus {
        result.status(kind).unwrap()
    }

    #[test]
    fn silent_passes_every_check() {
        let result = RuleAuditor::new().audit(&silent(), &ok());
        assert_eq!(result.checks.len(), 10);
        for c in &result.checks {
            assert_eq!(c.status, CheckStatus::Pass, "{}: {}", c.kind, c.feedback);
        }
        assert_eq!(result.fairness_score, 1.0);
        assert!(result.passed());
        assert_eq!(result.technical_compliance, 1.0);
    }

    #[test]
    fn silent_also_passes_with_a_dictionary() {
        let lexicon = Arc::new(WordListLexicon::new(["listen", "quiet", "confused", "silent"]));
        let result = RuleAuditor::new().with_lexicon(lexicon).audit(&silent(), &ok());
        assert_eq!(result.fairness_score, 1.0);
    }

    #[test]
    fn checks_come_in_fixed_order() {
        let result = RuleAuditor::new().audit(&silent(), &ok());
        let kinds: Vec<_> = result.checks.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, AuditCheckKind::ALL.to_vec());
    }

    #[test]
    fn direction_matches_whole_words_only() {
        let mut c = silent();
        c.wordplay.indicator = "scones".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Direction), CheckStatus::Pass);

        c.wordplay.indicator = "lemon".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Direction), CheckStatus::Pass);

        c.wordplay.indicator = "on".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Direction), CheckStatus::Fail);

        c.wordplay.indicator = "On top".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Direction), CheckStatus::Fail);
    }

    #[test]
    fn direction_ignores_fodder() {
        let c = clue(
            "NO",
            WordplayMechanism::Reversal,
            "on",
            "returned",
            "Returned on refusal",
            "refusal",
        );
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Direction), CheckStatus::Pass);
    }

    #[test]
    fn synonym_definition_is_never_double_duty() {
        let c = clue(
            "BOAT",
            WordplayMechanism::HiddenWord,
            "lab oath",
            "found in",
            "Vessel found in lab oath",
            "vessel",
        );
        let strict_judge = DoubleDutyVerdict::fail("vessel relates to boat");
        let result = RuleAuditor::new().audit(&c, &strict_judge);
        let dd = result.check(AuditCheckKind::DoubleDuty).unwrap();
        assert!(dd.status.passed(), "{}", dd.feedback);

        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::DoubleDuty), CheckStatus::Pass);
    }

    #[test]
    fn shared_definition_and_indicator_word_is_double_duty() {
        let c = clue(
            "TORN",
            WordplayMechanism::Anagram,
            "ront",
            "shredded",
            "Shredded ront",
            "shredded",
        );
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::DoubleDuty), CheckStatus::Fail);
    }

    #[test]
    fn noun_anagram_indicator_is_unfair() {
        let mut c = silent();
        c.wordplay.indicator = "listen medley".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::IndicatorFairness), CheckStatus::Fail);
    }

    #[test]
    fn answer_in_fodder_breaks_identity() {
        let c = clue(
            "STAR",
            WordplayMechanism::Charade,
            "st + ar",
            "",
            "St Ar",
            "sun",
        );
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Identity), CheckStatus::Fail);

        let c = clue(
            "PAINT",
            WordplayMechanism::Container,
            "painting",
            "holding",
            "Holding painting colour",
            "colour",
        );
        let result = RuleAuditor::new().audit(&c, &ok());
        let identity = result.check(AuditCheckKind::Identity).unwrap();
        assert_eq!(identity.status, CheckStatus::Fail);
        assert!(identity.feedback.contains("painting") || identity.feedback.contains("paint"));
    }

    #[test]
    fn hidden_word_across_boundary_keeps_identity() {
        let c = clue(
            "UNIT",
            WordplayMechanism::HiddenWord,
            "modern unity",
            "in",
            "One in modern unity",
            "one",
        );
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Identity), CheckStatus::Pass);

        let c = clue(
            "UNIT",
            WordplayMechanism::HiddenWord,
            "unit",
            "in",
            "One in unit",
            "one",
        );
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Identity), CheckStatus::Fail);
    }

    #[test]
    fn synonym_fodder_fails_presence() {
        let mut c = silent();
        c.surface_text = "Confused hearing for quiet (6)".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::FodderPresence), CheckStatus::Fail);
        assert!(result.technical_compliance < 1.0);
    }

    #[test]
    fn filler_words_fail_budget() {
        let mut c = silent();
        c.surface_text = "Confused listen for very quiet (6)".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        let filler = result.check(AuditCheckKind::FillerBudget).unwrap();
        assert_eq!(filler.status, CheckStatus::Fail);
        assert!(filler.feedback.contains("very"));
    }

    #[test]
    fn three_connectors_exceed_budget() {
        let mut c = silent();
        c.surface_text = "Confused listen is for quiet to (6)".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        let filler = result.check(AuditCheckKind::FillerBudget).unwrap();
        assert_eq!(filler.status, CheckStatus::Fail);
        assert!(filler.feedback.contains("Too many connectors"));
    }

    #[test]
    fn repeated_connector_counts_each_time() {
        let mut c = silent();
        c.surface_text = "Confused listen for quiet for for (6)".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        let filler = result.check(AuditCheckKind::FillerBudget).unwrap();
        assert_eq!(filler.status, CheckStatus::Fail);
        assert!(filler.feedback.contains("Too many connectors (3)"));
    }

    #[test]
    fn trailing_participle_fails_only_for_anagrams() {
        let mut c = silent();
        c.surface_text = "Listen confused for quiet (6)".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::IndicatorGrammar), CheckStatus::Fail);

        let c = clue(
            "STAR",
            WordplayMechanism::Reversal,
            "rats",
            "returned",
            "Celebrity rats returned",
            "celebrity",
        );
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::IndicatorGrammar), CheckStatus::Pass);
    }

    #[test]
    fn literal_letter_listing_fails_narrative() {
        let mut c = silent();
        c.surface_text = "Confused listen with n, e, w for quiet".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::NarrativeIntegrity), CheckStatus::Fail);
        assert!(result.narrative_naturalness <= 60);
    }

    #[test]
    fn odd_two_letter_token_with_comma_only_warns() {
        let mut c = silent();
        c.surface_text = "Confused, listen nt for quiet".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::NarrativeIntegrity), CheckStatus::Warn);
    }

    #[test]
    fn gibberish_anagram_fodder_fails_with_dictionary() {
        let lexicon = Arc::new(WordListLexicon::new(["quiet", "confused"]));
        let c = clue(
            "SILENT",
            WordplayMechanism::Anagram,
            "tilsen",
            "confused",
            "Confused tilsen for quiet",
            "quiet",
        );
        let result = RuleAuditor::new().with_lexicon(lexicon).audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::NarrativeIntegrity), CheckStatus::Fail);
        assert_eq!(status(&result, AuditCheckKind::WordValidity), CheckStatus::Fail);
        assert!(!result.passed());
    }

    #[test]
    fn extended_abbreviation_warns() {
        let c = clue(
            "ENTREATY",
            WordplayMechanism::Charade,
            "EN + TREAT + Y",
            "",
            "Nurse treat unknown plea",
            "plea",
        );
        let result = RuleAuditor::new().audit(&c, &ok());
        let obscurity = result.check(AuditCheckKind::Obscurity).unwrap();
        assert_eq!(obscurity.status, CheckStatus::Warn);
        assert!(obscurity.feedback.contains("EN (extended)"));
    }

    #[test]
    fn non_word_reversal_fails_with_dictionary() {
        let lexicon = Arc::new(WordListLexicon::new(["back", "asthma"]));
        let c = clue(
            "ASTHMA",
            WordplayMechanism::Reversal,
            "amhtsa",
            "back",
            "Amhtsa back, wheezing",
            "wheezing",
        );
        let result = RuleAuditor::new().with_lexicon(lexicon).audit(&c, &ok());
        assert_eq!(status(&result, AuditCheckKind::Obscurity), CheckStatus::Fail);
        let validity = result.check(AuditCheckKind::WordValidity).unwrap();
        assert_eq!(validity.status, CheckStatus::Fail);
        assert!(validity.feedback.contains("reversals"));
    }

    #[test]
    fn word_validity_passes_without_dictionary() {
        let mut c = silent();
        c.wordplay.fodder = "xqzt".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        let validity = result.check(AuditCheckKind::WordValidity).unwrap();
        assert_eq!(validity.status, CheckStatus::Pass);
        assert!(validity.feedback.contains("No dictionary"));
    }

    #[test]
    fn fairness_score_counts_passes() {
        let mut c = silent();
        c.wordplay.indicator = "rising".into();
        let result = RuleAuditor::new().audit(&c, &ok());
        // "confused" also turns into filler once it stops being the indicator.
        let failed = result.failed_checks().count();
        assert!(failed >= 1);
        assert!((result.fairness_score - (10 - failed) as f64 / 10.0).abs() < 1e-9);
        assert!(!result.passed());
    }

    #[test]
    fn penalties_only_lower_scores() {
        let clean = RuleAuditor::new().audit(&silent(), &ok());

        let mut messy = silent();
        messy.surface_text = "Confused hearing with n, e, w is very much for quiet".into();
        let messy = RuleAuditor::new().audit(&messy, &ok());

        assert!(messy.technical_compliance < clean.technical_compliance);
        assert!(messy.narrative_naturalness < clean.narrative_naturalness);
        assert!(messy.fairness_score < clean.fairness_score);
    }

    #[test]
    fn difficulty_tracks_mechanism_and_brevity() {
        let hidden = clue(
            "UNIT",
            WordplayMechanism::HiddenWord,
            "modern unity",
            "in",
            "One in modern unity",
            "one",
        );
        let charade = clue(
            "CARPET",
            WordplayMechanism::Charade,
            "car + pet",
            "",
            "Rug for a car and pet owner at home",
            "rug",
        );
        let hidden = RuleAuditor::new().audit(&hidden, &ok()).difficulty_level;
        let charade = RuleAuditor::new().audit(&charade, &ok()).difficulty_level;
        assert!(hidden < charade);
        assert!((1..=5).contains(&hidden));
        assert!((1..=5).contains(&charade));
    }

    #[test]
    fn short_clean_surface_earns_brevity_bonus() {
        let result = RuleAuditor::new().audit(&silent(), &ok());
        assert_eq!(result.narrative_naturalness, 105);
    }
}
