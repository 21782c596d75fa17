use std::collections::BTreeSet;
use std::sync::LazyLock;

use clueforge_common::{normalize, AuditCheck, AuditCheckKind, CheckStatus, ClueCandidate, WordplayMechanism};
use regex::Regex;

use super::DoubleDutyVerdict;
use crate::lexicon::{
    is_extended_abbreviation, is_known_abbreviation, is_priority_abbreviation, Lexicon,
    ALLOWED_CONNECTORS, COMMON_TWO_LETTER, CONNECTOR_BUDGET, DIRECTIONAL_BLOCKLIST,
    NON_PARTICIPLE_ED, NOUN_INDICATORS, SHORT_ABBREVIATIONS,
};

pub(super) static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-z]+\b").unwrap());
static RE_WORD_2PLUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-z]{2,}\b").unwrap());
pub(super) static RE_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{1,4}\b").unwrap());

static RE_BLOCKLIST: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    DIRECTIONAL_BLOCKLIST
        .iter()
        .map(|term| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))).unwrap();
            (*term, re)
        })
        .collect()
});

static RE_LISTING: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b[a-z]\s*,\s*[a-z]\b",
        r"\b[a-z]\s*,\s*[a-z]\s*,\s*[a-z]\b",
        r"\bwith\s+[a-z]{1,2}\s*,",
        r"\bfrom\s+[a-z]{1,2}\s*,",
        r"\bhas\s+[a-z]{1,2}\s*,",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RE_MECHANISM_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:reverse of|anagram of|hidden in) ([a-z]+)").unwrap());

pub(super) fn words(text: &str) -> BTreeSet<String> {
    RE_WORD
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

fn check(kind: AuditCheckKind, status: CheckStatus, feedback: impl Into<String>) -> AuditCheck {
    AuditCheck {
        kind,
        status,
        feedback: feedback.into(),
    }
}

/// Grid-only direction words in the indicator. Fodder and mechanism text
/// are never scanned.
pub(super) fn direction(candidate: &ClueCandidate) -> AuditCheck {
    let indicator = &candidate.wordplay.indicator;
    let hits: Vec<&str> = RE_BLOCKLIST
        .iter()
        .filter(|(_, re)| re.is_match(indicator))
        .map(|(term, _)| *term)
        .collect();

    if hits.is_empty() {
        check(AuditCheckKind::Direction, CheckStatus::Pass, "No down-only indicator")
    } else {
        check(
            AuditCheckKind::Direction,
            CheckStatus::Fail,
            format!(
                "Indicator uses down-only direction word(s): {}. Clues are shown outside a grid; use an orientation-neutral indicator",
                hits.join(", ")
            ),
        )
    }
}

/// The judge decides; two structural facts override it. A word that sits in
/// both the definition and the indicator is always double duty, and a
/// definition sharing no word with the indicator can never be.
pub(super) fn double_duty(candidate: &ClueCandidate, verdict: &DoubleDutyVerdict) -> AuditCheck {
    let definition = words(&candidate.definition_span);
    let indicator = words(&candidate.wordplay.indicator);
    let shared: Vec<&String> = definition
        .intersection(&indicator)
        .filter(|w| w.len() > 2)
        .collect();

    if !shared.is_empty() {
        let shared: Vec<&str> = shared.iter().map(|s| s.as_str()).collect();
        return check(
            AuditCheckKind::DoubleDuty,
            CheckStatus::Fail,
            format!(
                "'{}' is both definition and indicator; give each role its own words",
                shared.join(" ")
            ),
        );
    }

    if verdict.passed {
        return check(AuditCheckKind::DoubleDuty, CheckStatus::Pass, verdict.feedback.clone());
    }

    if definition.is_empty() || indicator.is_empty() || definition.is_disjoint(&indicator) {
        return check(
            AuditCheckKind::DoubleDuty,
            CheckStatus::Warn,
            format!(
                "Judge flagged double duty, but definition and indicator share no word: {}",
                verdict.feedback
            ),
        );
    }

    check(AuditCheckKind::DoubleDuty, CheckStatus::Fail, verdict.feedback.clone())
}

pub(super) fn indicator_fairness(candidate: &ClueCandidate) -> AuditCheck {
    if candidate.mechanism == WordplayMechanism::Anagram {
        let indicator = words(&candidate.wordplay.indicator);
        if let Some(noun) = NOUN_INDICATORS.iter().find(|n| indicator.contains(**n)) {
            return check(
                AuditCheckKind::IndicatorFairness,
                CheckStatus::Fail,
                format!(
                    "Anagram indicator uses the noun '{noun}'; prefer a verb or participle such as 'mixed' or 'scrambled'"
                ),
            );
        }
    }
    check(AuditCheckKind::IndicatorFairness, CheckStatus::Pass, "Indicator is fair")
}

/// The answer, or an obvious inflection of it, must not sit in the wordplay.
pub(super) fn identity(candidate: &ClueCandidate) -> AuditCheck {
    let wp = &candidate.wordplay;
    let material = if !wp.fodder.trim().is_empty() {
        wp.fodder.clone()
    } else if !wp.parts.is_empty() {
        wp.parts.join(" ")
    } else {
        format!(
            "{} {}",
            wp.outer.as_deref().unwrap_or_default(),
            wp.inner.as_deref().unwrap_or_default()
        )
    };
    let answer = normalize(&candidate.target_answer);
    if normalize(&material).is_empty() || answer.is_empty() {
        return check(AuditCheckKind::Identity, CheckStatus::Pass, "No wordplay material to check");
    }

    let mut forms = vec![answer.clone()];
    if answer.len() > 3 {
        forms.push(format!("{answer}s"));
        forms.push(format!("{answer}ed"));
        forms.push(format!("{answer}ing"));
        if let Some(stem) = answer.strip_suffix('e') {
            forms.push(format!("{stem}ed"));
            forms.push(format!("{stem}ing"));
        }
    }

    // A hidden word must be in its fodder, so only a fodder word that *is*
    // the answer counts against it.
    let offender = if candidate.mechanism == WordplayMechanism::HiddenWord {
        let fodder_words: Vec<String> = material.split_whitespace().map(normalize).collect();
        forms
            .iter()
            .find(|form| fodder_words.iter().any(|w| w == *form))
            .cloned()
    } else {
        let squashed = normalize(&material);
        forms.iter().find(|form| squashed.contains(form.as_str())).cloned()
    };

    match offender {
        Some(form) if candidate.mechanism == WordplayMechanism::HiddenWord => check(
            AuditCheckKind::Identity,
            CheckStatus::Fail,
            format!(
                "Hidden-word fodder '{material}' contains '{form}' as a whole word; conceal the answer across word boundaries"
            ),
        ),
        Some(form) => check(
            AuditCheckKind::Identity,
            CheckStatus::Fail,
            format!("Answer form '{form}' appears in the wordplay material '{material}'"),
        ),
        None => check(
            AuditCheckKind::Identity,
            CheckStatus::Pass,
            format!("{} does not appear in the wordplay", candidate.target_answer),
        ),
    }
}

/// Every substantial fodder word must be physically present in the surface.
pub(super) fn fodder_presence(candidate: &ClueCandidate) -> AuditCheck {
    let surface = words(&candidate.surface_text);
    let missing: Vec<String> = words(&candidate.wordplay.fodder)
        .into_iter()
        .filter(|w| w.len() > 2 && !surface.contains(w))
        .collect();

    if missing.is_empty() {
        check(AuditCheckKind::FodderPresence, CheckStatus::Pass, "All fodder words appear in the surface")
    } else {
        check(
            AuditCheckKind::FodderPresence,
            CheckStatus::Fail,
            format!(
                "Fodder word(s) missing from the surface: {}. Fodder must appear verbatim, not as a synonym",
                missing.join(", ")
            ),
        )
    }
}

pub(super) fn filler_budget(candidate: &ClueCandidate) -> AuditCheck {
    let mut functional = words(&candidate.definition_span);
    functional.extend(words(&candidate.wordplay.fodder));
    functional.extend(words(&candidate.wordplay.indicator));

    // Connectors are counted per occurrence; fillers are reported once each.
    let surface = candidate.surface_text.to_lowercase();
    let (connectors, fillers): (Vec<&str>, Vec<&str>) = RE_WORD
        .find_iter(&surface)
        .map(|m| m.as_str())
        .filter(|w| !functional.contains(*w))
        .partition(|w| ALLOWED_CONNECTORS.contains(w));
    let fillers: Vec<&str> = fillers.into_iter().collect::<BTreeSet<_>>().into_iter().collect();

    if connectors.len() > CONNECTOR_BUDGET {
        return check(
            AuditCheckKind::FillerBudget,
            CheckStatus::Fail,
            format!(
                "Too many connectors ({}): {}. Use at most {CONNECTOR_BUDGET}",
                connectors.len(),
                connectors.join(", ")
            ),
        );
    }
    if !fillers.is_empty() {
        return check(
            AuditCheckKind::FillerBudget,
            CheckStatus::Fail,
            format!(
                "Filler word(s) with no role: {}. Every word must be definition, fodder, indicator or a connector",
                fillers.join(", ")
            ),
        );
    }
    check(
        AuditCheckKind::FillerBudget,
        CheckStatus::Pass,
        format!("Economical surface ({} connector(s))", connectors.len()),
    )
}

/// Participial indicators read as state, not instruction, when they trail an
/// anagram's fodder. In front of the fodder they are attributive and fine.
pub(super) fn indicator_grammar(candidate: &ClueCandidate) -> AuditCheck {
    let surface = candidate.surface_text.to_lowercase();
    let indicator = candidate.wordplay.indicator.trim().to_lowercase();
    let fodder = candidate.wordplay.fodder.trim().to_lowercase();

    if indicator.is_empty() || fodder.is_empty() {
        return check(AuditCheckKind::IndicatorGrammar, CheckStatus::Pass, "No indicator or fodder to place");
    }
    let (Some(indicator_pos), Some(fodder_pos)) = (surface.find(&indicator), surface.find(&fodder)) else {
        return check(
            AuditCheckKind::IndicatorGrammar,
            CheckStatus::Pass,
            "Indicator or fodder position not found in surface",
        );
    };

    let participles: Vec<&str> = indicator
        .split_whitespace()
        .filter(|w| w.len() > 3 && w.ends_with("ed") && !NON_PARTICIPLE_ED.contains(w))
        .collect();
    if participles.is_empty() {
        return check(AuditCheckKind::IndicatorGrammar, CheckStatus::Pass, "Indicator is imperative");
    }

    if indicator_pos < fodder_pos {
        check(
            AuditCheckKind::IndicatorGrammar,
            CheckStatus::Pass,
            format!("Participle '{indicator}' precedes the fodder (attributive)"),
        )
    } else if candidate.mechanism == WordplayMechanism::Anagram {
        check(
            AuditCheckKind::IndicatorGrammar,
            CheckStatus::Fail,
            format!(
                "Participle '{indicator}' follows the anagram fodder; use an imperative ('mix', not 'mixed') or move it before the fodder"
            ),
        )
    } else {
        check(
            AuditCheckKind::IndicatorGrammar,
            CheckStatus::Pass,
            format!("Participle '{indicator}' after fodder is acceptable for {}", candidate.mechanism),
        )
    }
}

/// Catch surfaces that list machinery ("with n, e, w") instead of reading as
/// English.
pub(super) fn narrative_integrity(candidate: &ClueCandidate, lexicon: Option<&dyn Lexicon>) -> AuditCheck {
    if let (WordplayMechanism::Anagram, Some(lexicon)) = (candidate.mechanism, lexicon) {
        let gibberish: Vec<String> = candidate
            .wordplay
            .fodder
            .to_lowercase()
            .split_whitespace()
            .filter(|w| !(w.len() <= 2 && SHORT_ABBREVIATIONS.contains(w)))
            .filter(|w| !lexicon.contains(w))
            .map(str::to_string)
            .collect();
        if !gibberish.is_empty() {
            return check(
                AuditCheckKind::NarrativeIntegrity,
                CheckStatus::Fail,
                format!(
                    "Anagram fodder contains non-words: {}. Anagram fodder must be real words",
                    gibberish.join(", ")
                ),
            );
        }
    }

    let surface = candidate.surface_text.to_lowercase();
    if let Some(m) = RE_LISTING.iter().find_map(|re| re.find(&surface)) {
        return check(
            AuditCheckKind::NarrativeIntegrity,
            CheckStatus::Fail,
            format!(
                "Surface lists letters literally: '{}'. Mask single letters with standard abbreviations (N as 'knight', EN as 'nurse')",
                m.as_str()
            ),
        );
    }

    let suspicious: Vec<&str> = RE_WORD
        .find_iter(&surface)
        .map(|m| m.as_str())
        .filter(|t| t.len() == 2 && !COMMON_TWO_LETTER.contains(t))
        .collect();
    if !suspicious.is_empty() && surface.contains(',') {
        return check(
            AuditCheckKind::NarrativeIntegrity,
            CheckStatus::Warn,
            format!("Possible unmasked abbreviations: {}", suspicious.join(", ")),
        );
    }

    check(AuditCheckKind::NarrativeIntegrity, CheckStatus::Pass, "Surface reads naturally")
}

pub(super) fn obscurity(candidate: &ClueCandidate, lexicon: Option<&dyn Lexicon>) -> AuditCheck {
    if let Some(lexicon) = lexicon {
        if candidate.mechanism == WordplayMechanism::Reversal {
            let non_words: Vec<String> = RE_WORD
                .find_iter(&candidate.wordplay.fodder.to_lowercase())
                .map(|m| m.as_str().to_string())
                .filter(|w| w.len() > 2 && !lexicon.contains(w))
                .collect();
            if !non_words.is_empty() {
                return check(
                    AuditCheckKind::Obscurity,
                    CheckStatus::Fail,
                    format!(
                        "Reversal fodder is not a word: {}. Both directions must be real words; pick another mechanism",
                        non_words.join(", ")
                    ),
                );
            }
        }

        let description = candidate.wordplay.mechanism_description.to_lowercase();
        if let Some(word) = RE_MECHANISM_WORD
            .captures_iter(&description)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|w| w.len() > 3 && !lexicon.contains(w))
        {
            return check(
                AuditCheckKind::Obscurity,
                CheckStatus::Fail,
                format!("Mechanism relies on the non-word '{word}'"),
            );
        }
    }

    let fodder = candidate.wordplay.fodder.to_uppercase();
    let mut flagged = Vec::new();
    for fragment in RE_FRAGMENT.find_iter(&fodder).map(|m| m.as_str()) {
        if fragment.len() > 3 || is_priority_abbreviation(fragment) {
            continue;
        }
        if is_extended_abbreviation(fragment) {
            flagged.push(format!("{fragment} (extended)"));
        } else if !lexicon.is_some_and(|l| l.contains(fragment)) {
            flagged.push(fragment.to_string());
        }
    }
    if !flagged.is_empty() {
        return check(
            AuditCheckKind::Obscurity,
            CheckStatus::Warn,
            format!(
                "Non-priority abbreviations: {}. Prefer Roman numerals, elements, compass points, chess and titles",
                flagged.join(", ")
            ),
        );
    }

    check(AuditCheckKind::Obscurity, CheckStatus::Pass, "Abbreviations are standard")
}

pub(super) fn word_validity(candidate: &ClueCandidate, lexicon: Option<&dyn Lexicon>) -> AuditCheck {
    let Some(lexicon) = lexicon else {
        return check(
            AuditCheckKind::WordValidity,
            CheckStatus::Pass,
            "No dictionary configured; word validity not checked",
        );
    };

    let non_words: Vec<String> = RE_WORD_2PLUS
        .find_iter(&candidate.wordplay.fodder.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|w| w.len() >= 3 && !is_known_abbreviation(w) && !lexicon.contains(w))
        .collect();

    if non_words.is_empty() {
        return check(AuditCheckKind::WordValidity, CheckStatus::Pass, "Fodder words are in the dictionary");
    }

    let guidance = match candidate.mechanism {
        WordplayMechanism::Reversal => {
            "For reversals both the fodder and its reverse must be words ('lager' gives REGAL); otherwise switch to a charade, hidden word or anagram"
        }
        WordplayMechanism::Container => {
            "For containers both outer and inner must be words (IN inside PAT gives PAINT)"
        }
        _ => "Every piece of fodder must be a dictionary word",
    };
    check(
        AuditCheckKind::WordValidity,
        CheckStatus::Fail,
        format!("Fodder has non-dictionary words: {}. {guidance}", non_words.join(", ")),
    )
}
