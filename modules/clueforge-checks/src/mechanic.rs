use std::collections::BTreeMap;

use clueforge_common::{normalize, ClueCandidate, ValidationOutcome, WordplayComponents, WordplayMechanism};

type Validator = fn(&WordplayComponents, &str) -> ValidationOutcome;

/// Run the length check, then the mechanism's own check.
///
/// Both outcomes are always returned so feedback covers everything that is
/// wrong with an attempt.
pub fn validate(candidate: &ClueCandidate) -> Vec<ValidationOutcome> {
    let length = check_length(candidate);
    let answer = normalize(&candidate.target_answer);
    let mechanism = validator_for(candidate.mechanism)(&candidate.wordplay, &answer);
    vec![length, mechanism]
}

pub fn all_valid(outcomes: &[ValidationOutcome]) -> bool {
    outcomes.iter().all(|o| o.is_valid)
}

/// Failure messages joined for the next drafting prompt.
pub fn feedback_for(outcomes: &[ValidationOutcome]) -> String {
    outcomes
        .iter()
        .filter(|o| !o.is_valid)
        .map(|o| format!("{}: {}", o.check_name, o.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn validator_for(mechanism: WordplayMechanism) -> Validator {
    match mechanism {
        WordplayMechanism::Anagram => check_anagram,
        WordplayMechanism::HiddenWord => check_hidden_word,
        WordplayMechanism::Charade => check_charade,
        WordplayMechanism::Container => check_container,
        WordplayMechanism::Reversal => check_reversal,
        WordplayMechanism::Homophone => semantic_homophone,
        WordplayMechanism::DoubleDefinition => semantic_double_definition,
        WordplayMechanism::AllInOne => semantic_all_in_one,
    }
}

fn check_length(candidate: &ClueCandidate) -> ValidationOutcome {
    let expected = candidate.enumeration.total();
    let actual = normalize(&candidate.target_answer).len();
    if expected == actual {
        ValidationOutcome::pass("length", format!("Length matches: {actual}"))
    } else {
        ValidationOutcome::fail(
            "length",
            format!(
                "Length mismatch: enumeration {} needs {expected} letters, answer has {actual}",
                candidate.enumeration
            ),
        )
    }
}

fn letter_counts(s: &str) -> BTreeMap<char, usize> {
    let mut counts = BTreeMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

fn check_anagram(wordplay: &WordplayComponents, answer: &str) -> ValidationOutcome {
    let fodder = normalize(&wordplay.fodder);
    if fodder.is_empty() {
        return ValidationOutcome::fail("anagram", "No fodder provided for anagram");
    }

    let have = letter_counts(&fodder);
    let want = letter_counts(answer);
    if have == want {
        return ValidationOutcome::pass(
            "anagram",
            format!("Valid anagram: '{}' rearranges to {}", wordplay.fodder, answer.to_uppercase()),
        );
    }

    let mut missing = Vec::new();
    let mut extra = Vec::new();
    for (c, &n) in &want {
        let got = have.get(c).copied().unwrap_or(0);
        for _ in got..n {
            missing.push(c.to_ascii_uppercase().to_string());
        }
    }
    for (c, &n) in &have {
        let needed = want.get(c).copied().unwrap_or(0);
        for _ in needed..n {
            extra.push(c.to_ascii_uppercase().to_string());
        }
    }

    let mut detail = Vec::new();
    if !missing.is_empty() {
        detail.push(format!("missing {}", missing.join(", ")));
    }
    if !extra.is_empty() {
        detail.push(format!("extra {}", extra.join(", ")));
    }
    ValidationOutcome::fail(
        "anagram",
        format!(
            "'{}' does not rearrange to {}: {}",
            wordplay.fodder,
            answer.to_uppercase(),
            detail.join("; ")
        ),
    )
}

fn check_hidden_word(wordplay: &WordplayComponents, answer: &str) -> ValidationOutcome {
    let fodder = normalize(&wordplay.fodder);
    if fodder.is_empty() {
        return ValidationOutcome::fail("hidden_word", "No fodder provided for hidden word");
    }
    match fodder.find(answer) {
        Some(start) => ValidationOutcome::pass(
            "hidden_word",
            format!(
                "Valid hidden word: {} found in '{}' at letter {}",
                answer.to_uppercase(),
                wordplay.fodder,
                start + 1
            ),
        ),
        None => ValidationOutcome::fail(
            "hidden_word",
            format!(
                "{} is not a contiguous run of letters in '{}' ({fodder})",
                answer.to_uppercase(),
                wordplay.fodder
            ),
        ),
    }
}

fn check_charade(wordplay: &WordplayComponents, answer: &str) -> ValidationOutcome {
    let parts: Vec<String> = if wordplay.parts.is_empty() {
        wordplay
            .fodder
            .split(|c: char| c == '+' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        wordplay.parts.clone()
    };
    if parts.iter().all(|p| normalize(p).is_empty()) {
        return ValidationOutcome::fail("charade", "No parts provided for charade");
    }

    let joined: String = parts.iter().map(|p| normalize(p)).collect();
    let shown = parts.join(" + ");
    if joined == answer {
        return ValidationOutcome::pass(
            "charade",
            format!("Valid charade: {shown} = {}", answer.to_uppercase()),
        );
    }

    let diverge = joined
        .chars()
        .zip(answer.chars())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| joined.len().min(answer.len()));
    ValidationOutcome::fail(
        "charade",
        format!(
            "{shown} gives {} but answer is {}; first difference at letter {}",
            joined.to_uppercase(),
            answer.to_uppercase(),
            diverge + 1
        ),
    )
}

fn check_container(wordplay: &WordplayComponents, answer: &str) -> ValidationOutcome {
    let outer = wordplay.outer.as_deref().map(normalize).unwrap_or_default();
    let inner = wordplay.inner.as_deref().map(normalize).unwrap_or_default();
    if outer.is_empty() || inner.is_empty() {
        return ValidationOutcome::fail("container", "Missing 'outer' or 'inner' for container");
    }

    // Inserting at either end is a charade, but still a correct construction.
    for pos in 0..=outer.len() {
        let built = format!("{}{}{}", &outer[..pos], inner, &outer[pos..]);
        if built == answer {
            return ValidationOutcome::pass(
                "container",
                format!(
                    "Valid container: {} inside {} after letter {pos} = {}",
                    inner.to_uppercase(),
                    outer.to_uppercase(),
                    answer.to_uppercase()
                ),
            );
        }
    }

    let length_note = if outer.len() + inner.len() != answer.len() {
        format!(
            "; {} + {} letters cannot make {}",
            outer.len(),
            inner.len(),
            answer.len()
        )
    } else {
        String::new()
    };
    ValidationOutcome::fail(
        "container",
        format!(
            "No insertion of {} into {} produces {}{length_note}",
            inner.to_uppercase(),
            outer.to_uppercase(),
            answer.to_uppercase()
        ),
    )
}

fn check_reversal(wordplay: &WordplayComponents, answer: &str) -> ValidationOutcome {
    let fodder = normalize(&wordplay.fodder);
    if fodder.is_empty() {
        return ValidationOutcome::fail("reversal", "No word provided for reversal");
    }
    let reversed: String = fodder.chars().rev().collect();
    if reversed == answer {
        ValidationOutcome::pass(
            "reversal",
            format!("Valid reversal: '{}' reversed = {}", wordplay.fodder, answer.to_uppercase()),
        )
    } else {
        ValidationOutcome::fail(
            "reversal",
            format!(
                "'{}' reversed is {}, not {}",
                wordplay.fodder,
                reversed.to_uppercase(),
                answer.to_uppercase()
            ),
        )
    }
}

fn semantic_homophone(_: &WordplayComponents, _: &str) -> ValidationOutcome {
    ValidationOutcome::semantic("homophone", "Sound-alike cannot be checked mechanically")
}

fn semantic_double_definition(_: &WordplayComponents, _: &str) -> ValidationOutcome {
    ValidationOutcome::semantic("double_definition", "Two senses cannot be checked mechanically")
}

fn semantic_all_in_one(_: &WordplayComponents, _: &str) -> ValidationOutcome {
    ValidationOutcome::semantic("all_in_one", "&lit reading cannot be checked mechanically")
}

/// Cheap re-check before any surface work: the answer must sit letter-exact
/// in the fodder once spaces and hyphens are gone.
pub fn hidden_word_precheck(candidate: &ClueCandidate) -> Option<ValidationOutcome> {
    if candidate.mechanism != WordplayMechanism::HiddenWord {
        return None;
    }
    let squashed: String = candidate
        .wordplay
        .fodder
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_uppercase();
    let answer = candidate.target_answer.to_ascii_uppercase();
    if squashed.contains(&answer) {
        None
    } else {
        Some(ValidationOutcome::fail(
            "hidden_word_precheck",
            format!(
                "{answer} is not spelled out letter for letter in '{}'",
                candidate.wordplay.fodder
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(word: &str, mechanism: WordplayMechanism, wordplay: WordplayComponents) -> ClueCandidate {
        ClueCandidate::new(word, mechanism).unwrap().with_wordplay(wordplay)
    }

    fn fodder(text: &str) -> WordplayComponents {
        WordplayComponents {
            fodder: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn anagram_of_listen_is_silent() {
        let outcomes = validate(&candidate("SILENT", WordplayMechanism::Anagram, fodder("listen")));
        assert!(all_valid(&outcomes));
        assert_eq!(outcomes[0].check_name, "length");
    }

    #[test]
    fn anagram_failure_names_the_letters() {
        let outcomes = validate(&candidate("SILENT", WordplayMechanism::Anagram, fodder("lisqen")));
        let anagram = &outcomes[1];
        assert!(!anagram.is_valid);
        assert!(anagram.message.contains("missing T"), "{}", anagram.message);
        assert!(anagram.message.contains("extra Q"), "{}", anagram.message);
    }

    #[test]
    fn anagram_must_use_every_letter() {
        // Subset is not enough.
        let outcomes = validate(&candidate("SILENT", WordplayMechanism::Anagram, fodder("listens")));
        assert!(!outcomes[1].is_valid);
        assert!(outcomes[1].message.contains("extra S"));
    }

    #[test]
    fn anagram_letter_swap_breaks_it() {
        // "listen" -> swap one letter for a foreign one.
        let outcomes = validate(&candidate("SILENT", WordplayMechanism::Anagram, fodder("lister")));
        assert!(!outcomes[1].is_valid);
        assert!(outcomes[1].message.contains("missing N"));
        assert!(outcomes[1].message.contains("extra R"));
    }

    #[test]
    fn length_check_for_multiword_answer() {
        let ok = ClueCandidate::with_enumeration("ICE CREAM", WordplayMechanism::Charade, "(3,5)").unwrap();
        assert!(validate(&ok)[0].is_valid);

        let bad = ClueCandidate::with_enumeration("ICE CREAM", WordplayMechanism::Charade, "(7)").unwrap();
        let length = &validate(&bad)[0];
        assert!(!length.is_valid);
        assert!(length.message.contains("needs 7"));

        let also_ok = ClueCandidate::with_enumeration("ICE CREAM", WordplayMechanism::Charade, "(8)").unwrap();
        assert!(validate(&also_ok)[0].is_valid);
    }

    #[test]
    fn hidden_word_spans_word_boundary() {
        let c = candidate("UNIT", WordplayMechanism::HiddenWord, fodder("moderN UNITy"));
        assert!(all_valid(&validate(&c)));
        assert!(hidden_word_precheck(&c).is_none());

        let c = candidate("UNIT", WordplayMechanism::HiddenWord, fodder("modern city"));
        assert!(!validate(&c)[1].is_valid);
        assert!(hidden_word_precheck(&c).is_some());
    }

    #[test]
    fn hidden_word_precheck_ignores_other_mechanisms() {
        let c = candidate("SILENT", WordplayMechanism::Anagram, fodder("listen"));
        assert!(hidden_word_precheck(&c).is_none());
    }

    #[test]
    fn charade_order_matters() {
        let parts = |p: &[&str]| WordplayComponents {
            parts: p.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let c = candidate("PARTRIDGE", WordplayMechanism::Charade, parts(&["PART", "RIDGE"]));
        assert!(all_valid(&validate(&c)));

        let c = candidate("PARTRIDGE", WordplayMechanism::Charade, parts(&["RIDGE", "PART"]));
        let outcome = &validate(&c)[1];
        assert!(!outcome.is_valid);
        assert!(outcome.message.contains("first difference at letter 1"));
    }

    #[test]
    fn charade_falls_back_to_plus_separated_fodder() {
        let c = candidate("CARPET", WordplayMechanism::Charade, fodder("CAR + PET"));
        assert!(all_valid(&validate(&c)));
    }

    #[test]
    fn container_tries_every_position() {
        let wp = WordplayComponents {
            outer: Some("PAT".into()),
            inner: Some("AR".into()),
            ..Default::default()
        };
        let c = candidate("PARAT", WordplayMechanism::Container, wp);
        assert!(all_valid(&validate(&c)));

        let wp = WordplayComponents {
            outer: Some("BEAD".into()),
            inner: Some("R".into()),
            ..Default::default()
        };
        let c = candidate("BREAD", WordplayMechanism::Container, wp.clone());
        assert!(all_valid(&validate(&c)));

        let c = candidate("BEARD", WordplayMechanism::Container, wp.clone());
        assert!(all_valid(&validate(&c)));

        let c = candidate("BRAED", WordplayMechanism::Container, wp);
        assert!(!validate(&c)[1].is_valid);
    }

    #[test]
    fn container_needs_both_halves() {
        let wp = WordplayComponents {
            outer: Some("BEAD".into()),
            ..Default::default()
        };
        let outcome = &validate(&candidate("BREAD", WordplayMechanism::Container, wp))[1];
        assert!(!outcome.is_valid);
        assert!(outcome.message.contains("Missing"));
    }

    #[test]
    fn reversal_reports_what_it_got() {
        let c = candidate("STAR", WordplayMechanism::Reversal, fodder("rats"));
        assert!(all_valid(&validate(&c)));

        let c = candidate("STAR", WordplayMechanism::Reversal, fodder("tars"));
        let outcome = &validate(&c)[1];
        assert!(!outcome.is_valid);
        assert!(outcome.message.contains("SRAT"));
    }

    #[test]
    fn semantic_mechanisms_pass_with_flag() {
        for mechanism in [
            WordplayMechanism::Homophone,
            WordplayMechanism::DoubleDefinition,
            WordplayMechanism::AllInOne,
        ] {
            let outcomes = validate(&candidate("KNIGHT", mechanism, WordplayComponents::default()));
            assert!(outcomes[1].is_valid);
            assert!(outcomes[1].requires_semantic_check);
        }
    }

    #[test]
    fn feedback_joins_only_failures() {
        let bad = ClueCandidate::with_enumeration("SILENT", WordplayMechanism::Anagram, "(5)")
            .unwrap()
            .with_wordplay(fodder("listed"));
        let outcomes = validate(&bad);
        let feedback = feedback_for(&outcomes);
        assert!(feedback.contains("length:"));
        assert!(feedback.contains("anagram:"));
        assert_eq!(feedback.lines().count(), 2);
    }
}
