use clueforge_common::{normalize, ClueCandidate, ValidationOutcome};
use regex::Regex;

/// Post-conditions on a polished surface. Any failure rejects the attempt.
pub fn check_surface(candidate: &ClueCandidate) -> Vec<ValidationOutcome> {
    vec![
        non_empty(candidate),
        answer_hidden(candidate),
        definition_present(candidate),
        definition_not_fodder(candidate),
    ]
}

fn non_empty(candidate: &ClueCandidate) -> ValidationOutcome {
    if normalize(&candidate.surface_text).is_empty() {
        ValidationOutcome::fail("surface_present", "Surface text is empty")
    } else {
        ValidationOutcome::pass("surface_present", "Surface text present")
    }
}

/// Whole-word pattern for the answer. Multi-word answers may be split by
/// spaces, hyphens or apostrophes exactly where the enumeration splits them.
fn answer_pattern(candidate: &ClueCandidate) -> String {
    let answer = candidate.target_answer.as_str();
    let parts = candidate.enumeration.parts();
    let mut pieces = Vec::with_capacity(parts.len());
    let mut rest = answer;
    for &len in parts {
        if len > rest.len() {
            break;
        }
        let (piece, tail) = rest.split_at(len);
        pieces.push(regex::escape(piece));
        rest = tail;
    }
    if pieces.is_empty() || !rest.is_empty() {
        return format!(r"(?i)\b{}\b", regex::escape(answer));
    }
    format!(r"(?i)\b{}\b", pieces.join(r"[\s'\-]*"))
}

fn answer_hidden(candidate: &ClueCandidate) -> ValidationOutcome {
    let answer = &candidate.target_answer;
    let visible = Regex::new(&answer_pattern(candidate))
        .map(|re| re.is_match(&candidate.surface_text))
        .unwrap_or(false);
    if visible {
        ValidationOutcome::fail(
            "answer_hidden",
            format!("Surface gives the answer away: {answer} appears as a word"),
        )
    } else {
        ValidationOutcome::pass("answer_hidden", "Answer does not appear in the surface")
    }
}

fn definition_present(candidate: &ClueCandidate) -> ValidationOutcome {
    let definition = candidate.definition_span.trim();
    if definition.is_empty() {
        return ValidationOutcome::fail("definition_present", "No definition span given");
    }
    if candidate
        .surface_text
        .to_lowercase()
        .contains(&definition.to_lowercase())
    {
        ValidationOutcome::pass("definition_present", format!("Definition '{definition}' found"))
    } else {
        ValidationOutcome::fail(
            "definition_present",
            format!("Definition '{definition}' does not appear in the surface"),
        )
    }
}

fn definition_not_fodder(candidate: &ClueCandidate) -> ValidationOutcome {
    let fodder = normalize(&candidate.wordplay.fodder);
    if !fodder.is_empty() && normalize(&candidate.definition_span) == fodder {
        ValidationOutcome::fail(
            "definition_not_fodder",
            format!(
                "Definition '{}' is the wordplay fodder; use a synonym of the answer",
                candidate.definition_span
            ),
        )
    } else {
        ValidationOutcome::pass("definition_not_fodder", "Definition is distinct from fodder")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clueforge_common::{WordplayComponents, WordplayMechanism};

    fn silent(surface: &str, definition: &str) -> ClueCandidate {
        ClueCandidate::new("SILENT", WordplayMechanism::Anagram)
            .unwrap()
            .with_wordplay(WordplayComponents {
                fodder: "listen".into(),
                indicator: "confused".into(),
                ..Default::default()
            })
            .with_surface(surface, definition)
    }

    #[test]
    fn good_surface_passes_every_guard() {
        let outcomes = check_surface(&silent("Confused listen for quiet (6)", "quiet"));
        assert!(outcomes.iter().all(|o| o.is_valid));
    }

    #[test]
    fn answer_in_surface_is_rejected() {
        let outcomes = check_surface(&silent("Silent, confused listen (6)", "quiet"));
        assert!(!outcomes[1].is_valid);
    }

    #[test]
    fn answer_inside_longer_word_is_fine() {
        let outcomes = check_surface(&silent("Silently confused listen for quiet", "quiet"));
        assert!(outcomes[1].is_valid);
    }

    #[test]
    fn multi_word_answer_in_surface_is_rejected() {
        let clue = |surface: &str| {
            ClueCandidate::new("ICE CREAM", WordplayMechanism::Charade)
                .unwrap()
                .with_surface(surface, "dessert")
        };
        assert!(!check_surface(&clue("Ice cream dessert (3,5)"))[1].is_valid);
        assert!(!check_surface(&clue("Ice-cream dessert (3,5)"))[1].is_valid);
        assert!(!check_surface(&clue("Icecream dessert (3,5)"))[1].is_valid);
        assert!(check_surface(&clue("Nice creamy dessert (3,5)"))[1].is_valid);
    }

    #[test]
    fn definition_must_be_in_surface() {
        let outcomes = check_surface(&silent("Confused listen for calm", "quiet"));
        assert!(!outcomes[2].is_valid);
    }

    #[test]
    fn definition_cannot_be_the_fodder() {
        let outcomes = check_surface(&silent("Confused, listen!", "listen"));
        assert!(!outcomes[3].is_valid);
    }

    #[test]
    fn empty_surface_fails() {
        let outcomes = check_surface(&silent("  (6) ", "quiet"));
        assert!(!outcomes[0].is_valid);
    }
}
