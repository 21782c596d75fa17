use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};

use clueforge_common::{ClueCandidate, Publication};

/// `{mechanism}_{hash}_{ANSWER}`, stable for a given answer and surface.
pub fn clue_id(candidate: &ClueCandidate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(candidate.target_answer.as_bytes());
    hasher.update(b"\n");
    hasher.update(candidate.surface_text.trim().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!(
        "{}_{}_{}",
        candidate.mechanism.slug().replace('_', ""),
        &digest[..12],
        candidate.target_answer
    )
}

/// A shuffled permutation of `0..length`.
pub fn reveal_order<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..length).collect();
    order.shuffle(rng);
    order
}

pub fn publish(candidate: &ClueCandidate) -> Publication {
    let length = candidate.target_answer.len();
    Publication {
        clue_id: clue_id(candidate),
        clue: candidate.clue_with_enumeration(),
        length,
        reveal_order: reveal_order(length, &mut rand::rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clueforge_common::WordplayMechanism;

    fn silent() -> ClueCandidate {
        ClueCandidate::new("SILENT", WordplayMechanism::HiddenWord)
            .unwrap()
            .with_surface("Confused listen for quiet", "quiet")
    }

    #[test]
    fn clue_id_names_mechanism_and_answer() {
        let id = clue_id(&silent());
        let pieces: Vec<&str> = id.split('_').collect();
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0], "hiddenword");
        assert_eq!(pieces[1].len(), 12);
        assert_eq!(pieces[2], "SILENT");
    }

    #[test]
    fn clue_id_is_stable_and_surface_sensitive() {
        assert_eq!(clue_id(&silent()), clue_id(&silent()));
        let other = silent().with_surface("Listen, disturbed, goes quiet", "quiet");
        assert_ne!(clue_id(&silent()), clue_id(&other));
    }

    #[test]
    fn reveal_order_is_a_permutation() {
        let mut order = reveal_order(9, &mut rand::rng());
        order.sort_unstable();
        assert_eq!(order, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn published_clue_carries_enumeration() {
        let publication = publish(&silent());
        assert_eq!(publication.clue, "Confused listen for quiet (6)");
        assert_eq!(publication.length, 6);
        assert_eq!(publication.reveal_order.len(), 6);
    }
}
