/// Lowercase and drop everything that is not an ASCII letter.
///
/// Every equality or containment comparison between clue material goes
/// through this, so "moderN UNITy", "modern-unity" and "MODERNUNITY" agree.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Uppercase letters only; the canonical form of an answer.
pub fn letters_only(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
