//! Verdicts on detective responses.
//!
//! The detective never reports a structured verdict; it only speaks. A
//! response counts as "caught" when it contains one of a fixed set of catch
//! phrases, compared case-insensitively as plain substrings. This is crude on
//! purpose: a phrase used as flavour text ("I'll admit, the coffee is bad")
//! still ends the game.

/// Outcome of inspecting one detective response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Caught,
    NotCaught,
}

/// Decides whether a detective response declares the player caught.
pub trait OutcomeClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Verdict;
}

pub const DEFAULT_CATCH_PHRASES: &[&str] = &[
    "caught you",
    "lying",
    "contradiction",
    "guilty",
    "confess",
    "admit",
    "proven",
    "confirmed",
    "definitely",
    "clearly",
    "definitive",
    "conclusive",
    "irrefutable",
    "undeniable",
    "caught red-handed",
    "beyond doubt",
    "proven guilty",
    "you're under arrest",
    "case closed",
    "evidence is clear",
    "no more lies",
    "we have you",
    "it's over",
];

/// Substring matcher over a lower-cased phrase list.
#[derive(Debug, Clone)]
pub struct PhraseClassifier {
    phrases: Vec<String>,
}

impl PhraseClassifier {
    pub fn new() -> Self {
        Self::with_phrases(DEFAULT_CATCH_PHRASES.iter().copied())
    }

    /// Builds a classifier over a custom phrase set. Empty phrases are dropped.
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// The first phrase found in `text`, if any.
    pub fn matched_phrase(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lower.contains(phrase.as_str()))
            .map(String::as_str)
    }
}

impl Default for PhraseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeClassifier for PhraseClassifier {
    fn classify(&self, text: &str) -> Verdict {
        match self.matched_phrase(text) {
            Some(phrase) => {
                tracing::debug!(phrase, "catch phrase matched");
                Verdict::Caught
            }
            None => Verdict::NotCaught,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_phrase_is_case_insensitive() {
        let classifier = PhraseClassifier::new();
        assert_eq!(
            classifier.classify("That's a lie, WE HAVE YOU on camera"),
            Verdict::Caught
        );
        assert_eq!(
            classifier.matched_phrase("That's a lie, we have you on camera"),
            Some("we have you")
        );
    }

    #[test]
    fn test_plain_question_is_not_caught() {
        let classifier = PhraseClassifier::new();
        assert_eq!(
            classifier.classify("Where were you at 9pm?"),
            Verdict::NotCaught
        );
    }

    #[test]
    fn test_flavour_text_still_matches() {
        let classifier = PhraseClassifier::new();
        assert_eq!(
            classifier.classify("I'll admit the coffee here is terrible. Where next?"),
            Verdict::Caught
        );
    }

    #[test]
    fn test_custom_phrases() {
        let classifier = PhraseClassifier::with_phrases(["Gotcha", "  "]);
        assert_eq!(classifier.classify("gotcha!"), Verdict::Caught);
        assert_eq!(classifier.classify("you are lying"), Verdict::NotCaught);
    }
}
