//! Text-analysis seam.
//!
//! Natural-language analysis is a black box to the extraction pipeline:
//! functions from text to a score or label, nothing more. [`TextAnalyzer`]
//! is the seam; [`HeuristicAnalyzer`] is the built-in deterministic
//! implementation, deliberately lexicon-light so the crate carries no NLP
//! dependency. Callers with real models implement the trait.

use regex::Regex;

use crate::content::Entity;

/// Black-box text analysis functions consulted by the orchestrator when the
/// matching extraction options are enabled.
pub trait TextAnalyzer: Send + Sync {
    /// Sentiment in `[-1, 1]`; 0 is neutral.
    fn sentiment(&self, text: &str) -> f64;

    /// Named entities mentioned in the text.
    fn entities(&self, text: &str) -> Vec<Entity>;

    /// Best-guess ISO 639-1 language code.
    fn language(&self, text: &str) -> Option<String>;

    /// Readability score in `[0, 100]`, higher meaning easier.
    fn readability(&self, text: &str) -> f64;
}

/// Deterministic, dependency-free analyzer.
pub struct HeuristicAnalyzer;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "best", "love", "happy", "success", "improve", "win", "benefit", "easy", "clear",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "worst", "hate", "fail", "failure", "problem", "difficult", "wrong", "loss", "risk", "hard", "broken",
];

/// Function words used for language identification, per language.
const STOPWORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "of", "to", "is", "that", "with", "for"]),
    ("es", &["el", "la", "los", "las", "que", "para", "una", "por"]),
    ("fr", &["le", "la", "les", "des", "est", "dans", "pour", "que"]),
    ("de", &["der", "die", "das", "und", "ist", "nicht", "mit", "ein"]),
];

impl TextAnalyzer for HeuristicAnalyzer {
    fn sentiment(&self, text: &str) -> f64 {
        let mut positive = 0usize;
        let mut negative = 0usize;
        for word in text.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if POSITIVE_WORDS.contains(&word.as_str()) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                negative += 1;
            }
        }
        let total = positive + negative;
        if total == 0 { 0.0 } else { (positive as f64 - negative as f64) / total as f64 }
    }

    fn entities(&self, text: &str) -> Vec<Entity> {
        // Capitalized runs that do not open a sentence are treated as proper nouns.
        let pattern = Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").unwrap();
        let mut entities: Vec<Entity> = Vec::new();
        for m in pattern.find_iter(text) {
            let at_sentence_start = text[..m.start()]
                .trim_end()
                .chars()
                .last()
                .map_or(true, |c| matches!(c, '.' | '!' | '?'));
            if at_sentence_start && !m.as_str().contains(' ') {
                continue;
            }
            if entities.iter().any(|e| e.text == m.as_str()) {
                continue;
            }
            entities.push(Entity { text: m.as_str().to_string(), kind: "proper-noun".to_string() });
        }
        entities
    }

    fn language(&self, text: &str) -> Option<String> {
        let words: Vec<String> = text
            .split_whitespace()
            .take(500)
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .collect();
        if words.is_empty() {
            return None;
        }

        let mut best: Option<(&str, usize)> = None;
        for (code, stopwords) in STOPWORDS {
            let hits = words.iter().filter(|w| stopwords.contains(&w.as_str())).count();
            if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
                best = Some((code, hits));
            }
        }
        best.map(|(code, _)| code.to_string())
    }

    fn readability(&self, text: &str) -> f64 {
        let sentences = text.split(['.', '!', '?']).filter(|s| !s.trim().is_empty()).count().max(1);
        let words: Vec<&str> = text.split_whitespace().collect();
        let word_count = words.len().max(1);
        let syllables: usize = words.iter().map(|w| estimate_syllables(w)).sum();

        // Flesch reading ease over estimated syllables.
        let words_per_sentence = word_count as f64 / sentences as f64;
        let syllables_per_word = syllables as f64 / word_count as f64;
        (206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word).clamp(0.0, 100.0)
    }
}

fn estimate_syllables(word: &str) -> usize {
    let mut count = 0usize;
    let mut previous_was_vowel = false;
    for c in word.to_lowercase().chars() {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = is_vowel;
    }
    count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_polarity() {
        let analyzer = HeuristicAnalyzer;
        assert!(analyzer.sentiment("This is a great, excellent result that everyone will love") > 0.0);
        assert!(analyzer.sentiment("A bad outcome, the worst failure imaginable") < 0.0);
        assert_eq!(analyzer.sentiment("Plain descriptive text about nothing"), 0.0);
    }

    #[test]
    fn test_entities_skip_sentence_leads() {
        let analyzer = HeuristicAnalyzer;
        let entities = analyzer.entities("Yesterday the delegation met Maria Fernandez in Lisbon. Later they left.");
        let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();

        assert!(texts.contains(&"Maria Fernandez"));
        assert!(texts.contains(&"Lisbon"));
        assert!(!texts.contains(&"Later"));
    }

    #[test]
    fn test_language_identification() {
        let analyzer = HeuristicAnalyzer;
        assert_eq!(
            analyzer.language("the quick brown fox jumps over the lazy dog and that is that"),
            Some("en".to_string())
        );
        assert_eq!(analyzer.language("el rio pasa por la ciudad y las calles que van por el centro"), Some("es".to_string()));
        assert_eq!(analyzer.language(""), None);
    }

    #[test]
    fn test_readability_prefers_short_sentences() {
        let analyzer = HeuristicAnalyzer;
        let simple = "The cat sat. The dog ran. It was fun.";
        let complex = "Notwithstanding institutional considerations, the comprehensive interdepartmental reorganization necessitated extraordinarily complicated administrative procedures.";
        assert!(analyzer.readability(simple) > analyzer.readability(complex));
    }
}
