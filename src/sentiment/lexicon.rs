//! Marker-word sentiment provider.
//!
//! Counts positive and negative marker words, flipping a marker's polarity
//! when it directly follows a negator ("not happy"). Needs no model files and
//! is fully deterministic.

use anyhow::Result;

use super::{Sentiment, SentimentClassifier};

const POSITIVE_MARKERS: &[&str] = &[
    "accomplished", "amazing", "appreciate", "awesome", "beautiful", "best", "better",
    "blessed", "calm", "celebrate", "confident", "delighted", "enjoy", "enjoyed",
    "excited", "fantastic", "fun", "glad", "good", "grateful", "great", "happy",
    "hopeful", "joy", "laugh", "laughed", "love", "loved", "peaceful", "pleased",
    "proud", "relaxed", "relieved", "smile", "smiled", "smiling", "success", "thankful",
    "win", "won", "wonderful",
];

const NEGATIVE_MARKERS: &[&str] = &[
    "afraid", "alone", "angry", "anxiety", "anxious", "awful", "bad", "cried", "cry",
    "crying", "depressed", "disappointed", "exhausted", "failed", "failure", "fear",
    "frustrated", "guilty", "hate", "hated", "hopeless", "horrible", "hurt", "lonely",
    "miserable", "overwhelmed", "pain", "regret", "sad", "scared", "sick", "stress",
    "stressed", "struggling", "terrible", "tired", "upset", "worried", "worry", "worst",
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "didn't", "isn't", "wasn't", "can't", "couldn't",
    "won't", "hardly",
];

pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    /// (positive, negative) marker counts after negation handling.
    fn score(text: &str) -> (usize, usize) {
        let mut positive = 0;
        let mut negative = 0;
        let mut negated = false;

        for raw in text.split_whitespace() {
            let word = raw
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
                .replace('\u{2019}', "'");

            let polarity = if POSITIVE_MARKERS.contains(&word.as_str()) {
                Some(true)
            } else if NEGATIVE_MARKERS.contains(&word.as_str()) {
                Some(false)
            } else {
                None
            };

            match polarity.map(|p| p != negated) {
                Some(true) => positive += 1,
                Some(false) => negative += 1,
                None => {}
            }
            negated = NEGATORS.contains(&word.as_str());
        }

        (positive, negative)
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn predict(&self, text: &str) -> Result<(Sentiment, Option<f32>)> {
        let (positive, negative) = Self::score(text);
        let total = positive + negative;
        let label = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        };
        let confidence = (total > 0).then(|| positive.max(negative) as f32 / total as f32);
        Ok((label, confidence))
    }

    fn model_id(&self) -> &str {
        "lexicon"
    }
}
