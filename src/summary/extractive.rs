//! Frequency-based extractive summarizer.
//!
//! Sentences are scored by the average document frequency of their content
//! words; the best ones are kept, in their original order, until the word
//! budget is used up.

use std::collections::HashMap;

use anyhow::Result;

use super::Summarizer;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "but", "by", "can", "could", "did", "do", "for", "from",
    "had", "has", "have", "he", "her", "him", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "just", "me", "more", "my", "of", "on", "or", "our", "out", "she",
    "so", "some", "than", "that", "the", "their", "them", "then", "there", "they",
    "this", "to", "too", "up", "very", "was", "we", "were", "what", "when", "which",
    "who", "will", "with", "would", "you", "your",
];

pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn is_content_word(word: &str) -> bool {
    word.chars().count() > 2 && !STOPWORDS.contains(&word)
}

/// Split on sentence terminators and line breaks, keeping the terminator.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?' | '\n') {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if sentence.chars().any(char::is_alphanumeric) {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if tail.chars().any(char::is_alphanumeric) {
        sentences.push(tail);
    }
    sentences
}

impl Summarizer for ExtractiveSummarizer {
    fn summarize(&self, text: &str, max_words: usize) -> Result<String> {
        let sentences = split_sentences(text);
        if sentences.is_empty() || max_words == 0 {
            return Ok(String::new());
        }

        let mut freq: HashMap<String, usize> = HashMap::new();
        for word in text.split_whitespace().map(normalize) {
            if is_content_word(&word) {
                *freq.entry(word).or_default() += 1;
            }
        }

        let mut ranked: Vec<(usize, f64, usize)> = sentences
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let content: Vec<String> = s
                    .split_whitespace()
                    .map(normalize)
                    .filter(|w| is_content_word(w))
                    .collect();
                let total: usize = content.iter().map(|w| freq.get(w).copied().unwrap_or(0)).sum();
                let score = total as f64 / content.len().max(1) as f64;
                (idx, score, s.split_whitespace().count())
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut chosen: Vec<usize> = Vec::new();
        let mut used = 0;
        for &(idx, _, words) in &ranked {
            if used + words <= max_words {
                chosen.push(idx);
                used += words;
            }
        }

        if chosen.is_empty() {
            // Even the best sentence is over budget: keep its head.
            let best = sentences[ranked[0].0];
            let head: Vec<&str> = best.split_whitespace().take(max_words).collect();
            return Ok(head.join(" "));
        }

        chosen.sort_unstable();
        Ok(chosen
            .into_iter()
            .map(|idx| sentences[idx])
            .collect::<Vec<_>>()
            .join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(text: &str, max_words: usize) -> String {
        ExtractiveSummarizer::new().summarize(text, max_words).unwrap()
    }

    #[test]
    fn short_entry_is_its_own_summary() {
        let text = "I finally felt proud of finishing my project today and it made me smile";
        assert_eq!(summarize(text, 50), text);
    }

    #[test]
    fn keeps_original_sentence_order() {
        let text = "The project deadline moved again. Lunch was fine. \
                    I stayed late on the project and the deadline still feels close.";
        let summary = summarize(text, 18);
        assert!(summary.starts_with("The project deadline moved again."));
        assert!(summary.ends_with("feels close."));
        assert!(!summary.contains("Lunch"));
    }

    #[test]
    fn respects_word_budget() {
        let text = "Morning run along the river. Coffee with Mia downtown. \
                    Long afternoon of writing. Dinner with family. Read before bed.";
        let summary = summarize(text, 10);
        assert!(summary.split_whitespace().count() <= 10);
        assert!(!summary.is_empty());
    }

    #[test]
    fn oversized_single_sentence_is_head_truncated() {
        let text = (0..80).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let summary = summarize(&text, 50);
        assert_eq!(summary.split_whitespace().count(), 50);
        assert!(summary.starts_with("word0 word1"));
    }

    #[test]
    fn blank_input_gives_empty_summary() {
        assert_eq!(summarize("  ... \n ", 50), "");
    }

    #[test]
    fn split_handles_missing_terminator() {
        assert_eq!(
            split_sentences("First one. Second one without end"),
            vec!["First one.", "Second one without end"]
        );
    }
}
