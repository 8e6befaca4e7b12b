use serde::Serialize;

use crate::words::count_word;

pub const POSITIVE_WORDS: [&str; 20] = [
    "happy", "great", "excellent", "good", "positive", "wonderful", "amazing", "love", "joy",
    "excited", "grateful", "thankful", "blessed", "hopeful", "optimistic", "peaceful", "calm",
    "relaxed", "confident", "proud",
];

pub const NEGATIVE_WORDS: [&str; 20] = [
    "sad", "bad", "terrible", "awful", "negative", "horrible", "hate", "angry", "upset",
    "disappointed", "frustrated", "annoyed", "worried", "anxious", "stressed", "depressed",
    "unhappy", "miserable", "uncomfortable", "afraid",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentiment {
    /// Always within `[-1, 1]`.
    pub score: f64,
    pub positive_count: usize,
    pub negative_count: usize,
    pub positive_words: Vec<&'static str>,
    pub negative_words: Vec<&'static str>,
}

pub fn analyze(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let (positive_count, positive_words) = matches(&lower, &POSITIVE_WORDS);
    let (negative_count, negative_words) = matches(&lower, &NEGATIVE_WORDS);

    let word_count = lower.split_whitespace().count();
    let score = if word_count == 0 {
        0.0
    } else {
        let raw = (positive_count as f64 - negative_count as f64) / (word_count as f64).sqrt();
        raw.clamp(-1.0, 1.0)
    };

    Sentiment {
        score,
        positive_count,
        negative_count,
        positive_words,
        negative_words,
    }
}

/// Just the score.
pub fn score(text: &str) -> f64 {
    analyze(text).score
}

fn matches(lower: &str, lexicon: &[&'static str]) -> (usize, Vec<&'static str>) {
    let mut total = 0;
    let mut found = Vec::new();
    for &word in lexicon {
        let n = count_word(lower, word);
        if n > 0 {
            total += n;
            found.push(word);
        }
    }
    (total, found)
}
