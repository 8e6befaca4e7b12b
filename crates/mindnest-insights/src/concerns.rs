use crate::EntrySample;
use crate::words::{Tally, count_word};

pub const NO_CONCERNS: &str = "No significant concerns detected";

const CONCERN_KEYWORDS: &[(&str, &[&str])] = &[
    ("anxiety", &["anxiety", "worried", "nervous", "panic", "fear", "stressed", "anxious", "uneasy"]),
    ("depression", &[
        "depression", "sad", "hopeless", "worthless", "unmotivated", "tired", "depressed", "empty",
    ]),
    ("stress", &["stress", "overwhelmed", "pressure", "tense", "burnout", "exhausted", "overworked"]),
    ("anger", &["anger", "angry", "frustrated", "irritated", "rage", "furious", "mad", "resentment"]),
    ("loneliness", &["lonely", "alone", "isolated", "disconnected", "abandoned", "rejected"]),
    ("self-esteem", &["confidence", "insecure", "inadequate", "failure", "doubt", "unworthy"]),
];

const NEGATIVE_ENTRY_SCORE: f64 = -0.2;

/// Summarizes worrying patterns. `scores` holds one sentiment score per
/// entry, in the same order.
pub fn detect(entries: &[EntrySample<'_>], scores: &[f64]) -> String {
    let mut matches = Tally::default();
    for entry in entries {
        let text = entry.text.to_lowercase();
        for (concern, keywords) in CONCERN_KEYWORDS {
            let hits: usize = keywords.iter().map(|k| count_word(&text, k)).sum();
            if hits > 0 {
                matches.add(concern, hits);
            }
        }
    }

    let (average, negative_pct) = if scores.is_empty() {
        (0.0, 0.0)
    } else {
        let n = scores.len() as f64;
        let negative = scores.iter().filter(|s| **s < NEGATIVE_ENTRY_SCORE).count() as f64;
        (scores.iter().sum::<f64>() / n, negative / n * 100.0)
    };

    if average < -0.3 && negative_pct > 50.0 {
        return "Persistent negative emotions detected".to_string();
    }

    let top = matches.top(2);
    if !top.is_empty() {
        return top
            .iter()
            .map(|concern| format!("{} indicators", capitalize(concern)))
            .collect::<Vec<_>>()
            .join(", ");
    }

    if average < -0.1 {
        "Mild negative mood patterns".to_string()
    } else {
        NO_CONCERNS.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
