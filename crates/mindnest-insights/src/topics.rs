use crate::EntrySample;
use crate::words::{Tally, is_word_byte};

pub const NO_TOPICS: &str = "No specific topics detected";

const FREQUENT_WORD_LIMIT: usize = 10;
const TOPIC_LIMIT: usize = 5;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "for", "nor", "on", "at", "to", "by", "about", "in",
    "of", "with", "is", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "doing", "can", "could", "should", "would", "may", "might", "must", "i", "me", "my",
    "mine", "myself", "you", "your", "yours", "yourself", "he", "him", "his", "himself", "she",
    "her", "hers", "herself", "it", "its", "itself", "we", "us", "our", "ours", "ourselves",
    "they", "them", "their", "theirs", "themselves", "this", "that", "these", "those", "am",
    "are", "as", "if", "then", "else", "when", "up", "down", "so", "just", "very", "really",
    "quite", "much", "more", "most", "some", "any", "all", "only",
];

/// Life areas and the keywords that hint at them. Keywords match as
/// substrings, so "work" also fires on "workout" and "homework".
const DOMAIN_TOPICS: &[(&str, &[&str])] = &[
    ("work", &[
        "job", "career", "work", "office", "boss", "colleague", "coworker", "project", "task",
        "meeting", "deadline", "performance",
    ]),
    ("relationships", &[
        "relationship", "friend", "family", "partner", "spouse", "husband", "wife", "boyfriend",
        "girlfriend", "marriage", "date", "dating", "love", "breakup", "argument", "social",
    ]),
    ("health", &[
        "health", "doctor", "sick", "illness", "medicine", "symptoms", "pain", "sleep",
        "exercise", "diet", "nutrition", "workout", "fitness",
    ]),
    ("mental health", &[
        "anxiety", "stress", "depression", "therapy", "therapist", "counseling", "counselor",
        "mental", "emotion", "feelings", "mood", "panic", "worry", "trauma",
    ]),
    ("self-improvement", &[
        "goal", "plan", "habit", "routine", "improvement", "growth", "development", "learn",
        "skills", "progress", "achievement", "success", "future",
    ]),
    ("personal finance", &[
        "money", "finance", "financial", "budget", "saving", "spending", "debt", "bills",
        "expenses", "income", "salary", "investment",
    ]),
    ("hobbies", &[
        "hobby", "read", "book", "music", "art", "paint", "draw", "sport", "game", "movie",
        "show", "travel", "trip",
    ]),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Topics {
    pub frequent_words: Vec<String>,
    /// Never empty: falls back to [`NO_TOPICS`].
    pub frequent_topics: Vec<String>,
}

pub fn extract(entries: &[EntrySample<'_>]) -> Topics {
    let mut words = Tally::default();
    let mut topics = Tally::default();

    for entry in entries {
        let text = entry.text.to_lowercase();

        for token in text.split_whitespace() {
            let clean: String = token.bytes().filter(|b| is_word_byte(*b)).map(char::from).collect();
            if clean.len() <= 2 || STOP_WORDS.contains(&clean.as_str()) {
                continue;
            }
            words.add(&clean, 1);
        }

        for (topic, keywords) in DOMAIN_TOPICS {
            let hits = keywords.iter().filter(|k| text.contains(*k)).count();
            if hits > 0 {
                topics.add(topic, hits);
            }
        }
    }

    let frequent_topics = if topics.is_empty() {
        vec![NO_TOPICS.to_string()]
    } else {
        topics.top(TOPIC_LIMIT)
    };

    Topics {
        frequent_words: words.top(FREQUENT_WORD_LIMIT),
        frequent_topics,
    }
}
