use serde::Serialize;

use crate::words::Tally;
use crate::{EntrySample, concerns, sentiment, topics};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub mood: String,
    pub frequent_topics: Vec<String>,
    pub frequent_words: Vec<String>,
    pub potential_concerns: String,
}

/// Builds a wellbeing profile from every entry of a user, newest first.
pub fn generate(name: &str, entries: &[EntrySample<'_>]) -> Profile {
    let username = if name.trim().is_empty() { "User" } else { name }.to_string();

    if entries.is_empty() {
        return Profile {
            username,
            mood: "Unknown".to_string(),
            frequent_topics: vec!["No journal entries yet".to_string()],
            frequent_words: Vec::new(),
            potential_concerns: "Start journaling to see insights".to_string(),
        };
    }

    let scores: Vec<f64> = entries.iter().map(|e| sentiment::score(e.text)).collect();
    let topics = topics::extract(entries);

    let mut moods = Tally::default();
    for entry in entries {
        moods.add(entry.mood, 1);
    }

    Profile {
        username,
        mood: moods.leader().unwrap_or("Unknown").to_string(),
        frequent_topics: topics.frequent_topics,
        frequent_words: topics.frequent_words,
        potential_concerns: concerns::detect(entries, &scores),
    }
}
