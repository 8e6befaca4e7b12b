use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;

use crate::EntrySample;
use crate::sentiment;
use crate::words::Tally;

const NO_ENTRIES: &str =
    "You don't have any journal entries in this timeframe. Start journaling to see your progress!";
const KEEP_JOURNALING: &str =
    "Continue journaling to receive more personalized insights about your emotional patterns.";

const POSITIVE_MOODS: &[&str] = &["happy", "excited", "confident", "grateful", "relaxed"];
const NEGATIVE_MOODS: &[&str] = &["sad", "angry", "anxious", "tired", "frustrated", "lonely"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timeframe {
    Week,
    #[default]
    Month,
    Year,
}

impl Timeframe {
    /// Unknown or missing values fall back to a month.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("week") => Timeframe::Week,
            Some("year") => Timeframe::Year,
            _ => Timeframe::Month,
        }
    }

    /// Start of the window ending at `now`. Calendar months are clamped to
    /// the last day of the shorter month.
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            Timeframe::Week => return now - Duration::days(7),
            Timeframe::Month => 1,
            Timeframe::Year => 12,
        };
        now.checked_sub_months(Months::new(months))
            .unwrap_or(now - Duration::days(30 * months as i64))
    }

    fn label(self, ts: DateTime<Utc>) -> String {
        match self {
            Timeframe::Year => ts.format("%b %-d, %Y").to_string(),
            _ => ts.format("%-m/%-d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityPoint {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalAnalytics {
    pub total_entries: usize,
    pub average_sentiment: f64,
    pub most_common_mood: Option<String>,
    pub sentiment_trend: Vec<TrendPoint>,
    pub mood_distribution: BTreeMap<String, usize>,
    pub activity_trend: Vec<ActivityPoint>,
    pub insights: Vec<String>,
    pub timeframe_in_days: i64,
}

/// Builds the progress report for entries created in `[start, end]`.
/// `entries` must already be restricted to that window, oldest first.
pub fn summarize(
    entries: &[EntrySample<'_>],
    timeframe: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> JournalAnalytics {
    let timeframe_in_days = ((end - start).num_milliseconds() as f64 / 86_400_000.0).round() as i64;

    if entries.is_empty() {
        return JournalAnalytics {
            total_entries: 0,
            average_sentiment: 0.0,
            most_common_mood: None,
            sentiment_trend: Vec::new(),
            mood_distribution: BTreeMap::new(),
            activity_trend: Vec::new(),
            insights: vec![NO_ENTRIES.to_string()],
            timeframe_in_days,
        };
    }

    let mut moods = Tally::default();
    // (label, score sum, entries) in first-seen order
    let mut days: Vec<(String, f64, usize)> = Vec::new();
    let mut total = 0.0;

    for entry in entries {
        let score = sentiment::score(entry.text);
        total += score;
        moods.add(entry.mood, 1);

        let label = timeframe.label(entry.created_at);
        match days.iter_mut().find(|(day, _, _)| *day == label) {
            Some(day) => {
                day.1 += score;
                day.2 += 1;
            }
            None => days.push((label, score, 1)),
        }
    }

    let sentiment_trend: Vec<_> = days
        .iter()
        .map(|(date, sum, n)| TrendPoint { date: date.clone(), score: sum / *n as f64 })
        .collect();
    let activity_trend = days
        .into_iter()
        .map(|(date, _, count)| ActivityPoint { date, count })
        .collect();

    let most_common_mood = moods.leader().map(str::to_string);
    let insights = insights(
        entries.len(),
        most_common_mood.as_deref(),
        &sentiment_trend,
        timeframe_in_days,
    );

    JournalAnalytics {
        total_entries: entries.len(),
        average_sentiment: total / entries.len() as f64,
        most_common_mood,
        sentiment_trend,
        mood_distribution: moods.iter().map(|(mood, n)| (mood.to_string(), n)).collect(),
        activity_trend,
        insights,
        timeframe_in_days,
    }
}

fn insights(
    total: usize,
    most_common_mood: Option<&str>,
    trend: &[TrendPoint],
    timeframe_in_days: i64,
) -> Vec<String> {
    let mut out = Vec::new();

    if let [first, .., last] = trend {
        let delta = last.score - first.score;
        if delta > 0.3 {
            out.push("Your emotional state has been improving significantly over this period. Keep up the positive momentum!".to_string());
        } else if delta < -0.3 {
            out.push("Your emotional state has been declining recently. Consider focusing on self-care activities that have helped you in the past.".to_string());
        } else if delta.abs() <= 0.1 {
            out.push("Your emotional state has remained relatively stable during this period.".to_string());
        }
    }

    if let Some(mood) = most_common_mood {
        let mood = mood.to_lowercase();
        if POSITIVE_MOODS.contains(&mood.as_str()) {
            out.push(format!("You've been feeling {mood} most frequently. This positive emotional pattern is great for your wellbeing."));
        } else if NEGATIVE_MOODS.contains(&mood.as_str()) {
            out.push(format!("You've been feeling {mood} most frequently. Consider talking to someone you trust or a professional about these feelings."));
        }
    }

    if timeframe_in_days > 0 {
        let per_week = (total as f64 / (timeframe_in_days as f64 / 7.0) * 10.0).round() / 10.0;
        if per_week >= 3.0 {
            out.push(format!("You're journaling frequently ({per_week:.1} entries per week), which is excellent for tracking your mental wellness journey."));
        } else if per_week < 1.0 {
            out.push(format!("You're journaling infrequently ({per_week:.1} entries per week). Try setting reminders to journal more regularly."));
        }
    }

    if out.is_empty() {
        out.push(KEEP_JOURNALING.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    fn entry(mood: &'static str, text: &'static str, days_ago: i64) -> EntrySample<'static> {
        EntrySample { mood, text, created_at: now() - Duration::days(days_ago) }
    }

    #[test]
    fn timeframe_windows() {
        assert_eq!(Timeframe::parse(Some("week")).start(now()), now() - Duration::days(7));
        assert_eq!(
            Timeframe::parse(Some("bogus")).start(now()),
            Utc.with_ymd_and_hms(2024, 4, 20, 12, 0, 0).unwrap()
        );
        assert_eq!(
            Timeframe::parse(None).start(Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
        assert_eq!(
            Timeframe::Year.start(now()),
            Utc.with_ymd_and_hms(2023, 5, 20, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn empty_window_reports_no_entries() {
        let tf = Timeframe::Week;
        let report = summarize(&[], tf, tf.start(now()), now());
        assert_eq!(report.total_entries, 0);
        assert_eq!(report.most_common_mood, None);
        assert_eq!(report.timeframe_in_days, 7);
        assert_eq!(report.insights, [NO_ENTRIES]);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["mostCommonMood"].is_null());
        assert_eq!(json["moodDistribution"], serde_json::json!({}));
    }

    #[test]
    fn groups_by_display_date() {
        let entries = [
            entry("Sad", "sad", 3),
            entry("Happy", "happy", 1),
            entry("Happy", "great", 1),
            entry("Sad", "walked", 0),
        ];
        let tf = Timeframe::Week;
        let report = summarize(&entries, tf, tf.start(now()), now());

        assert_eq!(report.total_entries, 4);
        assert_eq!(report.most_common_mood.as_deref(), Some("Sad"));
        assert_eq!(report.mood_distribution["Happy"], 2);

        let dates: Vec<_> = report.activity_trend.iter().map(|p| (p.date.as_str(), p.count)).collect();
        assert_eq!(dates, [("5/17", 1), ("5/19", 2), ("5/20", 1)]);
        assert_eq!(report.sentiment_trend[0].score, -1.0);
        assert_eq!(report.sentiment_trend[1].score, 1.0);
        assert_eq!(report.average_sentiment, 0.25);

        // -1 -> 0 is an improvement; 4 entries in one week is frequent.
        assert!(report.insights[0].contains("improving significantly"));
        assert!(report.insights[1].contains("feeling sad most frequently"));
        assert!(report.insights[2].contains("(4.0 entries per week)"));
    }

    #[test]
    fn year_labels_spell_the_month() {
        let tf = Timeframe::Year;
        let report = summarize(&[entry("Tired", "long day", 40)], tf, tf.start(now()), now());
        assert_eq!(report.activity_trend[0].date, "Apr 10, 2024");
        assert_eq!(report.timeframe_in_days, 366);
        assert!(report.insights.iter().any(|i| i.contains("infrequently (0.0 entries per week)")));
    }

    #[test]
    fn quiet_month_gets_default_insight() {
        let entries = [entry("Motivated", "walked", 2), entry("Motivated", "read", 1)];
        let tf = Timeframe::Month;
        let report = summarize(&entries, tf, tf.start(now()), now());
        // 2 entries over 30 days is 0.5 per week
        assert_eq!(report.timeframe_in_days, 30);
        assert_eq!(report.insights.len(), 2);
        assert!(report.insights[0].contains("stable"));
        assert!(report.insights[1].contains("infrequently (0.5 entries per week)"));
    }
}
