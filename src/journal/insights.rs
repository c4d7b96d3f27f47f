//! Temporal aggregation over a user's entry history.
//!
//! Everything here is a pure function of the chronologically ordered entries
//! and is recomputed on every call; nothing is cached or stored.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate};
use rand::seq::SliceRandom;
use serde::Serialize;

use super::types::Entry;
use crate::config::InsightsConfig;
use crate::sentiment::Sentiment;

/// Which entries the mood distribution counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodWindow {
    All,
    /// Everything but the newest entry, so a just-written entry does not skew the view.
    ExcludeLatest,
}

impl FromStr for MoodWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "exclude_latest" => Ok(Self::ExcludeLatest),
            _ => Err(format!(
                "invalid mood_window: {s}. Must be one of: all, exclude_latest"
            )),
        }
    }
}

/// `[insights]` settings with the mood window parsed.
#[derive(Debug, Clone)]
pub struct InsightsOptions {
    pub mood_window: MoodWindow,
    pub trend_window: usize,
    pub min_entries: usize,
    pub top_tags: usize,
}

impl InsightsOptions {
    pub fn from_config(config: &InsightsConfig) -> Result<Self> {
        let mood_window = config.mood_window.parse().map_err(anyhow::Error::msg)?;
        Ok(Self {
            mood_window,
            trend_window: config.trend_window,
            min_entries: config.min_entries,
            top_tags: config.top_tags,
        })
    }
}

impl Default for InsightsOptions {
    fn default() -> Self {
        let config = InsightsConfig::default();
        Self {
            mood_window: MoodWindow::All,
            trend_window: config.trend_window,
            min_entries: config.min_entries,
            top_tags: config.top_tags,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MoodCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub unknown: usize,
}

impl MoodCounts {
    pub fn from_sentiments(sentiments: impl IntoIterator<Item = Sentiment>) -> Self {
        let mut counts = Self::default();
        for s in sentiments {
            match s {
                Sentiment::Positive => counts.positive += 1,
                Sentiment::Negative => counts.negative += 1,
                Sentiment::Neutral => counts.neutral += 1,
                Sentiment::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral + self.unknown
    }
}

/// Sentiment counts over `window`.
pub fn mood_distribution(entries: &[Entry], window: MoodWindow) -> MoodCounts {
    let counted = match window {
        MoodWindow::All => entries,
        MoodWindow::ExcludeLatest => &entries[..entries.len().saturating_sub(1)],
    };
    MoodCounts::from_sentiments(counted.iter().map(|e| e.sentiment))
}

/// Current consecutive-day writing streak ending at the latest entry.
pub fn streak(entries: &[Entry]) -> usize {
    let dates: Vec<NaiveDate> = entries.iter().map(Entry::date).collect();
    streak_from_dates(&dates)
}

/// Streak over calendar dates in entry order. Consecutive entries on one day
/// count once.
///
/// Starts at 1 on the latest entry's date and walks backward while each step
/// is exactly one day earlier. Anything else ends the streak, including a date
/// that moves forward because the writer's offset changed.
pub fn streak_from_dates(dates: &[NaiveDate]) -> usize {
    let mut days = dates.to_vec();
    days.dedup();

    let Some(mut current) = days.pop() else {
        return 0;
    };
    let mut streak = 1;
    while let Some(previous) = days.pop() {
        if (current - previous).num_days() != 1 {
            break;
        }
        streak += 1;
        current = previous;
    }
    streak
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Uplifting,
    Struggling,
    Steady,
    Mixed,
}

const UPLIFTING: &[&str] = &[
    "Your recent entries have a brighter tone. Something is going right.",
    "Lately you have been writing from a good place. Notice what is helping.",
    "Things are looking up in your last few entries.",
];

const STRUGGLING: &[&str] = &[
    "Your recent entries feel heavy. Be gentle with yourself.",
    "The last few days look hard. Writing it down is already a step.",
    "You have been carrying a lot lately. It is fine to ask for support.",
];

const STEADY: &[&str] = &[
    "Your recent entries are calm and even.",
    "Things have been steady lately, neither up nor down.",
    "A quiet stretch. Steady days count too.",
];

const MIXED: &[&str] = &[
    "Your recent entries are a mix of ups and downs.",
    "Lately your mood has moved around. That is normal.",
    "No single feeling stands out in your last few entries.",
];

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uplifting => "UPLIFTING",
            Self::Struggling => "STRUGGLING",
            Self::Steady => "STEADY",
            Self::Mixed => "MIXED",
        }
    }

    /// Fixed pool of narratives for this trend.
    pub fn narratives(&self) -> &'static [&'static str] {
        match self {
            Self::Uplifting => UPLIFTING,
            Self::Struggling => STRUGGLING,
            Self::Steady => STEADY,
            Self::Mixed => MIXED,
        }
    }

    /// A narrative picked at random from [`Trend::narratives`].
    pub fn narrative(&self) -> &'static str {
        self.narratives()
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plurality over (positive, negative, neutral). Anything short of a strict
/// winner, including all zeros, is [`Trend::Mixed`].
pub fn classify_trend(positive: usize, negative: usize, neutral: usize) -> Trend {
    if positive > negative && positive > neutral {
        Trend::Uplifting
    } else if negative > positive && negative > neutral {
        Trend::Struggling
    } else if neutral > positive && neutral > negative {
        Trend::Steady
    } else {
        Trend::Mixed
    }
}

/// Trend over the last `window` entries. UNKNOWN entries are not counted.
pub fn recent_trend(entries: &[Entry], window: usize) -> Trend {
    let start = entries.len().saturating_sub(window);
    let counts = MoodCounts::from_sentiments(entries[start..].iter().map(|e| e.sentiment));
    classify_trend(counts.positive, counts.negative, counts.neutral)
}

/// Longitudinal mood summary for one journal.
#[derive(Debug, Clone, Serialize)]
pub struct MoodStat {
    pub counts: MoodCounts,
    pub streak_length: usize,
    pub trend: Trend,
    pub narrative: String,
}

/// `None` until the journal has at least `min_entries` entries.
pub fn mood_stat(entries: &[Entry], options: &InsightsOptions) -> Option<MoodStat> {
    if entries.len() < options.min_entries.max(1) {
        return None;
    }
    let trend = recent_trend(entries, options.trend_window);
    Some(MoodStat {
        counts: mood_distribution(entries, options.mood_window),
        streak_length: streak(entries),
        trend,
        narrative: trend.narrative().to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// The `top` most frequent tags across the journal. Ties go to the alphabetically first tag.
pub fn recurring_tags(entries: &[Entry], top: usize) -> Vec<TagCount> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for tag in entries.iter().flat_map(|e| e.tags.iter()) {
        *freq.entry(tag.as_str()).or_default() += 1;
    }
    let mut counted: Vec<TagCount> = freq
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    counted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    counted.truncate(top);
    counted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodPoint {
    pub created_at: DateTime<FixedOffset>,
    pub score: i8,
}

/// Mood score per entry: positive 1, negative -1, anything else 0.
pub fn mood_timeline(entries: &[Entry]) -> Vec<MoodPoint> {
    entries
        .iter()
        .map(|e| MoodPoint {
            created_at: e.created_at,
            score: e.sentiment.mood_score(),
        })
        .collect()
}

/// Everything the insights view shows.
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub entry_count: usize,
    /// Absent until there are enough entries.
    pub mood: Option<MoodStat>,
    pub recurring_tags: Vec<TagCount>,
    pub timeline: Vec<MoodPoint>,
}

pub fn insights(entries: &[Entry], options: &InsightsOptions) -> Insights {
    Insights {
        entry_count: entries.len(),
        mood: mood_stat(entries, options),
        recurring_tags: recurring_tags(entries, options.top_tags),
        timeline: mood_timeline(entries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn entry(day: u32, hour: u32, sentiment: Sentiment, tags: &[&str]) -> Entry {
        Entry {
            id: format!("{day}-{hour}"),
            user_id: "ana".into(),
            created_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 1, day, hour, 0, 0)
                .unwrap(),
            text: "text".into(),
            sentiment,
            summary: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            truncated: false,
            embedding: Vec::new(),
            embedding_model: "test".into(),
        }
    }

    #[test]
    fn consecutive_days_streak() {
        assert_eq!(streak_from_dates(&[date(1, 1), date(1, 2), date(1, 3)]), 3);
    }

    #[test]
    fn gap_resets_streak() {
        assert_eq!(
            streak_from_dates(&[date(1, 1), date(1, 2), date(1, 3), date(1, 5)]),
            1
        );
    }

    #[test]
    fn same_day_entries_count_once() {
        assert_eq!(streak_from_dates(&[date(1, 2), date(1, 3), date(1, 3)]), 2);
    }

    #[test]
    fn empty_history_has_no_streak() {
        assert_eq!(streak_from_dates(&[]), 0);
        assert_eq!(streak(&[]), 0);
    }

    #[test]
    fn streak_walks_back_from_latest_entry() {
        // Jan 4 at UTC+9, then an hour later Jan 3 at UTC-8.
        assert_eq!(streak_from_dates(&[date(1, 4), date(1, 3)]), 1);
        assert_eq!(streak_from_dates(&[date(1, 2), date(1, 3), date(1, 2)]), 1);
    }

    #[test]
    fn streak_crosses_month_boundary() {
        assert_eq!(streak_from_dates(&[date(1, 30), date(1, 31), date(2, 1)]), 3);
    }

    #[test]
    fn streak_uses_entry_dates() {
        let entries = vec![
            entry(1, 23, Sentiment::Neutral, &[]),
            entry(2, 1, Sentiment::Neutral, &[]),
            entry(2, 22, Sentiment::Neutral, &[]),
        ];
        assert_eq!(streak(&entries), 2);
    }

    #[test]
    fn trend_plurality() {
        assert_eq!(classify_trend(2, 1, 0), Trend::Uplifting);
        assert_eq!(classify_trend(0, 2, 1), Trend::Struggling);
        assert_eq!(classify_trend(1, 0, 2), Trend::Steady);
        assert_eq!(classify_trend(1, 1, 1), Trend::Mixed);
        assert_eq!(classify_trend(2, 2, 0), Trend::Mixed);
        assert_eq!(classify_trend(0, 0, 0), Trend::Mixed);
    }

    #[test]
    fn narrative_comes_from_trend_pool() {
        for trend in [Trend::Uplifting, Trend::Struggling, Trend::Steady, Trend::Mixed] {
            for _ in 0..10 {
                assert!(trend.narratives().contains(&trend.narrative()));
            }
        }
    }

    #[test]
    fn recent_trend_only_sees_window() {
        let entries = vec![
            entry(1, 9, Sentiment::Negative, &[]),
            entry(2, 9, Sentiment::Negative, &[]),
            entry(3, 9, Sentiment::Positive, &[]),
            entry(4, 9, Sentiment::Positive, &[]),
            entry(5, 9, Sentiment::Neutral, &[]),
        ];
        assert_eq!(recent_trend(&entries, 3), Trend::Uplifting);
        assert_eq!(recent_trend(&entries, 5), Trend::Mixed);
    }

    #[test]
    fn unknown_entries_do_not_sway_trend() {
        let entries = vec![
            entry(1, 9, Sentiment::Unknown, &[]),
            entry(2, 9, Sentiment::Unknown, &[]),
            entry(3, 9, Sentiment::Negative, &[]),
        ];
        assert_eq!(recent_trend(&entries, 3), Trend::Struggling);
    }

    #[test]
    fn mood_window_excludes_latest() {
        let entries = vec![
            entry(1, 9, Sentiment::Positive, &[]),
            entry(2, 9, Sentiment::Negative, &[]),
        ];
        let all = mood_distribution(&entries, MoodWindow::All);
        assert_eq!((all.positive, all.negative), (1, 1));
        let prior = mood_distribution(&entries, MoodWindow::ExcludeLatest);
        assert_eq!((prior.positive, prior.negative), (1, 0));
        assert_eq!(mood_distribution(&[], MoodWindow::ExcludeLatest).total(), 0);
    }

    #[test]
    fn mood_window_is_validated_from_config() {
        let config = InsightsConfig {
            mood_window: "exclude_latest".into(),
            ..InsightsConfig::default()
        };
        let options = InsightsOptions::from_config(&config).unwrap();
        assert_eq!(options.mood_window, MoodWindow::ExcludeLatest);

        let typo = InsightsConfig {
            mood_window: "exclude-latest".into(),
            ..InsightsConfig::default()
        };
        let err = InsightsOptions::from_config(&typo).unwrap_err();
        assert!(err.to_string().contains("invalid mood_window: exclude-latest"));
    }

    #[test]
    fn mood_stat_uses_configured_window() {
        let options = InsightsOptions {
            mood_window: MoodWindow::ExcludeLatest,
            ..InsightsOptions::default()
        };
        let entries = vec![
            entry(1, 9, Sentiment::Positive, &[]),
            entry(2, 9, Sentiment::Negative, &[]),
        ];
        let stat = mood_stat(&entries, &options).unwrap();
        assert_eq!((stat.counts.positive, stat.counts.negative), (1, 0));
    }

    #[test]
    fn mood_stat_needs_minimum_entries() {
        let config = InsightsOptions::default();
        let one = vec![entry(1, 9, Sentiment::Positive, &[])];
        assert!(mood_stat(&one, &config).is_none());

        let two = vec![
            entry(1, 9, Sentiment::Positive, &[]),
            entry(2, 9, Sentiment::Positive, &[]),
        ];
        let stat = mood_stat(&two, &config).unwrap();
        assert_eq!(stat.counts.positive, 2);
        assert_eq!(stat.streak_length, 2);
        assert_eq!(stat.trend, Trend::Uplifting);
        assert!(Trend::Uplifting.narratives().contains(&stat.narrative.as_str()));
    }

    #[test]
    fn recurring_tags_rank_by_frequency_then_name() {
        let entries = vec![
            entry(1, 9, Sentiment::Neutral, &["garden", "coffee"]),
            entry(2, 9, Sentiment::Neutral, &["garden", "sister"]),
            entry(3, 9, Sentiment::Neutral, &["garden", "coffee", "books"]),
        ];
        let top = recurring_tags(&entries, 3);
        let names: Vec<&str> = top.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, ["garden", "coffee", "books"]);
        assert_eq!(top[0].count, 3);
    }

    #[test]
    fn timeline_scores_sentiment() {
        let entries = vec![
            entry(1, 9, Sentiment::Positive, &[]),
            entry(2, 9, Sentiment::Negative, &[]),
            entry(3, 9, Sentiment::Unknown, &[]),
        ];
        let scores: Vec<i8> = mood_timeline(&entries).iter().map(|p| p.score).collect();
        assert_eq!(scores, [1, -1, 0]);
    }
}
