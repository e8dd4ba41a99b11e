//! # Analytics Aggregator
//! Pure, testable logic that maps `(records, window, now)` → [`AnalyticsSnapshot`].
//! No I/O; the store read happens in the thin [`Analytics`] handle so unit
//! tests can drive [`aggregate`] with fixed collections and a fixed clock.
//!
//! Every computation is total over the empty collection: averages, ratios and
//! NPS resolve to documented zero-defaults rather than dividing by zero.
//! Malformed records (rating outside 1..=5) are skipped, counted, and never
//! abort an aggregation — a slightly incomplete dashboard beats an empty one.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::feedback::{FeedbackRecord, FeedbackStore};

/// Sentinel page key for records submitted without a `pageUrl`, consistent
/// with the dashboard's display default.
pub const UNKNOWN_PAGE: &str = "unknown";

/// Trailing time range over which analytics are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Days7,
    Days30,
    Days90,
    Year1,
}

impl Window {
    /// Fail-soft parse: unrecognized values fall back to `7d`, never an error.
    pub fn parse(s: &str) -> Self {
        match s {
            "30d" => Self::Days30,
            "90d" => Self::Days90,
            "1y" => Self::Year1,
            _ => Self::Days7,
        }
    }

    fn duration(self) -> Duration {
        match self {
            Self::Days7 => Duration::days(7),
            Self::Days30 => Duration::days(30),
            Self::Days90 => Duration::days(90),
            Self::Year1 => Duration::days(365),
        }
    }

    /// Daily bucket count, or `None` for the coarse yearly timeline.
    fn timeline_days(self) -> Option<i64> {
        match self {
            Self::Days7 => Some(7),
            Self::Days30 => Some(30),
            Self::Days90 => Some(90),
            Self::Year1 => None,
        }
    }
}

/// Rating-threshold sentiment proxy used for the aggregate breakdown and NPS.
/// Independent of the text-based scorer in [`crate::sentiment`]; the two
/// signals are deliberately not reconciled and may disagree per record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    /// `rating >= 4`
    pub positive: u64,
    /// `rating == 3`
    pub neutral: u64,
    /// `rating <= 2`
    pub negative: u64,
}

/// One discrete time slice of the timeline (a calendar day, or a calendar
/// month for the `1y` window).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBucket {
    pub label: String,
    pub responses: u64,
    /// Mean rating for the slice, rounded to one decimal; 0 when empty.
    pub avg_rating: f64,
}

/// Per-page aggregate for the top-pages ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStat {
    pub url: String,
    pub responses: u64,
    pub avg_rating: f64,
}

/// Summary insights derived from the filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// `round(positive / total * 100)`, 0 when the window is empty.
    pub positive_percentage: u32,
    /// Not derivable from feedback timestamps alone (it would need page-visit
    /// to submission deltas the store does not record), so it is reported as
    /// absent rather than a hardcoded constant.
    pub avg_response_time: Option<f64>,
    /// Mode of hour-of-day across the filtered records, formatted `"HH:00"`.
    /// `None` when the window is empty. Ties resolve to the earliest hour.
    pub peak_hour: Option<String>,
}

/// Windowed aggregate view, recomputed fresh on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_responses: u64,
    /// Mean rating over the window; 0 when empty.
    pub avg_rating: f64,
    /// Counts keyed by rating 1..=5; all five keys always present.
    pub rating_distribution: BTreeMap<u8, u64>,
    pub sentiment: SentimentBreakdown,
    /// Contiguous buckets covering the window, oldest first.
    pub timeline: Vec<TimelineBucket>,
    /// At most 5 entries, responses descending.
    pub top_pages: Vec<PageStat>,
    /// Rating-proxy Net Promoter Score: `round((positive - negative) / total
    /// * 100)`, 0 when empty. Not a true 0–10 survey NPS.
    pub nps: i32,
    pub insights: Insights,
}

/// Aggregate the collection over the given window, evaluated at `now`.
/// Same logic as the `/analytics` handler but purely functional for testing.
pub fn aggregate(records: &[FeedbackRecord], window: Window, now: DateTime<Utc>) -> AnalyticsSnapshot {
    let cutoff = now - window.duration();

    let mut skipped: u64 = 0;
    let filtered: Vec<&FeedbackRecord> = records
        .iter()
        .filter(|r| {
            if !(1..=5).contains(&r.rating) {
                skipped += 1;
                return false;
            }
            r.timestamp >= cutoff
        })
        .collect();

    if skipped > 0 {
        counter!("analytics_skipped_records_total").increment(skipped);
        tracing::warn!(skipped, "skipped feedback records with out-of-range rating");
    }

    let total = filtered.len() as u64;
    let rating_sum: u64 = filtered.iter().map(|r| u64::from(r.rating)).sum();
    let avg_rating = if total > 0 {
        rating_sum as f64 / total as f64
    } else {
        0.0
    };

    // Fixed-shape mapping: downstream consumers assume all five keys.
    let mut rating_distribution: BTreeMap<u8, u64> = (1..=5).map(|r| (r, 0)).collect();
    for r in &filtered {
        *rating_distribution.entry(r.rating).or_default() += 1;
    }

    let sentiment = SentimentBreakdown {
        positive: filtered.iter().filter(|r| r.rating >= 4).count() as u64,
        neutral: filtered.iter().filter(|r| r.rating == 3).count() as u64,
        negative: filtered.iter().filter(|r| r.rating <= 2).count() as u64,
    };

    let nps = if total > 0 {
        let spread = sentiment.positive as f64 - sentiment.negative as f64;
        (spread / total as f64 * 100.0).round() as i32
    } else {
        0
    };

    let positive_percentage = if total > 0 {
        (sentiment.positive as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };

    AnalyticsSnapshot {
        total_responses: total,
        avg_rating,
        rating_distribution,
        sentiment,
        timeline: build_timeline(&filtered, window, now),
        top_pages: top_pages(&filtered),
        nps,
        insights: Insights {
            positive_percentage,
            avg_response_time: None,
            peak_hour: peak_hour(&filtered),
        },
    }
}

/// Build the contiguous timeline for the window, oldest bucket first.
///
/// Daily windows emit exactly `days` calendar-day buckets ending today (UTC,
/// same day-boundary convention as `now`); `1y` emits 12 calendar-month
/// buckets ending with the current month to bound output size. No day or
/// month is skipped, even when empty.
fn build_timeline(filtered: &[&FeedbackRecord], window: Window, now: DateTime<Utc>) -> Vec<TimelineBucket> {
    match window.timeline_days() {
        Some(days) => (0..days)
            .rev()
            .map(|back| {
                let day = (now - Duration::days(back)).date_naive();
                let label = day.format("%b %-d").to_string();
                bucket(label, filtered.iter().filter(|r| r.timestamp.date_naive() == day))
            })
            .collect(),
        None => (0..12)
            .rev()
            .map(|back| {
                let (year, month) = month_back(now.year(), now.month(), back);
                let label = NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|d| d.format("%b %Y").to_string())
                    .unwrap_or_default();
                bucket(
                    label,
                    filtered
                        .iter()
                        .filter(|r| r.timestamp.year() == year && r.timestamp.month() == month),
                )
            })
            .collect(),
    }
}

fn bucket<'a, I>(label: String, records: I) -> TimelineBucket
where
    I: Iterator<Item = &'a &'a FeedbackRecord>,
{
    let mut responses: u64 = 0;
    let mut rating_sum: u64 = 0;
    for r in records {
        responses += 1;
        rating_sum += u64::from(r.rating);
    }
    let avg = if responses > 0 {
        round1(rating_sum as f64 / responses as f64)
    } else {
        0.0
    };
    TimelineBucket {
        label,
        responses,
        avg_rating: avg,
    }
}

/// Walk `back` calendar months before `(year, month)`.
fn month_back(year: i32, month: u32, back: i32) -> (i32, u32) {
    let idx = year * 12 + month as i32 - 1 - back;
    (idx.div_euclid(12), (idx.rem_euclid(12) + 1) as u32)
}

/// Group by page, rank by responses. Ties break by higher average rating and
/// then by first-seen order, so repeated calls on identical input never
/// reorder equals nondeterministically. Truncated to the top 5.
fn top_pages(filtered: &[&FeedbackRecord]) -> Vec<PageStat> {
    struct Accum {
        responses: u64,
        rating_sum: u64,
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Accum)> = Vec::new();

    for r in filtered {
        let url = r.page_url.as_deref().unwrap_or(UNKNOWN_PAGE);
        match index.get(url) {
            Some(&i) => {
                groups[i].1.responses += 1;
                groups[i].1.rating_sum += u64::from(r.rating);
            }
            None => {
                index.insert(url, groups.len());
                groups.push((
                    url,
                    Accum {
                        responses: 1,
                        rating_sum: u64::from(r.rating),
                    },
                ));
            }
        }
    }

    // `groups` is in first-seen order; the stable sort preserves it for
    // entries that tie on both keys.
    let mut stats: Vec<PageStat> = groups
        .into_iter()
        .map(|(url, acc)| PageStat {
            url: url.to_string(),
            responses: acc.responses,
            avg_rating: acc.rating_sum as f64 / acc.responses as f64,
        })
        .collect();
    stats.sort_by(|a, b| {
        b.responses
            .cmp(&a.responses)
            .then(b.avg_rating.total_cmp(&a.avg_rating))
    });
    stats.truncate(5);
    stats
}

/// Mode of hour-of-day over the filtered records; earliest hour wins ties.
fn peak_hour(filtered: &[&FeedbackRecord]) -> Option<String> {
    if filtered.is_empty() {
        return None;
    }
    let mut counts = [0u64; 24];
    for r in filtered {
        counts[r.timestamp.hour() as usize] += 1;
    }
    let mut best = 0usize;
    for (h, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = h;
        }
    }
    Some(format!("{best:02}:00"))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Aggregator handle with an injected store (no process-wide singleton), so
/// callers and tests supply their own collaborator.
#[derive(Clone)]
pub struct Analytics {
    store: Arc<dyn FeedbackStore>,
}

impl Analytics {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self { store }
    }

    /// Entry point for dashboard/report consumers. Total for any window
    /// string; store-level failures propagate unmodified.
    pub async fn get_analytics(&self, window: &str) -> Result<AnalyticsSnapshot> {
        counter!("analytics_requests_total").increment(1);
        let records = self.store.get_all().await?;
        Ok(aggregate(&records, Window::parse(window), Utc::now()))
    }
}
