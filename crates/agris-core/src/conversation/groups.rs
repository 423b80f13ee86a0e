//! Recency bucketing for the conversation history list.
//!
//! The history sidebar shows conversations grouped by how recently they were
//! updated. Buckets are computed from local wall-clock midnight boundaries:
//! "this week" means within the last 7 days and "this month" within the last
//! 30, both measured from today's midnight.

use super::model::ConversationSummary;
use chrono::{DateTime, Duration, Local, LocalResult, TimeZone};
use serde::{Deserialize, Serialize};

/// A recency bucket in the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyBucket {
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    Older,
}

impl RecencyBucket {
    /// Display label for the bucket header.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::ThisWeek => "This week",
            Self::ThisMonth => "This month",
            Self::Older => "Older",
        }
    }
}

/// A bucket of conversations, ordered most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationGroup {
    pub bucket: RecencyBucket,
    pub conversations: Vec<ConversationSummary>,
}

/// Sorts summaries by `updated_at` descending and partitions them into
/// recency buckets relative to `now`. Empty buckets are omitted.
pub fn group_by_recency(
    mut items: Vec<ConversationSummary>,
    now: DateTime<Local>,
) -> Vec<ConversationGroup> {
    items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let today = local_midnight(now);
    let yesterday = today - Duration::days(1);
    let week = today - Duration::days(7);
    let month = today - Duration::days(30);

    let mut buckets: [(RecencyBucket, Vec<ConversationSummary>); 5] = [
        (RecencyBucket::Today, Vec::new()),
        (RecencyBucket::Yesterday, Vec::new()),
        (RecencyBucket::ThisWeek, Vec::new()),
        (RecencyBucket::ThisMonth, Vec::new()),
        (RecencyBucket::Older, Vec::new()),
    ];

    for item in items {
        let updated = item.updated_at.with_timezone(&Local);
        let slot = if updated >= today {
            0
        } else if updated >= yesterday {
            1
        } else if updated >= week {
            2
        } else if updated >= month {
            3
        } else {
            4
        };
        buckets[slot].1.push(item);
    }

    buckets
        .into_iter()
        .filter(|(_, conversations)| !conversations.is_empty())
        .map(|(bucket, conversations)| ConversationGroup {
            bucket,
            conversations,
        })
        .collect()
}

/// Today's midnight in local time.
///
/// Midnight can be ambiguous or missing around DST transitions; prefer the
/// earlier instant and fall back to `now` if the wall clock skipped it.
fn local_midnight(now: DateTime<Local>) -> DateTime<Local> {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("00:00:00 is a valid wall-clock time");
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => now,
    }
}
