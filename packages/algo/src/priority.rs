//! Review prioritization
//!
//! Only due items are ranked. The score grows with the time an item has been
//! overdue and shrinks with its easiness factor, so old and hard items come
//! first.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::types::{ItemProgress, PrioritizedItem, MILLIS_PER_DAY, MIN_EASINESS};

/// Fractional days between the due date and `as_of` (0 when not yet due)
pub fn days_overdue(item: &ItemProgress, as_of: DateTime<Utc>) -> f64 {
    let millis = (as_of - item.next_review_date).num_milliseconds();
    (millis as f64 / MILLIS_PER_DAY).max(0.0)
}

/// `daysOverdue / easinessFactor`
pub fn priority_score(item: &ItemProgress, as_of: DateTime<Utc>) -> f64 {
    days_overdue(item, as_of) / item.easiness_factor.max(MIN_EASINESS)
}

/// Rank the due items of `items` as of `as_of`, highest priority first.
///
/// Ties fall back to lower easiness, then earlier due date, then input order.
/// `limit` of `None` keeps every due item.
pub fn prioritize(
    items: impl IntoIterator<Item = ItemProgress>,
    as_of: DateTime<Utc>,
    limit: Option<usize>,
) -> Vec<PrioritizedItem> {
    let mut ranked: Vec<PrioritizedItem> = items
        .into_iter()
        .filter(|item| item.is_due(as_of))
        .map(|item| PrioritizedItem {
            priority_score: priority_score(&item, as_of),
            item_progress: item,
        })
        .collect();

    // sort_by is stable, equal keys keep their input order
    ranked.sort_by(compare);

    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

fn compare(a: &PrioritizedItem, b: &PrioritizedItem) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| {
            a.item_progress
                .easiness_factor
                .total_cmp(&b.item_progress.easiness_factor)
        })
        .then_with(|| {
            a.item_progress
                .next_review_date
                .cmp(&b.item_progress.next_review_date)
        })
}
