use std::collections::HashSet;

use chrono::{DateTime, Utc};
use lingo_algo::{prioritize, ItemProgress, PrioritizedItem};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    /// Due items, most urgent first
    pub review: Vec<PrioritizedItem>,
    /// Candidate ids the learner has never answered
    pub new: Vec<String>,
    pub total: usize,
}

/// Fill `limit` slots with due reviews first, then unseen candidates.
///
/// `items` is every progress record of the learner; candidates that already
/// have one are skipped, duplicates keep their first position.
pub fn build_plan(
    items: Vec<ItemProgress>,
    candidate_ids: &[String],
    limit: usize,
    as_of: DateTime<Utc>,
) -> StudyPlan {
    let known: HashSet<String> = items.iter().map(|item| item.item_id.clone()).collect();
    let review = prioritize(items, as_of, Some(limit));

    let open_slots = limit.saturating_sub(review.len());
    let mut seen: HashSet<&str> = HashSet::new();
    let mut new = Vec::new();
    for id in candidate_ids {
        if new.len() >= open_slots {
            break;
        }
        if !known.contains(id) && seen.insert(id.as_str()) {
            new.push(id.clone());
        }
    }

    StudyPlan {
        total: review.len() + new.len(),
        review,
        new,
    }
}
