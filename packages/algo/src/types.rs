//! Common Types and Constants
//!
//! Shared data structures used across all scheduling modules.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::AlgoError;

// ==================== Constants ====================

/// Easiness factor assigned to a brand-new item
pub const INITIAL_EASINESS: f64 = 2.5;

/// Lower bound of the easiness factor
pub const MIN_EASINESS: f64 = 1.3;

/// Interval assigned to a new or lapsed item (days)
pub const INITIAL_INTERVAL_DAYS: i64 = 1;

/// Interval after the second consecutive successful review (days)
pub const SECOND_INTERVAL_DAYS: i64 = 6;

/// Upper bound for scheduled intervals (days)
pub const MAX_INTERVAL_DAYS: i64 = 36500;

/// Highest answer quality
pub const MAX_QUALITY: u8 = 5;

/// Lowest quality that counts as a successful recall
pub const PASSING_QUALITY: u8 = 3;

/// Items learned per user level
pub const WORDS_PER_LEVEL: u64 = 100;

/// Daily goal for learners who never changed it
pub const DEFAULT_DAILY_GOAL: u32 = 20;

pub const MASTERED_MIN_REPETITIONS: u32 = 3;
pub const MASTERED_MIN_ACCURACY: f64 = 0.8;
pub const MASTERED_MIN_INTERVAL_DAYS: i64 = 7;

pub(crate) const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ==================== Quality ====================

/// SM-2 answer quality in `[0, 5]`.
///
/// - 0: complete blackout
/// - 1: wrong, but the answer felt familiar
/// - 2: wrong, almost recalled
/// - 3: correct with serious effort
/// - 4: correct after hesitation
/// - 5: perfect recall
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: i64) -> Result<Self, AlgoError> {
        if (0..=MAX_QUALITY as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AlgoError::InvalidQuality(value))
        }
    }

    /// For converters whose output is in range by construction
    pub(crate) fn clamped(value: u8) -> Self {
        Self(value.min(MAX_QUALITY))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 >= PASSING_QUALITY
    }
}

impl TryFrom<i64> for Quality {
    type Error = AlgoError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

// ==================== Enums ====================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    #[default]
    New,
    Learning,
    Mastered,
}

impl MasteryLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Mastered => "mastered",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "learning" => Some(Self::Learning),
            "mastered" => Some(Self::Mastered),
            _ => None,
        }
    }
}

/// Kind of learnable item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Word,
    Sentence,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Sentence => "sentence",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "word" => Some(Self::Word),
            "sentence" => Some(Self::Sentence),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    NewWords,
    Review,
    #[default]
    Practice,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewWords => "new_words",
            Self::Review => "review",
            Self::Practice => "practice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "new_words" => Some(Self::NewWords),
            "review" => Some(Self::Review),
            "practice" => Some(Self::Practice),
            _ => None,
        }
    }
}

// ==================== Records ====================

/// Scheduling state of one (user, item) pair
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemProgress {
    pub user_id: String,
    pub item_id: String,
    pub item_kind: ItemKind,
    pub easiness_factor: f64,
    pub repetitions: u32,
    pub interval_days: i64,
    pub next_review_date: DateTime<Utc>,
    pub last_review_date: Option<DateTime<Utc>>,
    pub last_quality: u8,
    pub total_reviews: u32,
    pub correct_reviews: u32,
    pub mastery_level: MasteryLevel,
    /// 0 until the record has been stored once
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemProgress {
    /// Default state for an item seen for the first time, due one day after `now`.
    pub fn new(
        user_id: impl Into<String>,
        item_id: impl Into<String>,
        item_kind: ItemKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            item_kind,
            easiness_factor: INITIAL_EASINESS,
            repetitions: 0,
            interval_days: INITIAL_INTERVAL_DAYS,
            next_review_date: now + Duration::days(INITIAL_INTERVAL_DAYS),
            last_review_date: None,
            last_quality: 0,
            total_reviews: 0,
            correct_reviews: 0,
            mastery_level: MasteryLevel::New,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Share of reviews answered with a passing quality, 0 when never reviewed
    pub fn accuracy(&self) -> f64 {
        if self.total_reviews == 0 {
            return 0.0;
        }
        self.correct_reviews as f64 / self.total_reviews as f64
    }

    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.next_review_date <= as_of
    }
}

/// Per-user learning summary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLearningStats {
    pub user_id: String,
    pub total_words_learned: u64,
    pub total_study_time_minutes: u64,
    pub streak_days: u32,
    pub last_study_date: Option<NaiveDate>,
    pub current_level: u32,
    pub daily_goal: u32,
    pub version: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserLearningStats {
    pub fn new(user_id: impl Into<String>, daily_goal: u32) -> Self {
        Self {
            user_id: user_id.into(),
            total_words_learned: 0,
            total_study_time_minutes: 0,
            streak_days: 0,
            last_study_date: None,
            current_level: 1,
            daily_goal,
            version: 0,
            updated_at: None,
        }
    }
}

/// One answer event in the recent-activity log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionRecord {
    pub session_id: String,
    pub user_id: String,
    pub item_id: String,
    pub timestamp: DateTime<Utc>,
    pub quality: u8,
    pub is_correct: bool,
    pub session_type: SessionType,
}

/// Due item with its ranking score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedItem {
    pub item_progress: ItemProgress,
    pub priority_score: f64,
}
