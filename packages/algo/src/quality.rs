//! Conversions from raw answer signals to an SM-2 [`Quality`].

use serde::{Deserialize, Serialize};

use crate::types::Quality;

/// Self-reported confidence in an answer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

/// Quality from correctness, response time and hints used.
///
/// Wrong answers land in 0..=2 depending on hints, right answers start at 5,
/// lose one point per hint and up to one point for slow answers, and never go
/// below 3.
pub fn from_performance(is_correct: bool, response_time_ms: Option<u64>, hints_used: u32) -> Quality {
    if !is_correct {
        let value = match hints_used {
            0 => 2,
            1 | 2 => 1,
            _ => 0,
        };
        return Quality::clamped(value);
    }

    let mut score = 5.0 - hints_used as f64;
    if let Some(ms) = response_time_ms.filter(|ms| *ms > 0) {
        let seconds = ms as f64 / 1000.0;
        if seconds > 30.0 {
            score -= 1.0;
        } else if seconds > 15.0 {
            score -= 0.5;
        }
    }

    Quality::clamped(score.round().clamp(3.0, 5.0) as u8)
}

pub fn from_confidence(is_correct: bool, confidence: Confidence) -> Quality {
    let value = match (is_correct, confidence) {
        (false, Confidence::Low) => 0,
        (false, Confidence::Medium) => 1,
        (false, Confidence::High) => 2,
        (true, Confidence::Low) => 3,
        (true, Confidence::Medium) => 4,
        (true, Confidence::High) => 5,
    };
    Quality::clamped(value)
}

/// Quality from an accuracy ratio in `[0, 1]`
pub fn from_accuracy(accuracy: f64) -> Quality {
    let value = if accuracy >= 0.9 {
        5
    } else if accuracy >= 0.8 {
        4
    } else if accuracy >= 0.6 {
        3
    } else if accuracy >= 0.4 {
        2
    } else if accuracy >= 0.2 {
        1
    } else {
        0
    };
    Quality::clamped(value)
}
