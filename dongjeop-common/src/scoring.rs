//! Accessibility scoring rubric
//!
//! Fixed weights on a 100-point scale. The base of 100 assumes best-case
//! width (40) and seating (20); each sub-score is taken back out and the
//! observed contribution added in, so the baseline subtraction happens even
//! when the contribution is zero.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::{AccessibilityRecord, WidthClass};

const BASE_SCORE: i32 = 100;
const STEP_PENALTY: i32 = 30;
const WIDTH_BASELINE: i32 = 40;
const CHAIR_BASELINE: i32 = 20;

/// Letter grade derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    /// Grade thresholds are inclusive lower bounds
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::S
        } else if score >= 80.0 {
            Grade::A
        } else if score >= 70.0 {
            Grade::B
        } else if score >= 60.0 {
            Grade::C
        } else {
            Grade::D
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One itemized deduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDetail {
    pub category: String,
    pub impact: i32,
    pub reason: String,
}

impl ScoreDetail {
    fn new(category: &str, impact: i32, reason: &str) -> Self {
        Self {
            category: category.to_string(),
            impact,
            reason: reason.to_string(),
        }
    }
}

/// Score, grade and deductions for one record; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub grade: Grade,
    pub details: Vec<ScoreDetail>,
}

/// Score one record
///
/// Steps run in order: step deduction, width adjustment, chair adjustment,
/// clamp, grade.
pub fn score(record: &AccessibilityRecord) -> ScoreResult {
    let mut score = BASE_SCORE;
    let mut details = Vec::new();

    if record.has_step {
        score -= STEP_PENALTY;
        details.push(ScoreDetail::new("단차", -STEP_PENALTY, "휠체어 진입 어려움"));
    }

    // First bucket present in precedence order wins
    let width = WidthClass::ALL
        .into_iter()
        .find(|w| record.has_width(*w));
    let width_score = match width {
        Some(WidthClass::Wide) => 40,
        Some(WidthClass::Normal) => 30,
        Some(WidthClass::Narrow) => {
            details.push(ScoreDetail::new("통로", -25, "통로가 좁음"));
            15
        }
        Some(WidthClass::NotPassable) => {
            details.push(ScoreDetail::new("통로", -40, "휠체어 통과 불가능"));
            0
        }
        None => 20,
    };
    score = score - WIDTH_BASELINE + width_score;

    let chair = &record.chair;
    let mut chair_score = 0;
    if chair.has_movable_chair {
        chair_score += 10;
    }
    if chair.has_high_movable_chair {
        chair_score += 5;
    }
    if !chair.has_fixed_chair {
        chair_score += 5;
    }
    score = score - CHAIR_BASELINE + chair_score;

    let score = score.clamp(0, 100);

    ScoreResult {
        // Clamped above, cannot truncate
        score: score as u8,
        grade: Grade::from_score(f64::from(score)),
        details,
    }
}
