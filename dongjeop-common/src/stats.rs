//! Dataset-wide aggregates for the statistics and summary views

use serde::Serialize;
use std::collections::BTreeMap;

use crate::record::AccessibilityRecord;
use crate::scoring::{score, Grade};

/// Step presence counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepCounts {
    #[serde(rename = "true")]
    pub with_step: usize,
    #[serde(rename = "false")]
    pub step_free: usize,
}

/// Records carrying each chair flag (a record may count several times)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChairCounts {
    pub movable: usize,
    pub high_movable: usize,
    pub fixed: usize,
    pub floor: usize,
}

/// Records per grade; every grade is always present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeCounts {
    #[serde(rename = "S")]
    pub s: usize,
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
}

impl GradeCounts {
    fn add(&mut self, grade: Grade) {
        match grade {
            Grade::S => self.s += 1,
            Grade::A => self.a += 1,
            Grade::B => self.b += 1,
            Grade::C => self.c += 1,
            Grade::D => self.d += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Percentages {
    pub step_free: f64,
    pub has_step: f64,
}

/// Response body of the statistics view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_images: usize,
    pub has_step: StepCounts,
    /// Only buckets that occur in the dataset are listed
    pub width_class: BTreeMap<String, usize>,
    pub chair_types: ChairCounts,
    pub grade_distribution: GradeCounts,
    pub average_score: f64,
    pub percentages: Percentages,
}

impl Statistics {
    pub fn from_records(records: &[AccessibilityRecord]) -> Self {
        let total = records.len();
        let mut has_step = StepCounts::default();
        let mut width_class = BTreeMap::new();
        let mut chair_types = ChairCounts::default();
        let mut grade_distribution = GradeCounts::default();
        let mut score_sum: u64 = 0;

        for record in records {
            if record.has_step {
                has_step.with_step += 1;
            } else {
                has_step.step_free += 1;
            }

            for width in &record.width_class {
                *width_class.entry(width.as_str().to_string()).or_insert(0) += 1;
            }

            let chair = &record.chair;
            chair_types.movable += usize::from(chair.has_movable_chair);
            chair_types.high_movable += usize::from(chair.has_high_movable_chair);
            chair_types.fixed += usize::from(chair.has_fixed_chair);
            chair_types.floor += usize::from(chair.has_floor_chair);

            let result = score(record);
            grade_distribution.add(result.grade);
            score_sum += u64::from(result.score);
        }

        Self {
            total_images: total,
            has_step,
            width_class,
            chair_types,
            grade_distribution,
            average_score: average(score_sum, total),
            percentages: Percentages {
                step_free: percentage(has_step.step_free, total),
                has_step: percentage(has_step.with_step, total),
            },
        }
    }
}

/// Response body of the dashboard summary view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_images: usize,
    pub step_free_count: usize,
    pub step_free_percentage: f64,
    pub average_score: f64,
    /// Grade of the average score
    pub average_grade: Grade,
    pub grade_distribution: GradeCounts,
    pub width_distribution: BTreeMap<String, usize>,
    pub chair_types: ChairCounts,
}

impl Summary {
    pub fn from_records(records: &[AccessibilityRecord]) -> Self {
        Self::from(Statistics::from_records(records))
    }
}

impl From<Statistics> for Summary {
    fn from(stats: Statistics) -> Self {
        Self {
            total_images: stats.total_images,
            step_free_count: stats.has_step.step_free,
            step_free_percentage: stats.percentages.step_free,
            average_score: stats.average_score,
            average_grade: Grade::from_score(stats.average_score),
            grade_distribution: stats.grade_distribution,
            width_distribution: stats.width_class,
            chair_types: stats.chair_types,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn average(sum: u64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round1(sum as f64 / count as f64)
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}
