//! Labeling-quality heuristic
//!
//! Flags records a human should look at again. False positives and negatives
//! are acceptable; this is not a correctness check.

use crate::record::{AccessibilityRecord, WidthClass};
use crate::scoring::{score, Grade};

/// File-name fragments that mark scratch or placeholder images
const SUSPECT_PATH_PATTERNS: [&str; 4] = ["test", "sample", "temp", "draft"];

/// Whether a record likely needs human re-review
pub fn needs_relabeling(record: &AccessibilityRecord) -> bool {
    let path = record.file_path.to_lowercase();
    if SUSPECT_PATH_PATTERNS.iter().any(|p| path.contains(p)) {
        return true;
    }

    if score(record).grade == Grade::D {
        return true;
    }

    // Both buckets at once: only possible when several passages were labeled
    record.has_step
        && record.has_width(WidthClass::Narrow)
        && record.has_width(WidthClass::NotPassable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChairInfo;

    fn good_record(path: &str) -> AccessibilityRecord {
        let mut record = AccessibilityRecord::new(path);
        record.width_class.insert(WidthClass::Wide);
        record.chair = ChairInfo {
            has_movable_chair: true,
            ..ChairInfo::default()
        };
        record
    }

    #[test]
    fn test_suspect_path_always_flags() {
        assert!(needs_relabeling(&good_record("batch_00/test_image.webp")));
        assert!(needs_relabeling(&good_record("batch_01/SAMPLE.jpg")));
        assert!(needs_relabeling(&good_record("temp/photo.png")));
        assert!(needs_relabeling(&good_record("batch_02/Draft_3.webp")));
    }

    #[test]
    fn test_clean_high_score_record_not_flagged() {
        assert!(!needs_relabeling(&good_record("batch_00/photo1.webp")));
    }

    #[test]
    fn test_grade_d_flags() {
        let mut record = AccessibilityRecord::new("batch_00/photo2.webp");
        record.has_step = true;
        record.width_class.insert(WidthClass::NotPassable);
        assert_eq!(score(&record).grade, Grade::D);
        assert!(needs_relabeling(&record));
    }

    #[test]
    fn test_step_with_narrow_and_not_passable_flags() {
        // Rare branch: wide keeps the grade above D, so only the width
        // conjunction can trigger here
        let mut record = good_record("batch_00/photo3.webp");
        record.chair.has_high_movable_chair = true;
        record.has_step = true;
        record.width_class.insert(WidthClass::Narrow);
        record.width_class.insert(WidthClass::NotPassable);
        assert_ne!(score(&record).grade, Grade::D);
        assert!(needs_relabeling(&record));
    }

    #[test]
    fn test_step_with_only_narrow_not_flagged() {
        let mut record = good_record("batch_00/photo4.webp");
        record.has_step = true;
        record.width_class.insert(WidthClass::Narrow);
        assert_ne!(score(&record).grade, Grade::D);
        assert!(!needs_relabeling(&record));
    }
}
