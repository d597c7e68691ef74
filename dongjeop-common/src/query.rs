//! Filtering and pagination over the in-memory dataset
//!
//! Filters are AND-combined and applied to the full collection before the
//! page window is cut, so `total` always counts every match.

use serde::Serialize;

use crate::record::{AccessibilityRecord, ChairType, WidthClass};
use crate::relabel::needs_relabeling;

/// Attribute predicates; `None` means "don't filter on this"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageFilter {
    pub has_step: Option<bool>,
    pub width_class: Option<WidthClass>,
    pub chair_type: Option<ChairType>,
    pub needs_relabeling: Option<bool>,
}

impl ImageFilter {
    /// Whether a record satisfies every supplied predicate
    pub fn matches(&self, record: &AccessibilityRecord) -> bool {
        if let Some(has_step) = self.has_step {
            if record.has_step != has_step {
                return false;
            }
        }

        if let Some(width) = self.width_class {
            if !record.has_width(width) {
                return false;
            }
        }

        if let Some(chair_type) = self.chair_type {
            if !chair_type.present_in(&record.chair) {
                return false;
            }
        }

        // Evaluated last: it scores the record
        if let Some(wanted) = self.needs_relabeling {
            if needs_relabeling(record) != wanted {
                return false;
            }
        }

        true
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Number of records matching the filter
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Transform page items, keeping the counts
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            skip: self.skip,
            limit: self.limit,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Filter then return the contiguous slice `[skip, skip + limit)`
///
/// Bounds on `skip` and `limit` are the caller's responsibility; an
/// out-of-range `skip` simply yields no items.
pub fn query<'a>(
    records: &'a [AccessibilityRecord],
    filter: &ImageFilter,
    skip: usize,
    limit: usize,
) -> Page<&'a AccessibilityRecord> {
    let matching: Vec<&AccessibilityRecord> =
        records.iter().filter(|r| filter.matches(r)).collect();

    let total = matching.len();
    let items = matching.into_iter().skip(skip).take(limit).collect();

    Page {
        total,
        skip,
        limit,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChairInfo;

    fn dataset() -> Vec<AccessibilityRecord> {
        let mut records = Vec::new();
        for i in 0..12 {
            let mut r = AccessibilityRecord::new(format!("batch_0{}/photo{}.webp", i % 3, i));
            r.has_step = i % 2 == 0;
            r.width_class.insert(match i % 4 {
                0 => WidthClass::Wide,
                1 => WidthClass::Normal,
                2 => WidthClass::Narrow,
                _ => WidthClass::NotPassable,
            });
            r.chair = ChairInfo {
                has_movable_chair: i % 3 == 0,
                has_fixed_chair: i % 3 == 1,
                ..ChairInfo::default()
            };
            records.push(r);
        }
        records.push(AccessibilityRecord::new("batch_00/sample_blank.webp"));
        records
    }

    fn expected_len(total: usize, skip: usize, limit: usize) -> usize {
        limit.min(total.saturating_sub(skip))
    }

    #[test]
    fn test_no_filter_returns_everything() {
        let records = dataset();
        let page = query(&records, &ImageFilter::default(), 0, 100);
        assert_eq!(page.total, records.len());
        assert_eq!(page.items.len(), records.len());
    }

    #[test]
    fn test_pagination_slices_after_filtering() {
        let records = dataset();
        let filter = ImageFilter {
            has_step: Some(true),
            ..ImageFilter::default()
        };
        let page = query(&records, &filter, 2, 3);
        assert_eq!(page.total, 6);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].file_path, "batch_01/photo4.webp");
        assert!(page.items.iter().all(|r| r.has_step));
    }

    #[test]
    fn test_skip_past_end_keeps_total() {
        let records = dataset();
        let page = query(&records, &ImageFilter::default(), 500, 20);
        assert_eq!(page.total, records.len());
        assert!(page.items.is_empty());
        assert_eq!(page.skip, 500);
        assert_eq!(page.limit, 20);
    }

    #[test]
    fn test_width_and_chair_filters_combine() {
        let records = dataset();
        let filter = ImageFilter {
            width_class: Some(WidthClass::Wide),
            chair_type: Some(ChairType::Movable),
            ..ImageFilter::default()
        };
        let page = query(&records, &filter, 0, 20);
        // i in {0, 4, 8} are wide; of those i % 3 == 0 -> {0}
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].file_path, "batch_00/photo0.webp");
    }

    #[test]
    fn test_relabel_filter() {
        let records = dataset();
        let flagged = ImageFilter {
            needs_relabeling: Some(true),
            ..ImageFilter::default()
        };
        let clean = ImageFilter {
            needs_relabeling: Some(false),
            ..ImageFilter::default()
        };
        let flagged_total = query(&records, &flagged, 0, 100).total;
        let clean_total = query(&records, &clean, 0, 100).total;
        assert_eq!(flagged_total + clean_total, records.len());
        assert!(query(&records, &flagged, 0, 100)
            .items
            .iter()
            .any(|r| r.file_path.contains("sample")));
    }

    #[test]
    fn test_total_and_item_count_for_all_filter_combinations() {
        let records = dataset();
        let steps = [None, Some(true), Some(false)];
        let widths = [None, Some(WidthClass::Wide), Some(WidthClass::Narrow)];
        let chairs = [None, Some(ChairType::Movable), Some(ChairType::Fixed), Some(ChairType::Floor)];
        let relabels = [None, Some(true), Some(false)];

        for has_step in steps {
            for width_class in widths {
                for chair_type in chairs {
                    for needs_relabeling in relabels {
                        let filter = ImageFilter {
                            has_step,
                            width_class,
                            chair_type,
                            needs_relabeling,
                        };
                        let expected = records.iter().filter(|r| filter.matches(r)).count();
                        for (skip, limit) in [(0, 1), (0, 20), (2, 2), (5, 100)] {
                            let page = query(&records, &filter, skip, limit);
                            assert_eq!(page.total, expected);
                            assert_eq!(page.items.len(), expected_len(expected, skip, limit));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_page_map_keeps_counts() {
        let records = dataset();
        let page = query(&records, &ImageFilter::default(), 1, 2).map(|r| r.file_path.clone());
        assert_eq!(page.total, records.len());
        assert_eq!(page.items, vec!["batch_01/photo1.webp", "batch_02/photo2.webp"]);
    }
}
