//! Rule-based improvement suggestions for a single record

use serde::Serialize;

use crate::record::{AccessibilityRecord, WidthClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Suggestions derived purely from the record's attributes
pub fn recommendations(record: &AccessibilityRecord) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if record.has_step {
        out.push(Recommendation {
            priority: Priority::High,
            category: "단차",
            title: "경사로 설치 권장",
            description: "휠체어 사용자를 위한 경사로 설치를 권장합니다.",
        });
    }

    if record.has_width(WidthClass::Narrow) || record.has_width(WidthClass::NotPassable) {
        out.push(Recommendation {
            priority: Priority::High,
            category: "통로",
            title: "통로 확장 필요",
            description: "최소 0.9m 이상의 통로 너비 확보가 필요합니다.",
        });
    }

    if !record.chair.has_movable_chair {
        out.push(Recommendation {
            priority: Priority::Medium,
            category: "의자",
            title: "이동 가능한 의자 배치 권장",
            description: "다양한 신체 조건의 고객을 위해 이동 가능한 의자를 배치하는 것이 좋습니다.",
        });
    }

    out
}
