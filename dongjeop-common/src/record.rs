//! Labeled photo records
//!
//! One line of the JSONL dataset deserializes into one [`AccessibilityRecord`].
//! `file_path` is the only required key. Every other attribute falls back to
//! its most accessible value when absent or `null`: no step, no observed
//! width bucket, no chair flags. Unknown width buckets are dropped from the
//! set with a warning; the rest of the record still loads.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::Error;

/// Passage-width bucket observed in a photo
///
/// Declaration order is the scoring precedence (wide first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthClass {
    Wide,
    Normal,
    Narrow,
    NotPassable,
}

impl WidthClass {
    /// All buckets in precedence order
    pub const ALL: [WidthClass; 4] = [
        WidthClass::Wide,
        WidthClass::Normal,
        WidthClass::Narrow,
        WidthClass::NotPassable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WidthClass::Wide => "wide",
            WidthClass::Normal => "normal",
            WidthClass::Narrow => "narrow",
            WidthClass::NotPassable => "not_passable",
        }
    }
}

impl fmt::Display for WidthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidthClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidthClass::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown width class: {}", s)))
    }
}

/// Seating flags; any combination is valid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChairInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub has_movable_chair: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub has_high_movable_chair: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub has_fixed_chair: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub has_floor_chair: bool,
}

/// Chair filter selector, mapped onto one [`ChairInfo`] flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChairType {
    Movable,
    HighMovable,
    Fixed,
    Floor,
}

impl ChairType {
    /// Whether the given seating has this chair type
    pub fn present_in(self, chair: &ChairInfo) -> bool {
        match self {
            ChairType::Movable => chair.has_movable_chair,
            ChairType::HighMovable => chair.has_high_movable_chair,
            ChairType::Fixed => chair.has_fixed_chair,
            ChairType::Floor => chair.has_floor_chair,
        }
    }
}

/// One labeled photo (ground truth or machine-labeled)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityRecord {
    /// Relative path `"<batch>/<filename>"`, unique key
    pub file_path: String,

    /// Batch name, set on machine-labeled records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,

    /// Ramp/threshold obstruction present
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_step: bool,

    /// Width buckets observed in the image (several passages may be visible)
    #[serde(default, deserialize_with = "known_width_classes")]
    pub width_class: BTreeSet<WidthClass>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub chair: ChairInfo,

    /// Model confidence in [0, 1]; absent on human labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl AccessibilityRecord {
    /// Record with every optional attribute at its default
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            batch: None,
            has_step: false,
            width_class: BTreeSet::new(),
            chair: ChairInfo::default(),
            confidence: None,
        }
    }

    pub fn has_width(&self, width: WidthClass) -> bool {
        self.width_class.contains(&width)
    }
}

/// `null` reads as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Width list that keeps the recognized buckets
///
/// A bare string counts as a one-element list; `null` is an empty set.
fn known_width_classes<'de, D>(deserializer: D) -> Result<BTreeSet<WidthClass>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(entries) => entries,
        single @ Value::String(_) => vec![single],
        other => {
            warn!("Ignoring width_class that is not a list: {}", other);
            Vec::new()
        }
    };

    let mut widths = BTreeSet::new();
    for entry in entries {
        match entry.as_str().map(WidthClass::from_str) {
            Some(Ok(width)) => {
                widths.insert(width);
            }
            _ => warn!("Ignoring unknown width_class entry: {}", entry),
        }
    }
    Ok(widths)
}
