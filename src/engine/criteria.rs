use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Highest meaningful minimum-bedrooms value; it selects the `5+` bucket
pub const MAX_MIN_BEDROOMS: u8 = 5;

/// Closed interval `[min, max]`.
///
/// An inverted interval is representable on purpose: it contains nothing,
/// so the views it filters come out empty until a bound is corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd> Range<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.min <= *value && *value <= self.max
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

impl Range<String> {
    /// Lexicographic membership for `YYYY-MM` keys
    pub fn contains_key(&self, key: &str) -> bool {
        self.min.as_str() <= key && key <= self.max.as_str()
    }
}

/// A set of selected labels where the empty set means "all labels".
///
/// `admits` is the only place that rule lives; callers never test the
/// set for emptiness themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    members: BTreeSet<String>,
}

impl Selection {
    /// The unrestricted selection
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// True when nothing is explicitly selected, i.e. every label passes
    pub fn is_unrestricted(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether a label passes this selection
    pub fn admits(&self, label: &str) -> bool {
        self.is_unrestricted() || self.members.contains(label)
    }

    /// Whether a label is explicitly selected
    pub fn contains(&self, label: &str) -> bool {
        self.members.contains(label)
    }

    /// Add the label if absent, remove it if present
    pub fn toggled(&self, label: &str) -> Self {
        let mut members = self.members.clone();
        if !members.remove(label) {
            members.insert(label.to_string());
        }
        Self { members }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// User-chosen filter bounds and selections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub price_range: Range<f64>,
    pub property_types: Selection,
    pub locations: Selection,
    pub date_range: Range<String>,
    /// 0 is unrestricted, 5 means five or more
    pub min_bedrooms: u8,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            price_range: Range::new(0.0, 0.0),
            property_types: Selection::all(),
            locations: Selection::all(),
            date_range: Range::new(String::new(), String::new()),
            min_bedrooms: 0,
        }
    }
}

/// A single change to one criterion field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum CriterionUpdate {
    MinPrice(f64),
    MaxPrice(f64),
    StartMonth(String),
    EndMonth(String),
    TogglePropertyType(String),
    ToggleLocation(String),
    MinBedrooms(u8),
}
