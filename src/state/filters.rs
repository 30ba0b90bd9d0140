//! Active filter set and the facet chips that drive it.
//!
//! A [`FilterSet`] holds at most one value per [`FilterKey`]. Chips are grouped by
//! [`Facet`]; activating a chip replaces whatever its facet had selected, and
//! activating it a second time clears the facet again.

use std::collections::BTreeMap;
use std::fmt;

use crate::api::{
    FacetCounts, FacetItem, HANDOFF_ACTIVE_LABEL, RLHF_NOT_VALIDATED_LABEL, RLHF_VALIDATED_LABEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    Category,
    Subcategory,
    Agent,
    ConfidenceMin,
    ConfidenceMax,
    HasHandoff,
    Rlhf,
}

impl FilterKey {
    /// Query parameter name understood by the list endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::Category => "category",
            FilterKey::Subcategory => "subcategory",
            FilterKey::Agent => "agent",
            FilterKey::ConfidenceMin => "confidence_min",
            FilterKey::ConfidenceMax => "confidence_max",
            FilterKey::HasHandoff => "has_handoff",
            FilterKey::Rlhf => "rlhf",
        }
    }
}

/// Value held for a key. Text for the free-form facets, scores for the
/// confidence bounds, flags for handoff and RLHF.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Score(f64),
    Flag(bool),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => f.write_str(text),
            FilterValue::Score(score) => write!(f, "{}", score),
            FilterValue::Flag(flag) => write!(f, "{}", flag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Category,
    Subcategory,
    Agent,
    Confidence,
    Handoff,
    Rlhf,
}

impl Facet {
    pub fn title(self) -> &'static str {
        match self {
            Facet::Category => "Category",
            Facet::Subcategory => "Subcategory",
            Facet::Agent => "Agent",
            Facet::Confidence => "Confidence",
            Facet::Handoff => "Handoff",
            Facet::Rlhf => "RLHF",
        }
    }

    /// Keys owned by this facet. Confidence owns both bounds.
    pub fn keys(self) -> &'static [FilterKey] {
        match self {
            Facet::Category => &[FilterKey::Category],
            Facet::Subcategory => &[FilterKey::Subcategory],
            Facet::Agent => &[FilterKey::Agent],
            Facet::Confidence => &[FilterKey::ConfidenceMin, FilterKey::ConfidenceMax],
            Facet::Handoff => &[FilterKey::HasHandoff],
            Facet::Rlhf => &[FilterKey::Rlhf],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChipTarget {
    /// Sets the facet's single key.
    Value(FilterValue),
    /// Sets both confidence bounds.
    Range { min: f64, max: f64 },
    /// Leaves the facet unrestricted.
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chip {
    pub facet: Facet,
    pub label: String,
    pub count: Option<u64>,
    pub target: ChipTarget,
}

impl Chip {
    pub fn is_active(&self, filters: &FilterSet) -> bool {
        match &self.target {
            ChipTarget::Value(value) => filters.get(self.facet.keys()[0]) == Some(value),
            ChipTarget::Range { min, max } => {
                filters.get(FilterKey::ConfidenceMin) == Some(&FilterValue::Score(*min))
                    && filters.get(FilterKey::ConfidenceMax) == Some(&FilterValue::Score(*max))
            }
            ChipTarget::Any => self.facet.keys().iter().all(|k| !filters.contains(*k)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacetGroup {
    pub facet: Facet,
    pub chips: Vec<Chip>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
    entries: BTreeMap<FilterKey, FilterValue>,
}

impl Default for FilterSet {
    /// Unvalidated conversations only.
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(FilterKey::Rlhf, FilterValue::Flag(false));
        Self { entries }
    }
}

impl FilterSet {
    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: FilterKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activate `chip`, or clear its facet if it was already active.
    ///
    /// Returns whether the chip is active afterwards.
    pub fn toggle(&mut self, chip: &Chip) -> bool {
        let was_active = chip.is_active(self);
        self.clear_facet(chip.facet);

        if was_active {
            return matches!(chip.target, ChipTarget::Any);
        }

        match &chip.target {
            ChipTarget::Value(value) => {
                self.entries.insert(chip.facet.keys()[0], value.clone());
            }
            ChipTarget::Range { min, max } => {
                self.entries
                    .insert(FilterKey::ConfidenceMin, FilterValue::Score(*min));
                self.entries
                    .insert(FilterKey::ConfidenceMax, FilterValue::Score(*max));
            }
            ChipTarget::Any => {}
        }
        true
    }

    /// Back to the load-time default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn clear_facet(&mut self, facet: Facet) {
        for key in facet.keys() {
            self.entries.remove(key);
        }
    }

    /// Query pairs for the list endpoint, one per present key.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.to_string()))
            .collect()
    }
}

fn item_chips(facet: Facet, items: &[FacetItem]) -> Vec<Chip> {
    items
        .iter()
        .map(|item| Chip {
            facet,
            label: if item.name.is_empty() {
                "Not defined".to_string()
            } else {
                item.name.clone()
            },
            count: Some(item.count),
            target: ChipTarget::Value(FilterValue::Text(item.name.clone())),
        })
        .collect()
}

/// Build every facet group shown in the filter pane.
pub fn build_groups(facets: &FacetCounts) -> Vec<FacetGroup> {
    let confidence = facets
        .confidence_ranges
        .iter()
        .map(|range| Chip {
            facet: Facet::Confidence,
            label: range.name.clone(),
            count: range.count,
            target: ChipTarget::Range {
                min: range.min,
                max: range.max,
            },
        })
        .collect();

    let handoff = facets
        .handoff_status
        .iter()
        .map(|status| Chip {
            facet: Facet::Handoff,
            label: status.name.clone(),
            count: Some(status.count),
            target: ChipTarget::Value(FilterValue::Flag(status.name == HANDOFF_ACTIVE_LABEL)),
        })
        .collect();

    let rlhf = vec![
        Chip {
            facet: Facet::Rlhf,
            label: "All".to_string(),
            count: None,
            target: ChipTarget::Any,
        },
        Chip {
            facet: Facet::Rlhf,
            label: "Validated".to_string(),
            count: Some(facets.rlhf_count(RLHF_VALIDATED_LABEL)),
            target: ChipTarget::Value(FilterValue::Flag(true)),
        },
        Chip {
            facet: Facet::Rlhf,
            label: "Not validated".to_string(),
            count: Some(facets.rlhf_count(RLHF_NOT_VALIDATED_LABEL)),
            target: ChipTarget::Value(FilterValue::Flag(false)),
        },
    ];

    vec![
        FacetGroup {
            facet: Facet::Category,
            chips: item_chips(Facet::Category, &facets.categories),
        },
        FacetGroup {
            facet: Facet::Subcategory,
            chips: item_chips(Facet::Subcategory, &facets.subcategories),
        },
        FacetGroup {
            facet: Facet::Agent,
            chips: item_chips(Facet::Agent, &facets.agents),
        },
        FacetGroup {
            facet: Facet::Confidence,
            chips: confidence,
        },
        FacetGroup {
            facet: Facet::Handoff,
            chips: handoff,
        },
        FacetGroup {
            facet: Facet::Rlhf,
            chips: rlhf,
        },
    ]
}
