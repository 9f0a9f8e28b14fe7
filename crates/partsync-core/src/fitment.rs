use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One ACES application: a part number that fits a make/model over an
/// inclusive year range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitmentEntry {
    pub part_number: String,
    /// Opaque vehicle make id.
    pub make: String,
    /// Opaque vehicle model id.
    pub model: String,
    pub part_type: Option<String>,
    pub position: Option<String>,
    pub year_from: String,
    pub year_to: String,
}

/// Uniqueness key for fitment dedup and upsert.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FitmentKey {
    pub part_number: String,
    pub year_from: String,
    pub year_to: String,
    pub make: String,
    pub model: String,
}

impl FitmentEntry {
    /// Returns `true` when every key field is non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.part_number,
            &self.make,
            &self.model,
            &self.year_from,
            &self.year_to,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    #[must_use]
    pub fn key(&self) -> FitmentKey {
        FitmentKey {
            part_number: self.part_number.clone(),
            year_from: self.year_from.clone(),
            year_to: self.year_to.clone(),
            make: self.make.clone(),
            model: self.model.clone(),
        }
    }
}

/// Removes entries whose [`FitmentKey`] was already seen, keeping the first
/// occurrence and the original order.
#[must_use]
pub fn dedup_fitments(entries: Vec<FitmentEntry>) -> Vec<FitmentEntry> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.key()))
        .collect()
}
