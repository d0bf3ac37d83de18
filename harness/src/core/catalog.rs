//! Task templates and plural-to-singular phrase rewriting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

const EASY: &[&str] = &[
    "Look for studio apartments in Liverpool City Centre with rent under £700 per month.",
    "Search for furnished studio and 1-bedroom apartments in Los Angeles available for under $1,800 per month.",
];

const ADVANCED: &[&str] = &[
    "Find pet-friendly studio flats for rent London within less than half a mile from the nearest metro station.",
    "Find new-built detached houses for rent in Greater Manchester with at least 3 bedrooms and off-street parking.",
    "Find furnished student apartments near the University of Texas at Austin for less than $1,500 per person per month, ranked by price per person.",
];

const PHRASES: &[(&str, &str)] = &[
    ("studio apartments", "a studio apartment"),
    (
        "furnished studio or 1-bedroom apartments",
        "a furnished studio or 1-bedroom apartment",
    ),
    ("listings", "listing"),
    ("pet-friendly studio flats", "a pet-friendly studio flat"),
    ("new-built detached houses", "a new-built detached house"),
    ("furnished student apartments", "a furnished student apartment"),
];

/// Difficulty tier -> ordered task templates.
///
/// Tiers are kept in a `BTreeMap` so listings and error messages are stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCatalog {
    tiers: BTreeMap<String, Vec<String>>,
}

impl TaskCatalog {
    pub fn new(tiers: BTreeMap<String, Vec<String>>) -> Self {
        Self { tiers }
    }

    /// Resolve `tiers[difficulty][id_query]`.
    pub fn template(&self, difficulty: &str, id_query: usize) -> Result<&str, QueryError> {
        let templates = self
            .tiers
            .get(difficulty)
            .ok_or_else(|| QueryError::UnknownTemplateIndex {
                difficulty: difficulty.to_string(),
                id_query,
                available: format!("tiers {}", self.tier_names().join(", ")),
            })?;
        templates
            .get(id_query)
            .map(String::as_str)
            .ok_or_else(|| QueryError::UnknownTemplateIndex {
                difficulty: difficulty.to_string(),
                id_query,
                available: if templates.is_empty() {
                    "no templates".to_string()
                } else {
                    format!("ids 0..={}", templates.len() - 1)
                },
            })
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.keys().map(String::as_str).collect()
    }

    /// Iterate tiers in name order.
    pub fn tiers(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.tiers
            .iter()
            .map(|(name, templates)| (name.as_str(), templates.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        let tiers = [("easy", EASY), ("advanced", ADVANCED)]
            .into_iter()
            .map(|(name, templates)| {
                (
                    name.to_string(),
                    templates.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Self { tiers }
    }
}

/// One plural phrase and the singular wording that replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseRule {
    pub plural: String,
    pub singular: String,
}

/// Ordered substitution table used for singular phrasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhraseTable {
    rules: Vec<PhraseRule>,
}

impl PhraseTable {
    pub fn new(rules: Vec<PhraseRule>) -> Self {
        Self { rules }
    }

    /// Replace every plural phrase with its singular form, in table order.
    pub fn singularize(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| {
                acc.replace(&rule.plural, &rule.singular)
            })
    }

    /// Check that rewriting is idempotent: no singular form may reintroduce a
    /// plural source phrase.
    ///
    /// Returns a list of stable error messages (empty on success).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.plural.trim().is_empty() {
                errors.push(format!("phrases[{idx}]: plural must be non-empty"));
                continue;
            }
            for other in &self.rules {
                if !other.plural.is_empty() && rule.singular.contains(&other.plural) {
                    errors.push(format!(
                        "phrases[{idx}]: singular '{}' contains plural phrase '{}'",
                        rule.singular, other.plural
                    ));
                }
            }
        }
        errors
    }
}

impl Default for PhraseTable {
    fn default() -> Self {
        Self {
            rules: PHRASES
                .iter()
                .map(|(plural, singular)| PhraseRule {
                    plural: plural.to_string(),
                    singular: singular.to_string(),
                })
                .collect(),
        }
    }
}
