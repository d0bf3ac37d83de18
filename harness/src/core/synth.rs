//! Query synthesis: task template + cardinality -> agent prompt.
//!
//! Rules:
//! - Incoherent cardinality pairs are rejected before any lookup.
//! - Singular phrasing applies when a count is given and none exceeds one.
//!   A fully unconstrained prompt keeps the template wording, even though
//!   "every count is 1 or unset" alone would make `(None, None)` singular.
//! - The instruction clause depends only on which counts are set.

use crate::core::catalog::{PhraseTable, TaskCatalog};
use crate::error::QueryError;

const DETAIL_SINGLE: &str =
    "Provide the address, price, and the direct link to the listing's detail page.";
const DETAIL_EACH: &str =
    "Provide the address, price, and the direct link to the listing's detail page for each one.";

/// Requested number of listings and source websites; `None` is unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cardinality {
    pub num_listings: Option<u32>,
    pub num_websites: Option<u32>,
}

/// Whether the template keeps its plural wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrasing {
    Singular,
    Plural,
}

impl Cardinality {
    pub fn new(num_listings: Option<u32>, num_websites: Option<u32>) -> Self {
        Self {
            num_listings,
            num_websites,
        }
    }

    /// Reject pairs that describe an incoherent task.
    pub fn validate(&self) -> Result<(), QueryError> {
        let invalid = match (self.num_listings, self.num_websites) {
            (None, Some(1)) | (Some(1), None) => true,
            (Some(listings), Some(1)) if listings > 1 => true,
            (Some(listings), Some(websites)) => websites > listings,
            _ => false,
        };
        if invalid {
            return Err(QueryError::InvalidParameterCombination {
                num_listings: self.num_listings,
                num_websites: self.num_websites,
            });
        }
        Ok(())
    }

    pub fn phrasing(&self) -> Phrasing {
        let at_most_one = |count: Option<u32>| matches!(count, None | Some(1));
        let constrained = self.num_listings.is_some() || self.num_websites.is_some();
        if constrained && at_most_one(self.num_listings) && at_most_one(self.num_websites) {
            Phrasing::Singular
        } else {
            Phrasing::Plural
        }
    }

    /// Instruction clause appended after the task description, if any.
    pub fn instruction(&self) -> Option<String> {
        match (self.num_listings, self.num_websites) {
            (None, None) => None,
            (Some(1), Some(1)) => Some(DETAIL_SINGLE.to_string()),
            (Some(listings), Some(websites)) => Some(format!(
                "Find {listings} listings from {websites} different websites. {DETAIL_EACH}"
            )),
            (Some(listings), None) => Some(format!("Find {listings} listings. {DETAIL_EACH}")),
            (None, Some(websites)) => {
                Some(format!("Find listings from {websites} websites. {DETAIL_EACH}"))
            }
        }
    }
}

/// Builds agent prompts from an injected catalog and phrase table.
#[derive(Debug, Clone, Default)]
pub struct QuerySynthesizer {
    catalog: TaskCatalog,
    phrases: PhraseTable,
}

impl QuerySynthesizer {
    pub fn new(catalog: TaskCatalog, phrases: PhraseTable) -> Self {
        Self { catalog, phrases }
    }

    /// Produce the prompt for `catalog[difficulty][id_query]` under `cardinality`.
    pub fn synthesize(
        &self,
        cardinality: Cardinality,
        difficulty: &str,
        id_query: usize,
    ) -> Result<String, QueryError> {
        cardinality.validate()?;
        let template = self.catalog.template(difficulty, id_query)?;
        let query = match cardinality.phrasing() {
            Phrasing::Singular => self.phrases.singularize(template),
            Phrasing::Plural => template.to_string(),
        };
        Ok(match cardinality.instruction() {
            Some(instruction) => format!("{query} {instruction}"),
            None => query,
        })
    }
}
