//! Error types for query synthesis and metrics validation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the query synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The cardinality parameters describe an incoherent task.
    #[error(
        "invalid combination of num_listings ({}) and num_websites ({})",
        display_count(.num_listings),
        display_count(.num_websites)
    )]
    InvalidParameterCombination {
        num_listings: Option<u32>,
        num_websites: Option<u32>,
    },

    /// `difficulty`/`id_query` do not resolve to a catalog entry.
    #[error("unknown template: difficulty '{difficulty}' has no query {id_query} (available: {available})")]
    UnknownTemplateIndex {
        difficulty: String,
        id_query: usize,
        available: String,
    },
}

/// Errors returned while applying updates to a metrics document.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// One or more failure reasons are outside the vocabulary.
    #[error("invalid {field}: {}; must be one of [{}]", .invalid.join(", "), .allowed.join(", "))]
    InvalidFailureReason {
        field: String,
        invalid: Vec<String>,
        allowed: Vec<String>,
    },

    /// The document is not valid JSON or not a JSON object.
    #[error("malformed metrics document {}: {reason}", .path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    /// The document could not be read or written.
    #[error("cannot access metrics document {}", .path.display())]
    DocumentAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MetricsError {
    /// True for errors caused by the update values rather than the document.
    pub fn is_rejection(&self) -> bool {
        matches!(self, MetricsError::InvalidFailureReason { .. })
    }
}

fn display_count(count: &Option<u32>) -> String {
    count.map_or_else(|| "none".to_string(), |n| n.to_string())
}
