//! Closed vocabulary of run failure reasons.
//!
//! Only two metrics fields are constrained:
//! - `primary_failure`: a single member of the vocabulary.
//! - `secondary_failure`: `null` or a list whose elements are all members.
//!   Any other value is reported as the single offender.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MetricsError;

pub const PRIMARY_FAILURE: &str = "primary_failure";
pub const SECONDARY_FAILURE: &str = "secondary_failure";

const FAILURE_REASONS: &[&str] = &[
    "accepting_cookies",
    "captcha",
    "code_error_action_specification",
    "code_error_answer_formatting",
    "early_stopping",
    "limit_reached",
    "repetitive_steps",
    "repetitive_steps_with_new_links",
    "results_incomplete",
    "step_failure",
    "token_limitation",
    "tool_use",
    "tool_use_IamUnableTO",
    "interrupted",
    "guarded_content",
    "new_window_unaccessible",
    "listing_detail_url",
    "listing_detail_address",
    "listing_detail_price",
    "filter_use",
    "google_query_too_specific",
];

/// Ordered set of permitted failure-reason tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureVocabulary {
    reasons: Vec<String>,
}

impl FailureVocabulary {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn contains(&self, reason: &str) -> bool {
        self.reasons.iter().any(|known| known == reason)
    }

    /// Validate a single `(key, value)` update. Unconstrained keys always pass.
    pub fn check_update(&self, key: &str, value: &Value) -> Result<(), MetricsError> {
        match key {
            PRIMARY_FAILURE => {
                if self.is_member(value) {
                    return Ok(());
                }
                Err(self.invalid(key, vec![value.to_string()]))
            }
            SECONDARY_FAILURE => match value {
                Value::Null => Ok(()),
                Value::Array(items) => {
                    let invalid: Vec<String> = items
                        .iter()
                        .filter(|item| !self.is_member(item))
                        .map(Value::to_string)
                        .collect();
                    if invalid.is_empty() {
                        Ok(())
                    } else {
                        Err(self.invalid(key, invalid))
                    }
                }
                other => Err(self.invalid(key, vec![other.to_string()])),
            },
            _ => Ok(()),
        }
    }

    /// Check structural sanity of a configured vocabulary.
    ///
    /// Returns a list of stable error messages (empty on success).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.reasons.is_empty() {
            errors.push("failure_reasons must be non-empty".to_string());
        }
        for (idx, reason) in self.reasons.iter().enumerate() {
            if reason.trim().is_empty() {
                errors.push(format!("failure_reasons[{idx}] must be non-empty"));
            }
            if self.reasons[..idx].contains(reason) {
                errors.push(format!("duplicate failure reason '{reason}'"));
            }
        }
        errors
    }

    fn is_member(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|reason| self.contains(reason))
    }

    fn invalid(&self, field: &str, invalid: Vec<String>) -> MetricsError {
        MetricsError::InvalidFailureReason {
            field: field.to_string(),
            invalid,
            allowed: self.reasons.clone(),
        }
    }
}

impl Default for FailureVocabulary {
    fn default() -> Self {
        Self {
            reasons: FAILURE_REASONS.iter().map(|r| r.to_string()).collect(),
        }
    }
}
