//! Harness configuration loaded from an optional TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::catalog::{PhraseTable, TaskCatalog};
use crate::core::synth::QuerySynthesizer;
use crate::core::vocabulary::FailureVocabulary;

/// Harness configuration (TOML).
///
/// Every table falls back to the built-in defaults when omitted, so an empty
/// file is equivalent to no file at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Permitted values for `primary_failure` / `secondary_failure`.
    pub failure_reasons: FailureVocabulary,

    /// Difficulty tier -> ordered task templates.
    pub catalog: TaskCatalog,

    /// Plural -> singular rewrites applied for single-listing prompts.
    pub phrases: PhraseTable,
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.catalog.is_empty() {
            errors.push("catalog must define at least one difficulty tier".to_string());
        }
        for (tier, templates) in self.catalog.tiers() {
            if templates.is_empty() {
                errors.push(format!("catalog.{tier} must contain at least one template"));
            }
            for (idx, template) in templates.iter().enumerate() {
                if template.trim().is_empty() {
                    errors.push(format!("catalog.{tier}[{idx}] must be non-empty"));
                }
            }
        }
        errors.extend(self.phrases.validate());
        errors.extend(self.failure_reasons.validate());

        if !errors.is_empty() {
            return Err(anyhow!("invalid config:\n- {}", errors.join("\n- ")));
        }
        Ok(())
    }

    pub fn synthesizer(&self) -> QuerySynthesizer {
        QuerySynthesizer::new(self.catalog.clone(), self.phrases.clone())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HarnessConfig::default()`.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    if !path.exists() {
        let cfg = HarnessConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HarnessConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
