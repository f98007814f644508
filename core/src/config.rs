//! Pipeline configuration.
//!
//! One configuration object covers every historical variant of the analysis:
//! fixed 60/15 targets with unit-step adjustment and no color partitioning,
//! or data-derived per-type targets with mode substitution.
//!
//! # Example YAML
//!
//! ```yaml
//! target_mode: derived
//! fixed_targets:
//!   main: 60
//!   sideboard: 15
//! adjustment: mode_substitution
//! uses_color_partitioning: true
//! uses_subtype_grouping: true
//! max_iterations: 1000
//! malformed_lines: skip
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Where reconciliation targets come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// Per (sideboard, type) group, target is the type-level `final_qty`.
    #[default]
    Derived,
    /// Per sideboard flag, target is [`FixedTargets`].
    Fixed,
}

/// How the reconciler moves a group toward its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// Replace a card's quantity with its second most frequent quantity,
    /// most credible second mode first.
    #[default]
    ModeSubstitution,
    /// Move one copy at a time on the card furthest from its mean.
    UnitStep,
}

/// What the parser does with lines that are not `<qty> <name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MalformedLinePolicy {
    /// Drop the line and record it in the parse diagnostics.
    #[default]
    Skip,
    /// Fail the parse with [`PipelineError::MalformedLine`].
    Reject,
}

/// Target card counts used with [`TargetMode::Fixed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedTargets {
    pub main: u32,
    pub sideboard: u32,
}

impl Default for FixedTargets {
    fn default() -> Self {
        Self {
            main: 60,
            sideboard: 15,
        }
    }
}

impl FixedTargets {
    /// Returns the target for one section.
    pub fn for_section(&self, sideboard: bool) -> u32 {
        if sideboard { self.sideboard } else { self.main }
    }
}

/// Default iteration cap of the reconciler.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Full analysis configuration.
///
/// # Examples
///
/// ```
/// use deckstats_core::{Adjustment, PipelineConfig, TargetMode};
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.target_mode, TargetMode::Derived);
/// assert_eq!(config.adjustment, Adjustment::ModeSubstitution);
/// assert!(config.uses_color_partitioning);
///
/// let legacy = PipelineConfig::legacy();
/// assert_eq!(legacy.fixed_targets.main, 60);
/// assert!(!legacy.uses_color_partitioning);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub target_mode: TargetMode,
    pub fixed_targets: FixedTargets,
    pub adjustment: Adjustment,
    pub uses_color_partitioning: bool,
    pub uses_subtype_grouping: bool,
    pub max_iterations: usize,
    pub malformed_lines: MalformedLinePolicy,
    /// Number of cohorts processed in parallel (`None` = rayon default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_mode: TargetMode::Derived,
            fixed_targets: FixedTargets::default(),
            adjustment: Adjustment::ModeSubstitution,
            uses_color_partitioning: true,
            uses_subtype_grouping: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            malformed_lines: MalformedLinePolicy::Skip,
            jobs: None,
        }
    }
}

impl PipelineConfig {
    /// The simplified variant: fixed 60/15 targets, unit steps, one cohort,
    /// no subtype table.
    pub fn legacy() -> Self {
        Self {
            target_mode: TargetMode::Fixed,
            adjustment: Adjustment::UnitStep,
            uses_color_partitioning: false,
            uses_subtype_grouping: false,
            ..Self::default()
        }
    }

    /// Checks the configuration for values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the iteration cap or the job
    /// count is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(PipelineError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.jobs == Some(0) {
            return Err(PipelineError::Config("jobs must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_yaml_uses_defaults() {
        let yaml = "target_mode: fixed\nfixed_targets: { main: 40, sideboard: 0 }\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.target_mode, TargetMode::Fixed);
        assert_eq!(config.fixed_targets.for_section(false), 40);
        assert_eq!(config.fixed_targets.for_section(true), 0);
        assert_eq!(config.adjustment, Adjustment::ModeSubstitution);
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(config.uses_subtype_grouping);
    }

    #[test]
    fn test_snake_case_enums() {
        let yaml = "adjustment: unit_step\nmalformed_lines: reject\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.adjustment, Adjustment::UnitStep);
        assert_eq!(config.malformed_lines, MalformedLinePolicy::Reject);
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let config = PipelineConfig {
            max_iterations: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let config = PipelineConfig {
            jobs: Some(0),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
