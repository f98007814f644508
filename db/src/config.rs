//! Run configuration for analysis batches.
//!
//! Wraps the pipeline settings with the paths of one analysis run.
//!
//! # Example YAML
//!
//! ```yaml
//! format: premodern
//! archetype: goblins
//! corpus_dir: decklists
//! card_db: cards_db.json
//! authoritative_cards: cards_db.csv
//! output_dir: reports
//! report_formats: [csv, json, markdown]
//! pipeline:
//!   target_mode: derived
//!   adjustment: mode_substitution
//!   uses_color_partitioning: true
//!   max_iterations: 1000
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use deckstats_core::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Output formats of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One CSV file per table and partition, plus the final decklists.
    Csv,
    /// The whole report bundle.
    Json,
    /// A single human-readable document.
    Markdown,
}

/// Settings for one analysis run.
///
/// Every field has a default so a partial file is valid.
///
/// # Examples
///
/// ```
/// use deckstats_db::{ReportFormat, RunConfig};
///
/// let config: RunConfig = serde_yaml::from_str("format: Old School\narchetype: The Deck\n").unwrap();
/// assert_eq!(config.format, "Old School");
/// assert_eq!(config.report_formats, vec![ReportFormat::Csv]);
/// assert_eq!(config.pipeline.max_iterations, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub format: String,
    pub archetype: String,
    /// Root of the decklist corpus (`<root>/<format>/<archetype>/*.txt`).
    pub corpus_dir: PathBuf,
    /// JSON card database.
    pub card_db: PathBuf,
    /// Optional authoritative CSV merged into the card database first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authoritative_cards: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub report_formats: Vec<ReportFormat>,
    pub pipeline: PipelineConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            format: String::new(),
            archetype: String::new(),
            corpus_dir: PathBuf::from("decklists"),
            card_db: PathBuf::from("cards_db.json"),
            authoritative_cards: None,
            output_dir: PathBuf::from("reports"),
            report_formats: vec![ReportFormat::Csv],
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RunConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::StoreError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::StoreError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckstats_core::{Adjustment, TargetMode};

    fn sample_yaml() -> &'static str {
        r#"
format: premodern
archetype: goblins
corpus_dir: /data/decklists
card_db: /data/cards_db.json
authoritative_cards: /data/cards.csv
output_dir: /data/reports
report_formats: [csv, markdown]
pipeline:
  target_mode: fixed
  fixed_targets:
    main: 60
    sideboard: 15
  adjustment: unit_step
  uses_color_partitioning: false
  uses_subtype_grouping: false
  max_iterations: 500
  malformed_lines: reject
  jobs: 2
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: RunConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.archetype, "goblins");
        assert_eq!(config.authoritative_cards, Some(PathBuf::from("/data/cards.csv")));
        assert_eq!(config.report_formats, vec![ReportFormat::Csv, ReportFormat::Markdown]);
        assert_eq!(config.pipeline.target_mode, TargetMode::Fixed);
        assert_eq!(config.pipeline.adjustment, Adjustment::UnitStep);
        assert_eq!(config.pipeline.max_iterations, 500);
        assert_eq!(config.pipeline.jobs, Some(2));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: RunConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yml");
        let config: RunConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.save(&path).unwrap();
        assert_eq!(RunConfig::load(&path).unwrap(), config);
    }
}
