//! Report bundle and table rendering.
//!
//! The type and card tables have a fixed column order shared by the CSV and
//! Markdown renderings. JSON serializes the whole [`ReportBundle`].

use std::io::Write;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::parser::MalformedLine;
use crate::pipeline::{AnalysisRun, PartitionReport};
use crate::store::UnknownCardWarning;
use crate::types::{CardAggregate, MODE_RANKS, TypeAggregate};

/// Errors raised while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Provenance of a report, supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMeta {
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub archetype: String,
    /// Hex SHA-256 over the ordered input blobs.
    pub corpus_fingerprint: String,
}

/// A cohort failure in serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortErrorEntry {
    pub deck_colors: String,
    pub message: String,
}

/// Serializable output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub generated_at: String,
    pub format: String,
    pub archetype: String,
    pub corpus_fingerprint: String,
    pub config: PipelineConfig,
    pub decklists: usize,
    pub partitions: Vec<PartitionReport>,
    #[serde(default)]
    pub errors: Vec<CohortErrorEntry>,
    #[serde(default)]
    pub malformed: Vec<MalformedLine>,
    #[serde(default)]
    pub unknown_cards: Vec<UnknownCardWarning>,
}

impl ReportBundle {
    pub fn new(run: AnalysisRun, meta: ReportMeta, config: PipelineConfig) -> Self {
        Self {
            generated_at: meta.generated_at,
            format: run.format,
            archetype: meta.archetype,
            corpus_fingerprint: meta.corpus_fingerprint,
            config,
            decklists: run.decklists,
            partitions: run.partitions,
            errors: run
                .errors
                .into_iter()
                .map(|failure| CohortErrorEntry {
                    deck_colors: failure.deck_colors,
                    message: failure.error.to_string(),
                })
                .collect(),
            malformed: run.malformed,
            unknown_cards: run.unknown_cards,
        }
    }

    /// Writes the bundle as pretty-printed JSON and flushes `writer`.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Renders the whole bundle as a Markdown document.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {} / {}\n\n", self.format, self.archetype));
        out.push_str(&format!(
            "- generated at: {}\n- decklists: {}\n- corpus fingerprint: `{}`\n",
            self.generated_at, self.decklists, self.corpus_fingerprint
        ));
        if !self.malformed.is_empty() {
            out.push_str(&format!("- malformed lines skipped: {}\n", self.malformed.len()));
        }
        if !self.unknown_cards.is_empty() {
            out.push_str(&format!("- cards without metadata: {}\n", self.unknown_cards.len()));
        }
        out.push('\n');

        for partition in &self.partitions {
            out.push_str(&format!(
                "## {} ({} decklists)\n\n",
                partition_title(&partition.deck_colors),
                partition.n_decks
            ));
            out.push_str("```\n");
            out.push_str(&partition.final_deck.to_string());
            out.push_str("```\n\n### Types\n\n");
            out.push_str(&type_table(&partition.types).to_markdown());
            if let Some(subtypes) = &partition.subtypes {
                out.push_str("\n### Subtypes\n\n");
                out.push_str(&type_table(subtypes).to_markdown());
            }
            out.push_str("\n### Cards\n\n");
            out.push_str(&card_table(&partition.cards).to_markdown());
            out.push('\n');
        }

        if !self.errors.is_empty() {
            out.push_str("## Errors\n\n");
            for entry in &self.errors {
                out.push_str(&format!(
                    "- {}: {}\n",
                    partition_title(&entry.deck_colors),
                    entry.message
                ));
            }
        }
        out
    }
}

fn partition_title(deck_colors: &str) -> &str {
    if deck_colors.is_empty() { "colorless" } else { deck_colors }
}

/// A rendered table: header plus string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Writes the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.header)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Renders the table as a GitHub-flavored Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("| {} |\n", self.header.join(" | ")));
        out.push_str(&format!("|{}\n", "---|".repeat(self.header.len())));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out
    }
}

fn near_mean_header() -> [&'static str; 5] {
    [
        "% copies = mean-2",
        "% copies = mean-1",
        "% copies = mean",
        "% copies = mean+1",
        "% copies = mean+2",
    ]
}

fn ratio(value: f64) -> String {
    format!("{value:.4}")
}

/// Builds the type or subtype table.
///
/// The `subtype` column is present when the first row carries a subtype.
pub fn type_table(rows: &[TypeAggregate]) -> Table {
    let with_subtype = rows.first().is_some_and(|r| r.subtype.is_some());
    let mut header: Vec<String> = ["deck_colors", "sb", "final_qty", "type"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if with_subtype {
        header.push("subtype".to_string());
    }
    header.extend(
        ["n_dls", "sum", "mean_rnd", "mean", "std", "min", "max"]
            .iter()
            .map(|s| s.to_string()),
    );
    header.extend(near_mean_header().iter().map(|s| s.to_string()));

    let rows = rows
        .iter()
        .map(|r| {
            let mut cells = vec![
                r.deck_colors.clone(),
                r.sideboard.to_string(),
                r.final_qty.to_string(),
                r.card_type.clone(),
            ];
            if with_subtype {
                cells.push(r.subtype.clone().unwrap_or_default());
            }
            cells.extend([
                r.n_decks.to_string(),
                r.sum.to_string(),
                r.mean_rounded.to_string(),
                ratio(r.mean),
                ratio(r.std),
                r.min.to_string(),
                r.max.to_string(),
            ]);
            cells.extend(r.near_mean.iter().map(|&v| ratio(v)));
            cells
        })
        .collect();

    Table { header, rows }
}

/// Builds the card table.
pub fn card_table(rows: &[CardAggregate]) -> Table {
    let mut header: Vec<String> = [
        "deck_colors",
        "sb",
        "final_qty",
        "name",
        "type",
        "subtype",
        "n_dls",
        "sum",
        "mean_rnd",
        "mean",
        "std",
        "%_dls_w_card",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for ordinal in ["1st", "2nd", "3rd", "4th", "5th"].iter().take(MODE_RANKS) {
        header.push(format!("mode_{ordinal}"));
        header.push(format!("%_mode_{ordinal}"));
    }
    header.extend(["min", "max", "diff"].iter().map(|s| s.to_string()));

    let rows = rows
        .iter()
        .map(|r| {
            let mut cells = vec![
                r.deck_colors.clone(),
                r.sideboard.to_string(),
                r.final_qty.to_string(),
                r.name.clone(),
                r.card_type.clone(),
                r.subtype.clone(),
                r.n_decks.to_string(),
                r.sum.to_string(),
                r.mean_rounded.to_string(),
                ratio(r.mean),
                ratio(r.std),
                ratio(r.pct_decks_with_card),
            ];
            for mode in &r.modes {
                match mode {
                    Some(m) => {
                        cells.push(m.value.to_string());
                        cells.push(ratio(m.fraction));
                    }
                    None => {
                        cells.push(String::new());
                        cells.push(String::new());
                    }
                }
            }
            cells.extend([r.min.to_string(), r.max.to_string(), ratio(r.diff)]);
            cells
        })
        .collect();

    Table { header, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analyze;
    use crate::store::MemoryCardStore;

    fn bundle() -> ReportBundle {
        let blobs = ["4 Goblin Lackey\n16 Mountain\n\n2 Pyroblast", "4 Goblin Lackey\n16 Mountain"];
        let config = PipelineConfig::default();
        let run = analyze(&blobs, "premodern", &mut MemoryCardStore::new(), &config).unwrap();
        ReportBundle::new(
            run,
            ReportMeta {
                generated_at: "2024-01-01T00:00:00+00:00".into(),
                archetype: "goblins".into(),
                corpus_fingerprint: "abc".into(),
            },
            config,
        )
    }

    #[test]
    fn test_card_table_columns() {
        let bundle = bundle();
        let table = card_table(&bundle.partitions[0].cards);
        assert_eq!(table.header.len(), 25);
        assert_eq!(&table.header[..4], &["deck_colors", "sb", "final_qty", "name"]);
        assert_eq!(table.header[12], "mode_1st");
        assert_eq!(table.header[13], "%_mode_1st");
        assert_eq!(table.header[24], "diff");
        assert!(table.rows.iter().all(|r| r.len() == table.header.len()));
    }

    #[test]
    fn test_type_table_subtype_column() {
        let bundle = bundle();
        let partition = &bundle.partitions[0];
        let types = type_table(&partition.types);
        assert_eq!(types.header.len(), 16);
        assert_eq!(types.header[8], "std");
        assert_eq!(types.header[11], "% copies = mean-2");

        let subtypes = type_table(partition.subtypes.as_ref().unwrap());
        assert_eq!(subtypes.header.len(), 17);
        assert_eq!(subtypes.header[4], "subtype");
    }

    #[test]
    fn test_csv_output() {
        let bundle = bundle();
        let mut buf = Vec::new();
        type_table(&bundle.partitions[0].types).write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("deck_colors,sb,final_qty,type,n_dls"));
        assert_eq!(lines.count(), bundle.partitions[0].types.len());
    }

    #[test]
    fn test_json_round_trip() {
        let bundle = bundle();
        let mut buf = Vec::new();
        bundle.write_json(&mut buf).unwrap();
        let back: ReportBundle = serde_json::from_slice(&buf).unwrap();
        assert_eq!(back.archetype, "goblins");
        assert_eq!(back.partitions.len(), bundle.partitions.len());
        assert_eq!(back.config, bundle.config);
    }

    #[test]
    fn test_markdown_contains_final_deck() {
        let md = bundle().to_markdown();
        assert!(md.starts_with("# premodern / goblins"));
        assert!(md.contains("## colorless (2 decklists)"));
        assert!(md.contains("```\n16 Mountain\n4 Goblin Lackey\n```"));
        assert!(md.contains("| deck_colors | sb | final_qty | name |"));
    }

    /// Accepts every write and fails on flush.
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_write_json_surfaces_flush_errors() {
        let bundle = bundle();
        let err = bundle.write_json(FailingFlush(Vec::new())).unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));

        let mut buf = Vec::new();
        bundle.write_json(&mut buf).unwrap();
        let back: ReportBundle = serde_json::from_slice(&buf).unwrap();
        assert_eq!(back.partitions[0].types[0].std, bundle.partitions[0].types[0].std);
    }
}
