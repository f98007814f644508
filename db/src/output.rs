//! Writing report bundles to an output directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use deckstats_core::{ReportBundle, card_table, normalize_format, type_table};
use tracing::info;

use crate::config::ReportFormat;
use crate::error::Result;

fn partition_slug(deck_colors: &str) -> &str {
    if deck_colors.is_empty() { "colorless" } else { deck_colors }
}

/// Writes `bundle` in every requested format and returns the created files.
///
/// File names start with the normalized archetype:
///
/// - CSV: `<archetype>_<colors>_types.csv`, `_subtypes.csv`, `_cards.csv` and
///   the final decklist `_final.txt` per partition;
/// - JSON: `<archetype>.json`;
/// - Markdown: `<archetype>.md`.
///
/// # Errors
///
/// Returns [`StoreError::IoError`](crate::StoreError::IoError) if a file
/// cannot be written, or
/// [`StoreError::ReportError`](crate::StoreError::ReportError) if rendering
/// fails.
pub fn write_report(bundle: &ReportBundle, dir: impl AsRef<Path>, formats: &[ReportFormat]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let stem = match normalize_format(&bundle.archetype) {
        s if s.is_empty() => "report".to_string(),
        s => s,
    };

    let mut written = Vec::new();
    for format in formats {
        match format {
            ReportFormat::Csv => {
                for partition in &bundle.partitions {
                    let prefix = format!("{stem}_{}", partition_slug(&partition.deck_colors));

                    let path = dir.join(format!("{prefix}_types.csv"));
                    type_table(&partition.types).write_csv(BufWriter::new(File::create(&path)?))?;
                    written.push(path);

                    if let Some(subtypes) = &partition.subtypes {
                        let path = dir.join(format!("{prefix}_subtypes.csv"));
                        type_table(subtypes).write_csv(BufWriter::new(File::create(&path)?))?;
                        written.push(path);
                    }

                    let path = dir.join(format!("{prefix}_cards.csv"));
                    card_table(&partition.cards).write_csv(BufWriter::new(File::create(&path)?))?;
                    written.push(path);

                    let path = dir.join(format!("{prefix}_final.txt"));
                    std::fs::write(&path, partition.final_deck.to_string())?;
                    written.push(path);
                }
            }
            ReportFormat::Json => {
                let path = dir.join(format!("{stem}.json"));
                let mut writer = BufWriter::new(File::create(&path)?);
                bundle.write_json(&mut writer)?;
                writer.flush()?;
                written.push(path);
            }
            ReportFormat::Markdown => {
                let path = dir.join(format!("{stem}.md"));
                std::fs::write(&path, bundle.to_markdown())?;
                written.push(path);
            }
        }
    }

    info!(dir = %dir.display(), files = written.len(), "wrote report");
    Ok(written)
}
