//! Decklist normalization and statistical-consensus engine.
//!
//! This crate turns a corpus of raw decklists into aggregate statistics and a
//! single recommended build:
//!
//! - [`DecklistParser`]: `<qty> <name>` lines into [`CardObservation`]s, with
//!   the first blank line separating main deck and sideboard.
//! - [`CardStore`]: card metadata keyed by `(format, name)` with
//!   upsert-if-absent merge rules; [`MemoryCardStore`] is the in-memory
//!   backend.
//! - [`partition`]: groups decklists into [`Cohort`]s by color identity.
//! - [`densify`]: zero-fills every cohort to a complete decklist × card
//!   table.
//! - [`type_aggregates`] / [`card_aggregates`]: type, subtype and card level
//!   statistics.
//! - [`reconcile`]: adjusts card quantities until every group sums to its
//!   target.
//! - [`analyze`]: the whole pipeline, cohorts processed in parallel.
//! - [`ReportBundle`]: serializable run output with CSV, JSON and Markdown
//!   renderings.
//!
//! # Example
//!
//! ```
//! use deckstats_core::*;
//!
//! let mut store = MemoryCardStore::new();
//! store
//!     .bulk_import([
//!         CardMetadata::new("Premodern", "Goblin Lackey", CardInfo::new("Creature", "Goblin", "R")),
//!         CardMetadata::new("Premodern", "Mountain", CardInfo::new("Land", "Basic", "C")),
//!     ])
//!     .unwrap();
//!
//! let blobs = [
//!     "4 Goblin Lackey\n16 Mountain",
//!     "3 Goblin Lackey\n17 Mountain",
//!     "4 Goblin Lackey\n16 Mountain",
//! ];
//! let run = analyze(&blobs, "Premodern", &mut store, &PipelineConfig::default()).unwrap();
//!
//! let red = run.partition("R").unwrap();
//! assert_eq!(red.n_decks, 3);
//! assert_eq!(red.final_deck.to_string(), "4 Goblin Lackey\n16 Mountain\n");
//! ```

mod card_stats;
mod color;
mod config;
mod densify;
mod error;
mod final_deck;
mod parser;
mod partition;
mod pipeline;
mod reconcile;
mod report;
mod stats;
mod store;
mod type_stats;
mod types;

pub use card_stats::card_aggregates;
pub use color::{Color, ColorSet};
pub use config::{
    Adjustment, DEFAULT_MAX_ITERATIONS, FixedTargets, MalformedLinePolicy, PipelineConfig,
    TargetMode,
};
pub use densify::{canonical_order, densify};
pub use error::{PipelineError, ReconciliationError, Result};
pub use final_deck::{DeckEntry, FinalDecklist};
pub use parser::{DecklistParser, MalformedLine, ParsedCorpus, parse_card_line};
pub use partition::{ALL_DECKS, Cohort, color_identity, partition};
pub use pipeline::{
    AnalysisRun, CohortFailure, DecklistSource, PartitionReport, analyze, analyze_cohort,
};
pub use reconcile::reconcile;
pub use report::{
    CohortErrorEntry, ReportBundle, ReportError, ReportMeta, Table, card_table, type_table,
};
pub use stats::{
    closest_mode, near_mean_distribution, population_std, ranked_values, round_half_even,
};
pub use store::{
    CardStore, ImportReport, Lookup, MemoryCardStore, MergeOutcome, MetadataIndex,
    UnknownCardWarning,
};
pub use type_stats::type_aggregates;
pub use types::*;
