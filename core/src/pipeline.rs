//! End-to-end analysis of a decklist corpus.
//!
//! Parsing, metadata resolution and partitioning run on the calling thread;
//! every cohort is then densified, aggregated and reconciled independently on
//! a rayon pool. A failing cohort is reported in [`AnalysisRun::errors`] and
//! does not affect the others.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::card_stats::card_aggregates;
use crate::config::PipelineConfig;
use crate::densify::densify;
use crate::error::{PipelineError, Result};
use crate::final_deck::FinalDecklist;
use crate::parser::{DecklistParser, MalformedLine};
use crate::partition::{Cohort, partition};
use crate::reconcile::reconcile;
use crate::store::{CardStore, MetadataIndex, UnknownCardWarning};
use crate::type_stats::type_aggregates;
use crate::types::{CardAggregate, GroupTarget, TypeAggregate, normalize_format};

/// Supplier of raw decklist blobs for one format and archetype.
pub trait DecklistSource {
    type Error: std::error::Error;

    /// Returns the blobs in a stable order; position `i` becomes decklist `i`.
    fn list_decklist_blobs(&self, format: &str, archetype: &str) -> std::result::Result<Vec<String>, Self::Error>;
}

/// Statistics and recommended build of one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub deck_colors: String,
    pub n_decks: usize,
    /// Type-level table.
    pub types: Vec<TypeAggregate>,
    /// Subtype-level table, when subtype grouping is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtypes: Option<Vec<TypeAggregate>>,
    /// Card-level table after reconciliation.
    pub cards: Vec<CardAggregate>,
    pub targets: Vec<GroupTarget>,
    pub final_deck: FinalDecklist,
}

/// A cohort that could not be analyzed.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortFailure {
    pub deck_colors: String,
    pub error: PipelineError,
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRun {
    /// Normalized format key.
    pub format: String,
    pub decklists: usize,
    /// Successful cohorts in partition order.
    pub partitions: Vec<PartitionReport>,
    pub errors: Vec<CohortFailure>,
    pub malformed: Vec<MalformedLine>,
    pub unknown_cards: Vec<UnknownCardWarning>,
}

impl AnalysisRun {
    /// Returns `true` if every cohort was analyzed.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn partition(&self, deck_colors: &str) -> Option<&PartitionReport> {
        self.partitions.iter().find(|p| p.deck_colors == deck_colors)
    }
}

/// Analyzes a corpus of raw decklists.
///
/// Unknown cards are registered in `store`, which is persisted when the
/// lookup added entries.
///
/// # Errors
///
/// Fails for an invalid configuration, a malformed line under
/// [`MalformedLinePolicy::Reject`](crate::MalformedLinePolicy::Reject), a
/// store failure, or if the worker pool cannot be built. Cohort-level
/// failures are collected in [`AnalysisRun::errors`] instead.
///
/// # Examples
///
/// ```
/// use deckstats_core::{MemoryCardStore, PipelineConfig, analyze};
///
/// let blobs = ["4 Goblin Lackey\n16 Mountain", "4 Goblin Lackey\n16 Mountain"];
/// let mut store = MemoryCardStore::new();
/// let run = analyze(&blobs, "Premodern", &mut store, &PipelineConfig::default()).unwrap();
///
/// assert_eq!(run.decklists, 2);
/// assert!(run.is_complete());
/// assert_eq!(run.partitions[0].final_deck.main_total(), 20);
/// assert_eq!(run.unknown_cards.len(), 2);
/// ```
pub fn analyze<S, B>(blobs: &[B], format: &str, store: &mut S, config: &PipelineConfig) -> Result<AnalysisRun>
where
    S: CardStore,
    B: AsRef<str>,
{
    config.validate()?;
    let format = normalize_format(format);

    let corpus = DecklistParser::new(config.malformed_lines).parse_corpus(blobs)?;

    let index = store
        .resolve(&format, corpus.card_names())
        .map_err(|e| PipelineError::Store(e.to_string()))?;
    if index.unknown.iter().any(|w| w.newly_registered) {
        store
            .persist()
            .map_err(|e| PipelineError::Store(e.to_string()))?;
    }

    let cohorts = partition(&corpus, &index, config.uses_color_partitioning);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.unwrap_or(0))
        .build()
        .map_err(|e| PipelineError::Config(format!("failed to create thread pool: {e}")))?;
    let outcomes: Vec<Result<PartitionReport>> = pool.install(|| {
        cohorts
            .par_iter()
            .map(|cohort| analyze_cohort(cohort, &index, config))
            .collect()
    });

    let mut partitions = Vec::new();
    let mut errors = Vec::new();
    for (cohort, outcome) in cohorts.iter().zip(outcomes) {
        match outcome {
            Ok(report) => partitions.push(report),
            Err(error) => {
                warn!(deck_colors = %cohort.deck_colors, %error, "cohort analysis failed");
                errors.push(CohortFailure {
                    deck_colors: cohort.deck_colors.clone(),
                    error,
                });
            }
        }
    }

    info!(
        format = %format,
        decklists = corpus.decklists,
        cohorts = cohorts.len(),
        failed = errors.len(),
        "analysis finished"
    );

    Ok(AnalysisRun {
        format,
        decklists: corpus.decklists,
        partitions,
        errors,
        malformed: corpus.malformed,
        unknown_cards: index.unknown,
    })
}

/// Runs densification, aggregation and reconciliation for one cohort.
pub fn analyze_cohort(cohort: &Cohort, index: &MetadataIndex, config: &PipelineConfig) -> Result<PartitionReport> {
    let rows = densify(cohort, index)?;
    let types = type_aggregates(&cohort.deck_colors, &rows, false);
    let subtypes = config
        .uses_subtype_grouping
        .then(|| type_aggregates(&cohort.deck_colors, &rows, true));
    let mut cards = card_aggregates(&cohort.deck_colors, &rows);
    let targets = reconcile(&mut cards, &types, config)?;
    let final_deck = FinalDecklist::from_cards(&cohort.deck_colors, &cards);

    Ok(PartitionReport {
        deck_colors: cohort.deck_colors.clone(),
        n_decks: cohort.decklists.len(),
        types,
        subtypes,
        cards,
        targets,
        final_deck,
    })
}
