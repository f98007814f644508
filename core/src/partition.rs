//! Color-class partitioning of a decklist corpus.
//!
//! Densification assumes every decklist of a cohort could have played every
//! card seen in it. Decklists are therefore grouped by color identity first,
//! computed from the un-densified main deck.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::color::ColorSet;
use crate::parser::ParsedCorpus;
use crate::store::MetadataIndex;
use crate::types::{CardObservation, DecklistId};

/// Label of the single cohort used when partitioning is disabled.
pub const ALL_DECKS: &str = "all";

/// Decklists sharing one color identity, with their observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    /// Identity key (`"UB"`, `""` for colorless) or [`ALL_DECKS`].
    pub deck_colors: String,
    /// Decklist ids in corpus order.
    pub decklists: Vec<DecklistId>,
    pub observations: Vec<CardObservation>,
}

/// Color identity of one decklist.
///
/// Unions the colors of main-deck, non-land cards with a positive quantity.
///
/// # Examples
///
/// ```
/// use deckstats_core::{CardInfo, CardObservation, MetadataIndex, color_identity};
///
/// let index = MetadataIndex::from_entries("premodern", [
///     ("Counterspell".to_string(), CardInfo::new("Instant", "Counter", "U")),
///     ("Duress".to_string(), CardInfo::new("Sorcery", "Discard", "B")),
///     ("Underground Sea".to_string(), CardInfo::new("Land", "Dual", "UB")),
/// ]);
/// let deck = vec![
///     CardObservation::new(0, false, "Counterspell", 4),
///     CardObservation::new(0, false, "Duress", 4),
///     CardObservation::new(0, false, "Underground Sea", 4),
/// ];
/// assert_eq!(color_identity(&deck, &index).to_string(), "UB");
/// ```
pub fn color_identity<'a, I>(observations: I, index: &MetadataIndex) -> ColorSet
where
    I: IntoIterator<Item = &'a CardObservation>,
{
    observations
        .into_iter()
        .filter(|obs| !obs.sideboard && obs.quantity > 0)
        .map(|obs| index.get(&obs.name))
        .filter(|info| !info.is_land())
        .fold(ColorSet::COLORLESS, |set, info| {
            set.union(ColorSet::from_codes(&info.color))
        })
}

/// Splits the corpus into cohorts.
///
/// With `by_color` the cohorts follow color identity and appear in order of
/// the first decklist of each identity; otherwise one [`ALL_DECKS`] cohort
/// holds everything. Decklists without a single parsed card line (an empty
/// blob, or one whose every line was malformed) join no cohort.
pub fn partition(corpus: &ParsedCorpus, index: &MetadataIndex, by_color: bool) -> Vec<Cohort> {
    let mut by_deck: Vec<Vec<&CardObservation>> = vec![Vec::new(); corpus.decklists];
    for obs in &corpus.observations {
        if let Some(deck) = by_deck.get_mut(obs.decklist_id) {
            deck.push(obs);
        }
    }

    let empty: Vec<DecklistId> = by_deck
        .iter()
        .enumerate()
        .filter(|(_, deck)| deck.is_empty())
        .map(|(decklist_id, _)| decklist_id)
        .collect();
    if !empty.is_empty() {
        warn!(count = empty.len(), ids = ?empty, "excluding decklists without card lines");
    }

    if !by_color {
        let decklists = present_decklists(&by_deck);
        if decklists.is_empty() {
            return Vec::new();
        }
        return vec![Cohort {
            deck_colors: ALL_DECKS.to_string(),
            decklists,
            observations: corpus.observations.clone(),
        }];
    }

    let mut cohorts: Vec<Cohort> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (decklist_id, deck) in by_deck.into_iter().enumerate() {
        if deck.is_empty() {
            continue;
        }
        let identity = color_identity(deck.iter().copied(), index).to_string();
        let pos = *positions.entry(identity.clone()).or_insert_with(|| {
            cohorts.push(Cohort {
                deck_colors: identity,
                decklists: Vec::new(),
                observations: Vec::new(),
            });
            cohorts.len() - 1
        });
        let cohort = &mut cohorts[pos];
        cohort.decklists.push(decklist_id);
        cohort.observations.extend(deck.into_iter().cloned());
    }

    debug!(cohorts = cohorts.len(), "partitioned corpus by color identity");
    cohorts
}

fn present_decklists(by_deck: &[Vec<&CardObservation>]) -> Vec<DecklistId> {
    by_deck
        .iter()
        .enumerate()
        .filter(|(_, deck)| !deck.is_empty())
        .map(|(decklist_id, _)| decklist_id)
        .collect()
}
