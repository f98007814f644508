//! Zero-filling of cohort observations into a dense decklist × card table.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::{PipelineError, Result};
use crate::partition::Cohort;
use crate::store::MetadataIndex;
use crate::types::{DecklistId, DenseRow};

fn section_name(sideboard: bool) -> &'static str {
    if sideboard { "sideboard" } else { "main" }
}

/// Canonical dense-row ordering: decklist, section, type, subtype, quantity
/// descending, color, name.
pub fn canonical_order(a: &DenseRow, b: &DenseRow) -> Ordering {
    a.decklist_id
        .cmp(&b.decklist_id)
        .then(a.sideboard.cmp(&b.sideboard))
        .then_with(|| a.card_type.cmp(&b.card_type))
        .then_with(|| a.subtype.cmp(&b.subtype))
        .then(b.quantity.cmp(&a.quantity))
        .then_with(|| a.color.cmp(&b.color))
        .then_with(|| a.name.cmp(&b.name))
}

/// Expands a cohort to every (decklist, card) pair of each section.
///
/// Main deck and sideboard are independent namespaces: a card seen only in
/// sideboards yields only sideboard rows. Every decklist of the cohort gets a
/// row for every card, with quantity 0 where it played none. Metadata and the
/// cohort label are attached to every row.
///
/// # Errors
///
/// Returns [`PipelineError::DensificationInvariant`] if a section does not
/// end up with exactly `decklists × cards` unique rows covering every
/// observation.
///
/// # Examples
///
/// ```
/// use deckstats_core::{CardObservation, Cohort, MetadataIndex, densify};
///
/// let cohort = Cohort {
///     deck_colors: "R".into(),
///     decklists: vec![0, 1],
///     observations: vec![
///         CardObservation::new(0, false, "A", 4),
///         CardObservation::new(1, false, "B", 2),
///     ],
/// };
/// let rows = densify(&cohort, &MetadataIndex::new("premodern")).unwrap();
/// assert_eq!(rows.len(), 4);
/// assert_eq!(rows.iter().filter(|r| r.quantity == 0).count(), 2);
/// ```
pub fn densify(cohort: &Cohort, index: &MetadataIndex) -> Result<Vec<DenseRow>> {
    let mut rows = Vec::new();
    for sideboard in [false, true] {
        let section = densify_section(cohort, index, sideboard)?;
        rows.extend(section);
    }
    rows.sort_by(canonical_order);
    Ok(rows)
}

fn densify_section(cohort: &Cohort, index: &MetadataIndex, sideboard: bool) -> Result<Vec<DenseRow>> {
    let mut names: Vec<&str> = Vec::new();
    let mut seen_names: HashSet<&str> = HashSet::new();
    let mut quantities: HashMap<(DecklistId, &str), u32> = HashMap::new();
    for obs in cohort.observations.iter().filter(|o| o.sideboard == sideboard) {
        if seen_names.insert(obs.name.as_str()) {
            names.push(obs.name.as_str());
        }
        let quantity = quantities.entry((obs.decklist_id, obs.name.as_str())).or_insert(0);
        *quantity = quantity
            .checked_add(obs.quantity)
            .ok_or_else(|| PipelineError::QuantityOverflow {
                deck_colors: cohort.deck_colors.clone(),
                decklist_id: obs.decklist_id,
                name: obs.name.clone(),
            })?;
    }

    let mut rows = Vec::with_capacity(cohort.decklists.len() * names.len());
    let mut pairs: HashSet<(DecklistId, &str)> = HashSet::new();
    let mut matched = 0;
    for &decklist_id in &cohort.decklists {
        for &name in &names {
            if !pairs.insert((decklist_id, name)) {
                continue;
            }
            let quantity = match quantities.get(&(decklist_id, name)) {
                Some(&qty) => {
                    matched += 1;
                    qty
                }
                None => 0,
            };
            let info = index.get(name);
            rows.push(DenseRow {
                decklist_id,
                deck_colors: cohort.deck_colors.clone(),
                sideboard,
                card_type: info.card_type.clone(),
                subtype: info.subtype.clone(),
                color: info.color.clone(),
                quantity,
                name: name.to_string(),
            });
        }
    }

    let expected = cohort.decklists.len() * names.len();
    if rows.len() != expected || matched != quantities.len() {
        return Err(PipelineError::DensificationInvariant {
            deck_colors: cohort.deck_colors.clone(),
            section: section_name(sideboard),
            expected,
            actual: rows.len(),
        });
    }
    Ok(rows)
}
