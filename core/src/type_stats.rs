//! Type and subtype level aggregation.

use std::collections::BTreeMap;

use crate::stats::{closest_mode, mean, near_mean_distribution, population_std, rounded, total};
use crate::types::{DecklistId, DenseRow, TypeAggregate};

type GroupRows = BTreeMap<DecklistId, u64>;

/// Aggregates dense rows of one cohort per `(sideboard, type)`, or per
/// `(sideboard, type, subtype)` when `by_subtype` is set.
///
/// Per-decklist totals of each group drive `std`, `min`, `max` and the
/// near-mean distribution; `final_qty` is the closest mode of that distribution.
/// Rows are sorted by section, type, subtype and then sum descending.
///
/// # Examples
///
/// ```
/// use deckstats_core::{DenseRow, type_aggregates};
///
/// let row = |id, qty| DenseRow {
///     decklist_id: id,
///     deck_colors: "G".into(),
///     sideboard: false,
///     card_type: "Creature".into(),
///     subtype: "Elf".into(),
///     color: "G".into(),
///     quantity: qty,
///     name: "Llanowar Elves".into(),
/// };
/// let types = type_aggregates("G", &[row(0, 4), row(1, 4), row(2, 3)], false);
/// assert_eq!(types[0].sum, 11);
/// assert_eq!(types[0].final_qty, 4);
/// ```
pub fn type_aggregates(deck_colors: &str, rows: &[DenseRow], by_subtype: bool) -> Vec<TypeAggregate> {
    let mut groups: BTreeMap<(bool, &str, Option<&str>), GroupRows> = BTreeMap::new();
    for row in rows {
        let subtype = by_subtype.then_some(row.subtype.as_str());
        let totals = groups
            .entry((row.sideboard, row.card_type.as_str(), subtype))
            .or_default();
        *totals.entry(row.decklist_id).or_insert(0) += u64::from(row.quantity);
    }

    let mut out: Vec<TypeAggregate> = groups
        .into_iter()
        .map(|((sideboard, card_type, subtype), totals)| {
            let totals: Vec<u64> = totals.into_values().collect();
            let sum = total(&totals);
            let mean = mean(sum, totals.len());
            let mean_rounded = rounded(mean);
            let near_mean = near_mean_distribution(&totals, mean_rounded);
            TypeAggregate {
                deck_colors: deck_colors.to_string(),
                sideboard,
                card_type: card_type.to_string(),
                subtype: subtype.map(str::to_string),
                n_decks: totals.len(),
                sum,
                mean,
                mean_rounded,
                std: population_std(&totals, mean),
                min: totals.iter().copied().min().unwrap_or(0),
                max: totals.iter().copied().max().unwrap_or(0),
                near_mean,
                final_qty: closest_mode(mean_rounded, &near_mean),
            }
        })
        .collect();

    out.sort_by(|a, b| {
        a.sideboard
            .cmp(&b.sideboard)
            .then_with(|| a.card_type.cmp(&b.card_type))
            .then_with(|| a.subtype.cmp(&b.subtype))
            .then(b.sum.cmp(&a.sum))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: DecklistId, sideboard: bool, card_type: &str, subtype: &str, name: &str, qty: u32) -> DenseRow {
        DenseRow {
            decklist_id: id,
            deck_colors: "R".into(),
            sideboard,
            card_type: card_type.into(),
            subtype: subtype.into(),
            color: "R".into(),
            quantity: qty,
            name: name.into(),
        }
    }

    fn creature_scenario() -> Vec<DenseRow> {
        vec![
            row(0, false, "Creature", "X", "A", 4),
            row(0, false, "Creature", "X", "B", 0),
            row(1, false, "Creature", "X", "A", 2),
            row(1, false, "Creature", "X", "B", 2),
            row(2, false, "Creature", "X", "A", 3),
            row(2, false, "Creature", "X", "B", 0),
        ]
    }

    #[test]
    fn test_three_deck_creature_scenario() {
        let types = type_aggregates("R", &creature_scenario(), false);
        assert_eq!(types.len(), 1);
        let creature = &types[0];
        assert_eq!(creature.n_decks, 3);
        assert_eq!(creature.sum, 11);
        assert!((creature.mean - 11.0 / 3.0).abs() < 1e-12);
        assert_eq!(creature.mean_rounded, 4);
        assert_eq!(creature.min, 3);
        assert_eq!(creature.max, 4);
        assert!((creature.std - (2.0f64 / 9.0).sqrt()).abs() < 1e-12);
        assert_eq!(creature.final_qty, 4);
        assert!(creature.subtype.is_none());
    }

    #[test]
    fn test_final_qty_within_two_of_rounded_mean() {
        let rows = vec![
            row(0, false, "Instant", "Burn", "Bolt", 0),
            row(1, false, "Instant", "Burn", "Bolt", 8),
            row(2, false, "Instant", "Burn", "Bolt", 8),
            row(3, false, "Instant", "Burn", "Bolt", 0),
        ];
        let types = type_aggregates("R", &rows, false);
        let t = &types[0];
        assert_eq!(t.mean_rounded, 4);
        assert!(t.final_qty >= t.mean_rounded - 2 && t.final_qty <= t.mean_rounded + 2);
        assert_eq!(t.near_mean, [0.0; 5]);
        assert_eq!(t.final_qty, 2);
    }

    #[test]
    fn test_subtype_grouping_and_order() {
        let mut rows = creature_scenario();
        rows.push(row(0, false, "Creature", "Goblin", "G", 1));
        rows.push(row(1, false, "Creature", "Goblin", "G", 1));
        rows.push(row(2, false, "Creature", "Goblin", "G", 1));
        rows.push(row(0, true, "Artifact", "-", "Z", 2));
        rows.push(row(1, true, "Artifact", "-", "Z", 0));
        rows.push(row(2, true, "Artifact", "-", "Z", 0));

        let subtypes = type_aggregates("R", &rows, true);
        let keys: Vec<(bool, &str, Option<&str>)> = subtypes
            .iter()
            .map(|t| (t.sideboard, t.card_type.as_str(), t.subtype.as_deref()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (false, "Creature", Some("Goblin")),
                (false, "Creature", Some("X")),
                (true, "Artifact", Some("-")),
            ]
        );
        assert_eq!(subtypes[0].final_qty, 1);
        assert_eq!(subtypes[2].final_qty, 0);
    }

    #[test]
    fn test_totals_beyond_u32_do_not_wrap() {
        let rows = vec![
            row(0, false, "Land", "Basic", "Mountain", u32::MAX),
            row(0, false, "Land", "Basic", "Island", u32::MAX),
            row(1, false, "Land", "Basic", "Mountain", u32::MAX),
            row(1, false, "Land", "Basic", "Island", u32::MAX),
        ];
        let types = type_aggregates("R", &rows, false);
        let land = &types[0];
        assert_eq!(land.min, 2 * u64::from(u32::MAX));
        assert_eq!(land.sum, 4 * u64::from(u32::MAX));
        assert_eq!(land.std, 0.0);
    }

    #[test]
    fn test_empty_rows() {
        assert!(type_aggregates("", &[], true).is_empty());
    }
}
