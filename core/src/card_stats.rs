//! Card level aggregation.

use std::collections::HashMap;

use crate::stats::{mean, near_mean_distribution, population_std, ranked_values, rounded, total};
use crate::types::{CardAggregate, DenseRow, ModeRank, MODE_RANKS};

struct CardGroup<'a> {
    sideboard: bool,
    card_type: &'a str,
    subtype: &'a str,
    name: &'a str,
    /// Quantities in decklist order.
    quantities: Vec<u32>,
}

/// Aggregates dense rows of one cohort per `(sideboard, type, subtype, name)`.
///
/// `rows` must be in canonical order so that quantities are tabulated in
/// decklist order; among equally frequent quantities the one seen first ranks
/// higher. Before reconciliation `final_qty` is the first mode.
pub fn card_aggregates(deck_colors: &str, rows: &[DenseRow]) -> Vec<CardAggregate> {
    let mut groups: Vec<CardGroup<'_>> = Vec::new();
    let mut positions: HashMap<(bool, &str, &str, &str), usize> = HashMap::new();
    for row in rows {
        let key = (
            row.sideboard,
            row.card_type.as_str(),
            row.subtype.as_str(),
            row.name.as_str(),
        );
        let pos = *positions.entry(key).or_insert_with(|| {
            groups.push(CardGroup {
                sideboard: row.sideboard,
                card_type: &row.card_type,
                subtype: &row.subtype,
                name: &row.name,
                quantities: Vec::new(),
            });
            groups.len() - 1
        });
        groups[pos].quantities.push(row.quantity);
    }

    let mut out: Vec<CardAggregate> = groups
        .into_iter()
        .map(|group| aggregate(deck_colors, group))
        .collect();

    out.sort_by(|a, b| {
        a.sideboard
            .cmp(&b.sideboard)
            .then_with(|| a.card_type.cmp(&b.card_type))
            .then_with(|| a.subtype.cmp(&b.subtype))
            .then(b.sum.cmp(&a.sum))
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

fn aggregate(deck_colors: &str, group: CardGroup<'_>) -> CardAggregate {
    let values = &group.quantities;
    let n = values.len();
    let sum = total(values);
    let mean = mean(sum, n);
    let mean_rounded = rounded(mean);

    let mut modes: [Option<ModeRank>; MODE_RANKS] = [None; MODE_RANKS];
    for (slot, (value, count)) in modes.iter_mut().zip(ranked_values(values)) {
        *slot = Some(ModeRank {
            value,
            fraction: count as f64 / n as f64,
        });
    }
    let final_qty = modes[0].map_or(0, |m| m.value);
    let with_card = values.iter().filter(|&&q| q > 0).count();

    CardAggregate {
        deck_colors: deck_colors.to_string(),
        sideboard: group.sideboard,
        card_type: group.card_type.to_string(),
        subtype: group.subtype.to_string(),
        name: group.name.to_string(),
        n_decks: n,
        sum,
        mean,
        mean_rounded,
        std: population_std(values, mean),
        modes,
        min: values.iter().copied().min().unwrap_or(0),
        max: values.iter().copied().max().unwrap_or(0),
        near_mean: near_mean_distribution(values, mean_rounded),
        final_qty,
        pct_decks_with_card: if n == 0 { 0.0 } else { with_card as f64 / n as f64 },
        diff: f64::from(final_qty) - mean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: usize, sideboard: bool, subtype: &str, name: &str, qty: u32) -> DenseRow {
        DenseRow {
            decklist_id: id,
            deck_colors: "R".into(),
            sideboard,
            card_type: "Creature".into(),
            subtype: subtype.into(),
            color: "R".into(),
            quantity: qty,
            name: name.into(),
        }
    }

    #[test]
    fn test_first_seen_mode_wins_ties() {
        let rows = vec![
            row(0, false, "X", "A", 4),
            row(1, false, "X", "A", 2),
            row(2, false, "X", "A", 3),
        ];
        let cards = card_aggregates("R", &rows);
        let a = &cards[0];
        assert_eq!(a.final_qty, 4);
        assert_eq!(a.mode(0).unwrap().value, 4);
        assert_eq!(a.mode(1).unwrap().value, 2);
        assert_eq!(a.mode(2).unwrap().value, 3);
        assert!(a.mode(3).is_none());
        assert!((a.mode(0).unwrap().fraction - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(a.mean, 3.0);
        assert_eq!(a.diff, 1.0);
        assert_eq!(a.min, 2);
        assert_eq!(a.max, 4);
    }

    #[test]
    fn test_zero_fill_counts_as_quantity() {
        let rows = vec![
            row(0, false, "X", "B", 0),
            row(1, false, "X", "B", 2),
            row(2, false, "X", "B", 0),
            row(3, false, "X", "B", 4),
        ];
        let cards = card_aggregates("R", &rows);
        let b = &cards[0];
        assert_eq!(b.final_qty, 0);
        assert_eq!(b.mode(0).unwrap().fraction, 0.5);
        assert_eq!(b.pct_decks_with_card, 0.5);
        assert_eq!(b.n_decks, 4);
        assert!((b.std - 1.6583123951777).abs() < 1e-9);
    }

    #[test]
    fn test_report_order() {
        let rows = vec![
            row(0, true, "X", "S", 1),
            row(0, false, "Y", "C", 1),
            row(0, false, "X", "A", 1),
            row(0, false, "X", "B", 3),
            row(0, false, "X", "D", 1),
        ];
        let cards = card_aggregates("R", &rows);
        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "D", "C", "S"]);
    }

    #[test]
    fn test_sum_beyond_u32_does_not_wrap() {
        let rows = vec![row(0, false, "X", "A", u32::MAX), row(1, false, "X", "A", u32::MAX)];
        let cards = card_aggregates("R", &rows);
        assert_eq!(cards[0].sum, 2 * u64::from(u32::MAX));
        assert_eq!(cards[0].mean, f64::from(u32::MAX));
        assert_eq!(cards[0].final_qty, u32::MAX);
    }
}
