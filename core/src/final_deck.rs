//! The recommended build of a cohort, rendered back as a decklist.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::CardAggregate;

/// One `<qty> <name>` line of a final decklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub quantity: u32,
    pub name: String,
}

/// Main deck and sideboard assembled from reconciled card rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalDecklist {
    pub deck_colors: String,
    pub main: Vec<DeckEntry>,
    pub sideboard: Vec<DeckEntry>,
}

impl FinalDecklist {
    /// Collects every card with a positive `final_qty`, in report order.
    ///
    /// # Examples
    ///
    /// ```
    /// use deckstats_core::FinalDecklist;
    ///
    /// let deck = FinalDecklist::from_cards("R", &[]);
    /// assert_eq!(deck.main_total(), 0);
    /// assert_eq!(deck.to_string(), "");
    /// ```
    pub fn from_cards(deck_colors: &str, cards: &[CardAggregate]) -> Self {
        let mut deck = Self {
            deck_colors: deck_colors.to_string(),
            ..Self::default()
        };
        for card in cards.iter().filter(|c| c.final_qty > 0) {
            let entry = DeckEntry {
                quantity: card.final_qty,
                name: card.name.clone(),
            };
            if card.sideboard {
                deck.sideboard.push(entry);
            } else {
                deck.main.push(entry);
            }
        }
        deck
    }

    pub fn main_total(&self) -> u64 {
        self.main.iter().map(|e| u64::from(e.quantity)).sum()
    }

    pub fn sideboard_total(&self) -> u64 {
        self.sideboard.iter().map(|e| u64::from(e.quantity)).sum()
    }
}

/// Renders the decklist in the parser's input format: main deck lines, a
/// blank line, then sideboard lines.
impl fmt::Display for FinalDecklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.main {
            writeln!(f, "{} {}", entry.quantity, entry.name)?;
        }
        if !self.sideboard.is_empty() {
            writeln!(f)?;
            for entry in &self.sideboard {
                writeln!(f, "{} {}", entry.quantity, entry.name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MalformedLinePolicy;
    use crate::parser::DecklistParser;
    use crate::types::MODE_RANKS;

    fn card(name: &str, sideboard: bool, final_qty: u32) -> CardAggregate {
        CardAggregate {
            deck_colors: "R".into(),
            sideboard,
            card_type: "Instant".into(),
            subtype: "Burn".into(),
            name: name.into(),
            n_decks: 1,
            sum: u64::from(final_qty),
            mean: f64::from(final_qty),
            mean_rounded: final_qty,
            std: 0.0,
            modes: [None; MODE_RANKS],
            min: final_qty,
            max: final_qty,
            near_mean: [0.0; 5],
            final_qty,
            pct_decks_with_card: 1.0,
            diff: 0.0,
        }
    }

    #[test]
    fn test_zero_quantity_cards_are_dropped() {
        let deck = FinalDecklist::from_cards(
            "R",
            &[
                card("Lightning Bolt", false, 4),
                card("Fireblast", false, 0),
                card("Pyroblast", true, 3),
            ],
        );
        assert_eq!(deck.main.len(), 1);
        assert_eq!(deck.main_total(), 4);
        assert_eq!(deck.sideboard_total(), 3);
        assert_eq!(deck.to_string(), "4 Lightning Bolt\n\n3 Pyroblast\n");
    }

    #[test]
    fn test_rendered_deck_parses_back() {
        let deck = FinalDecklist::from_cards(
            "R",
            &[card("Mountain", false, 20), card("Red Elemental Blast", true, 2)],
        );
        let parsed = DecklistParser::new(MalformedLinePolicy::Reject)
            .parse_corpus(&[deck.to_string()])
            .unwrap();
        assert_eq!(parsed.observations.len(), 2);
        assert!(parsed.observations[1].sideboard);
        assert_eq!(parsed.observations[1].quantity, 2);
    }
}
