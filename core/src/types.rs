//! Data model for decklist observations, card metadata, and report rows.
//!
//! Every type here derives [`serde`] traits so that the card database, the
//! report bundle and the intermediate tables can round-trip through JSON and
//! YAML without bespoke conversion code.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder used for the type, subtype and color of cards that are not in
/// the authoritative card database.
pub const UNKNOWN: &str = "unknown";

/// Card type excluded from color identity computation.
pub const LAND_TYPE: &str = "Land";

/// Position of a decklist in the supplied corpus (0-based).
pub type DecklistId = usize;

/// Normalizes a format name into the key used by the card database.
///
/// # Examples
///
/// ```
/// use deckstats_core::normalize_format;
///
/// assert_eq!(normalize_format("Premodern"), "premodern");
/// assert_eq!(normalize_format("Old School"), "old_school");
/// ```
pub fn normalize_format(format: &str) -> String {
    format.trim().to_lowercase().replace(' ', "_")
}

/// One parsed `<qty> <name>` line of a decklist.
///
/// # Examples
///
/// ```
/// use deckstats_core::CardObservation;
///
/// let obs = CardObservation::new(0, false, "Lightning Bolt", 4);
/// assert_eq!(obs.quantity, 4);
/// assert!(!obs.sideboard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardObservation {
    /// Decklist the line belongs to.
    pub decklist_id: DecklistId,
    /// `true` for sideboard cards.
    pub sideboard: bool,
    /// Card name as written in the decklist.
    pub name: String,
    /// Number of copies.
    pub quantity: u32,
}

impl CardObservation {
    /// Creates an observation.
    pub fn new(decklist_id: DecklistId, sideboard: bool, name: &str, quantity: u32) -> Self {
        Self {
            decklist_id,
            sideboard,
            name: name.to_string(),
            quantity,
        }
    }
}

/// Type, subtype and color of a card within one format.
///
/// The serialized field name of [`card_type`](Self::card_type) is `type`,
/// matching the persisted card database layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardInfo {
    /// Card type (e.g. `"Creature"`, `"Land"`).
    #[serde(rename = "type")]
    pub card_type: String,
    /// Finer grouping inside the type (e.g. `"Goblin"`, `"Removal"`).
    pub subtype: String,
    /// Color codes drawn from `WUBRG`, `C` for colorless.
    pub color: String,
}

impl CardInfo {
    /// Creates card info from its three components.
    pub fn new(card_type: &str, subtype: &str, color: &str) -> Self {
        Self {
            card_type: card_type.to_string(),
            subtype: subtype.to_string(),
            color: color.to_string(),
        }
    }

    /// Returns the `unknown` triple registered for unrecognized cards.
    ///
    /// # Examples
    ///
    /// ```
    /// use deckstats_core::CardInfo;
    ///
    /// assert!(CardInfo::unknown().is_unknown());
    /// assert!(!CardInfo::new("Land", "Basic", "C").is_unknown());
    /// ```
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, UNKNOWN)
    }

    /// Returns `true` if no field carries real metadata.
    pub fn is_unknown(&self) -> bool {
        self.card_type == UNKNOWN && self.subtype == UNKNOWN && self.color == UNKNOWN
    }

    /// Returns `true` for lands.
    pub fn is_land(&self) -> bool {
        self.card_type == LAND_TYPE
    }
}

/// One authoritative card database row: `format,name,type,subtype,color`.
///
/// This is the column layout of the curated spreadsheet that seeds the card
/// database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    pub format: String,
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub subtype: String,
    pub color: String,
}

impl CardMetadata {
    /// Creates a row; the format is normalized.
    pub fn new(format: &str, name: &str, info: CardInfo) -> Self {
        Self {
            format: normalize_format(format),
            name: name.to_string(),
            card_type: info.card_type,
            subtype: info.subtype,
            color: info.color,
        }
    }

    /// Returns the metadata triple of this row.
    pub fn info(&self) -> CardInfo {
        CardInfo::new(&self.card_type, &self.subtype, &self.color)
    }
}

/// A densified decklist row: one card of one decklist, possibly zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseRow {
    pub decklist_id: DecklistId,
    /// Color identity label of the cohort the decklist belongs to.
    pub deck_colors: String,
    pub sideboard: bool,
    #[serde(rename = "type")]
    pub card_type: String,
    pub subtype: String,
    pub color: String,
    pub quantity: u32,
    pub name: String,
}

/// Type or subtype level statistics for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAggregate {
    pub deck_colors: String,
    pub sideboard: bool,
    #[serde(rename = "type")]
    pub card_type: String,
    /// Present only in the subtype-level table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub n_decks: usize,
    pub sum: u64,
    pub mean: f64,
    pub mean_rounded: u32,
    /// Population standard deviation of the per-decklist totals.
    pub std: f64,
    /// Smallest per-decklist total of the group.
    pub min: u64,
    /// Largest per-decklist total of the group.
    pub max: u64,
    /// Share of decklists whose group total equals `mean_rounded + k`, for
    /// `k` in `-2..=2`.
    pub near_mean: [f64; 5],
    pub final_qty: u32,
}

/// A distinct quantity value and the share of decklists that played it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeRank {
    pub value: u32,
    pub fraction: f64,
}

/// Number of modal values reported per card.
pub const MODE_RANKS: usize = 5;

/// Card level statistics for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAggregate {
    pub deck_colors: String,
    pub sideboard: bool,
    #[serde(rename = "type")]
    pub card_type: String,
    pub subtype: String,
    pub name: String,
    pub n_decks: usize,
    pub sum: u64,
    pub mean: f64,
    pub mean_rounded: u32,
    /// Population standard deviation of the quantities.
    pub std: f64,
    /// Most frequent quantities, most frequent first; `None` past the number
    /// of distinct values.
    pub modes: [Option<ModeRank>; MODE_RANKS],
    pub min: u32,
    pub max: u32,
    pub near_mean: [f64; 5],
    pub final_qty: u32,
    pub pct_decks_with_card: f64,
    /// `final_qty - mean`, kept in sync by the reconciler.
    pub diff: f64,
}

impl CardAggregate {
    /// Returns the mode at `rank` (0-based).
    pub fn mode(&self, rank: usize) -> Option<ModeRank> {
        self.modes.get(rank).copied().flatten()
    }

    /// Returns the second most frequent quantity, if any.
    pub fn mode_2nd(&self) -> Option<ModeRank> {
        self.mode(1)
    }

    /// Sets the final quantity and refreshes [`diff`](Self::diff).
    pub fn set_final_qty(&mut self, qty: u32) {
        self.final_qty = qty;
        self.diff = f64::from(qty) - self.mean;
    }
}

/// A set of card rows whose final quantities must add up to one target.
///
/// `card_type` is `None` when the reconciler groups by sideboard flag only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub deck_colors: String,
    pub sideboard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = if self.sideboard { "sideboard" } else { "main" };
        let colors = if self.deck_colors.is_empty() {
            "colorless"
        } else {
            &self.deck_colors
        };
        match &self.card_type {
            Some(card_type) => write!(f, "{colors}/{section}/{card_type}"),
            None => write!(f, "{colors}/{section}"),
        }
    }
}

/// Target sum of one reconciliation group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTarget {
    pub group: GroupKey,
    pub target: u32,
    /// Number of substitution or unit steps applied.
    pub steps: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_info_serializes_type_field() {
        let info = CardInfo::new("Creature", "Goblin", "R");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "Creature");
        assert_eq!(json["subtype"], "Goblin");
        let back: CardInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_partially_known_info_is_not_unknown() {
        let info = CardInfo::new("Creature", UNKNOWN, UNKNOWN);
        assert!(!info.is_unknown());
    }

    #[test]
    fn test_set_final_qty_refreshes_diff() {
        let mut card = CardAggregate {
            deck_colors: "R".into(),
            sideboard: false,
            card_type: "Creature".into(),
            subtype: "Goblin".into(),
            name: "Goblin Lackey".into(),
            n_decks: 4,
            sum: 10,
            mean: 2.5,
            mean_rounded: 2,
            std: 1.0,
            modes: [None; MODE_RANKS],
            min: 1,
            max: 4,
            near_mean: [0.0; 5],
            final_qty: 4,
            pct_decks_with_card: 1.0,
            diff: 1.5,
        };
        card.set_final_qty(2);
        assert_eq!(card.final_qty, 2);
        assert_eq!(card.diff, -0.5);
    }

    #[test]
    fn test_group_key_display() {
        let key = GroupKey {
            deck_colors: String::new(),
            sideboard: true,
            card_type: Some("Artifact".into()),
        };
        assert_eq!(key.to_string(), "colorless/sideboard/Artifact");

        let key = GroupKey {
            deck_colors: "UB".into(),
            sideboard: false,
            card_type: None,
        };
        assert_eq!(key.to_string(), "UB/main");
    }
}
