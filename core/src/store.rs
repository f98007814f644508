//! Card metadata store abstraction.
//!
//! [`CardStore`] is the key-value seam between the pipeline and wherever card
//! metadata lives (in memory, a JSON file, SQLite). Implementors supply raw
//! `get`/`put`/`persist`; the merge rules are provided methods so every
//! backend shares them:
//!
//! - a missing card is inserted;
//! - an `unknown` entry is upgraded when known metadata arrives;
//! - a known entry is never overwritten.
//!
//! # Example
//!
//! ```
//! use deckstats_core::{CardInfo, CardMetadata, CardStore, MemoryCardStore};
//!
//! let mut store = MemoryCardStore::default();
//! let rows = vec![CardMetadata::new("Premodern", "Mountain", CardInfo::new("Land", "Basic", "C"))];
//! store.bulk_import(rows.clone()).unwrap();
//! let again = store.bulk_import(rows).unwrap();
//! assert_eq!(again.unchanged, 1);
//!
//! let lookup = store.lookup("premodern", "Goblin Lackey").unwrap();
//! assert!(lookup.info.is_unknown());
//! assert!(lookup.newly_registered);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{CardInfo, CardMetadata, normalize_format};

/// Result of merging one entry into a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    /// An `unknown` entry was replaced with known metadata.
    Upgraded,
    Unchanged,
}

/// Counts of a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub upgraded: usize,
    pub unchanged: usize,
}

impl ImportReport {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Upgraded => self.upgraded += 1,
            MergeOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Returns `true` if the import changed the store.
    pub fn changed(&self) -> bool {
        self.inserted + self.upgraded > 0
    }
}

/// Result of [`CardStore::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub info: CardInfo,
    /// `true` if the lookup registered the card as unknown.
    pub newly_registered: bool,
}

/// Non-fatal notice that a card has no metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownCardWarning {
    pub format: String,
    pub name: String,
    /// `false` when the card was already registered as unknown.
    pub newly_registered: bool,
}

/// Key-value store of card metadata keyed by `(format, name)`.
///
/// Formats are normalized with [`normalize_format`] by the provided methods
/// before reaching `get`/`put`.
pub trait CardStore {
    type Error: std::error::Error;

    /// Returns the stored entry.
    fn get(&self, format: &str, name: &str) -> Result<Option<CardInfo>, Self::Error>;

    /// Stores an entry unconditionally.
    fn put(&mut self, format: &str, name: &str, info: CardInfo) -> Result<(), Self::Error>;

    /// Writes pending changes to the backing medium.
    fn persist(&mut self) -> Result<(), Self::Error>;

    /// Returns the metadata of a card, registering it as unknown if absent.
    ///
    /// Absence is never an error; only backend failures are.
    fn lookup(&mut self, format: &str, name: &str) -> Result<Lookup, Self::Error> {
        let format = normalize_format(format);
        if let Some(info) = self.get(&format, name)? {
            return Ok(Lookup {
                info,
                newly_registered: false,
            });
        }
        self.put(&format, name, CardInfo::unknown())?;
        Ok(Lookup {
            info: CardInfo::unknown(),
            newly_registered: true,
        })
    }

    /// Upserts an entry without overwriting known metadata.
    fn merge(&mut self, format: &str, name: &str, info: CardInfo) -> Result<MergeOutcome, Self::Error> {
        let format = normalize_format(format);
        match self.get(&format, name)? {
            None => {
                self.put(&format, name, info)?;
                Ok(MergeOutcome::Inserted)
            }
            Some(existing) if existing.is_unknown() && !info.is_unknown() => {
                self.put(&format, name, info)?;
                Ok(MergeOutcome::Upgraded)
            }
            Some(_) => Ok(MergeOutcome::Unchanged),
        }
    }

    /// Merges authoritative rows; importing the same rows twice is a no-op.
    fn bulk_import<I>(&mut self, rows: I) -> Result<ImportReport, Self::Error>
    where
        I: IntoIterator<Item = CardMetadata>,
        Self: Sized,
    {
        let mut report = ImportReport::default();
        for row in rows {
            let outcome = self.merge(&row.format, &row.name, row.info())?;
            report.record(outcome);
        }
        debug!(
            inserted = report.inserted,
            upgraded = report.upgraded,
            unchanged = report.unchanged,
            "imported authoritative card rows"
        );
        Ok(report)
    }

    /// Looks up every name once and returns a read-only snapshot.
    fn resolve<'a, I>(&mut self, format: &str, names: I) -> Result<MetadataIndex, Self::Error>
    where
        I: IntoIterator<Item = &'a str>,
        Self: Sized,
    {
        let mut index = MetadataIndex::new(format);
        for name in names {
            if index.cards.contains_key(name) {
                continue;
            }
            let lookup = self.lookup(format, name)?;
            if lookup.info.is_unknown() {
                warn!(format = %index.format, card = name, "card has no metadata");
                index.unknown.push(UnknownCardWarning {
                    format: index.format.clone(),
                    name: name.to_string(),
                    newly_registered: lookup.newly_registered,
                });
            }
            index.cards.insert(name.to_string(), lookup.info);
        }
        Ok(index)
    }
}

/// Read-only metadata snapshot shared by the parallel pipeline stages.
#[derive(Debug, Clone)]
pub struct MetadataIndex {
    pub format: String,
    cards: HashMap<String, CardInfo>,
    unknown_info: CardInfo,
    /// Cards without metadata, in lookup order.
    pub unknown: Vec<UnknownCardWarning>,
}

impl MetadataIndex {
    pub fn new(format: &str) -> Self {
        Self {
            format: normalize_format(format),
            cards: HashMap::new(),
            unknown_info: CardInfo::unknown(),
            unknown: Vec::new(),
        }
    }

    /// Builds an index directly from `(name, info)` pairs.
    pub fn from_entries<I>(format: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, CardInfo)>,
    {
        let mut index = Self::new(format);
        index.cards.extend(entries);
        index
    }

    /// Returns the metadata of `name`, or the unknown triple.
    pub fn get(&self, name: &str) -> &CardInfo {
        self.cards.get(name).unwrap_or(&self.unknown_info)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// In-memory store serialized as `{format: {name: {type, subtype, color}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryCardStore {
    formats: BTreeMap<String, BTreeMap<String, CardInfo>>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries across all formats.
    pub fn len(&self) -> usize {
        self.formats.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the format keys.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// Iterates all entries as authoritative-style rows.
    pub fn rows(&self) -> impl Iterator<Item = CardMetadata> + '_ {
        self.formats.iter().flat_map(|(format, cards)| {
            cards
                .iter()
                .map(move |(name, info)| CardMetadata::new(format, name, info.clone()))
        })
    }
}

impl CardStore for MemoryCardStore {
    type Error = Infallible;

    fn get(&self, format: &str, name: &str) -> Result<Option<CardInfo>, Infallible> {
        Ok(self
            .formats
            .get(format)
            .and_then(|cards| cards.get(name))
            .cloned())
    }

    fn put(&mut self, format: &str, name: &str, info: CardInfo) -> Result<(), Infallible> {
        self.formats
            .entry(format.to_string())
            .or_default()
            .insert(name.to_string(), info);
        Ok(())
    }

    fn persist(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}
