//! JSON card database and authoritative CSV import.
//!
//! The database file is a nested object keyed by format and card name:
//!
//! ```json
//! {
//!   "premodern": {
//!     "Goblin Lackey": { "type": "Creature", "subtype": "Goblin", "color": "R" }
//!   }
//! }
//! ```
//!
//! Authoritative metadata comes from a CSV file with the header
//! `format,name,type,subtype,color`.

use std::convert::Infallible;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use deckstats_core::{CardInfo, CardMetadata, CardStore, ImportReport, MemoryCardStore};
use tracing::{debug, info};

use crate::error::{Result, StoreError};

fn never<T>(result: std::result::Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Card metadata store persisted as a JSON file.
///
/// Changes are kept in memory until [`persist`](CardStore::persist) (or
/// [`save`](Self::save)) writes the whole file.
///
/// # Examples
///
/// ```no_run
/// use deckstats_db::JsonCardStore;
/// use deckstats_core::CardStore;
///
/// let mut store = JsonCardStore::open("cards_db.json").unwrap();
/// let lookup = store.lookup("premodern", "Goblin Lackey").unwrap();
/// println!("{}", lookup.info.card_type);
/// store.persist().unwrap();
/// ```
#[derive(Debug)]
pub struct JsonCardStore {
    path: PathBuf,
    cards: MemoryCardStore,
    dirty: bool,
}

impl JsonCardStore {
    /// Opens the database at `path`, starting empty if the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if an existing file cannot be read, or
    /// [`StoreError::JsonError`] if it is not a valid card database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "card database not found; starting empty");
            return Ok(Self {
                path: path.to_path_buf(),
                cards: MemoryCardStore::new(),
                dirty: false,
            });
        }
        Self::load(path)
    }

    /// Loads an existing database file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the file cannot be read, or
    /// [`StoreError::JsonError`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let cards: MemoryCardStore = serde_json::from_reader(reader)?;
        debug!(path = %path.display(), cards = cards.len(), "loaded card database");
        Ok(Self {
            path: path.to_path_buf(),
            cards,
            dirty: false,
        })
    }

    /// Writes the database to its path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the file cannot be written, or
    /// [`StoreError::JsonError`] if serialization fails.
    pub fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&self.path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.cards)?;
        self.dirty = false;
        Ok(())
    }

    /// Merges the rows of an authoritative CSV file and persists the result
    /// when anything changed.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`read_authoritative_csv`] and [`save`](Self::save).
    pub fn import_csv(&mut self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let rows = read_authoritative_csv(path)?;
        let report = self.bulk_import(rows)?;
        if report.changed() {
            self.persist()?;
        }
        info!(
            inserted = report.inserted,
            upgraded = report.upgraded,
            unchanged = report.unchanged,
            "imported authoritative card metadata"
        );
        Ok(report)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the in-memory contents.
    pub fn cards(&self) -> &MemoryCardStore {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl CardStore for JsonCardStore {
    type Error = StoreError;

    fn get(&self, format: &str, name: &str) -> Result<Option<CardInfo>> {
        Ok(never(self.cards.get(format, name)))
    }

    fn put(&mut self, format: &str, name: &str, info: CardInfo) -> Result<()> {
        never(self.cards.put(format, name, info));
        self.dirty = true;
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        if self.dirty {
            self.save()?;
        }
        Ok(())
    }
}

/// Reads authoritative card rows from a CSV file with the header
/// `format,name,type,subtype,color`.
///
/// Formats are normalized; fields are trimmed.
///
/// # Errors
///
/// Returns [`StoreError::CsvError`] for unreadable or malformed CSV and
/// [`StoreError::InvalidRow`] for a row with an empty format or name.
pub fn read_authoritative_csv(path: impl AsRef<Path>) -> Result<Vec<CardMetadata>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<CardMetadata>() {
        let row = record?;
        let line = rows.len() as u64 + 2;
        if row.format.is_empty() {
            return Err(StoreError::InvalidRow {
                line,
                reason: "empty format".to_string(),
            });
        }
        if row.name.is_empty() {
            return Err(StoreError::InvalidRow {
                line,
                reason: "empty card name".to_string(),
            });
        }
        let info = row.info();
        rows.push(CardMetadata::new(&row.format, &row.name, info));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCardStore::open(dir.path().join("cards.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_persist_only_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        let mut store = JsonCardStore::open(&path).unwrap();
        store.persist().unwrap();
        assert!(!path.exists());

        store.lookup("premodern", "Goblin Lackey").unwrap();
        store.persist().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        let mut store = JsonCardStore::open(&path).unwrap();
        store
            .merge("Premodern", "Mountain", CardInfo::new("Land", "Basic", "C"))
            .unwrap();
        store.save().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["premodern"]["Mountain"]["type"], "Land");
        assert_eq!(raw["premodern"]["Mountain"]["color"], "C");
    }

    #[test]
    fn test_csv_rows_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.csv");
        std::fs::write(
            &path,
            "format,name,type,subtype,color\nOld School, Juzam Djinn ,Creature,Djinn,B\n",
        )
        .unwrap();
        let rows = read_authoritative_csv(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].format, "old_school");
        assert_eq!(rows[0].name, "Juzam Djinn");
    }

    #[test]
    fn test_csv_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.csv");
        std::fs::write(
            &path,
            "format,name,type,subtype,color\npremodern,Bolt,Instant,Burn,R\npremodern,,Land,Basic,C\n",
        )
        .unwrap();
        let err = read_authoritative_csv(&path).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRow { line: 3, .. }));
    }
}
