//! [`CardStore`] backed by a prefixed SQLite table.

use deckstats_core::{CardInfo, CardMetadata, CardStore, MemoryCardStore};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::trace;

use crate::error::{Result, SqliteError};
use crate::schema::validate_prefix;

/// Card metadata store over a borrowed connection.
///
/// Every `put` is an upsert executed immediately, so [`persist`] has nothing
/// to flush. Wrap a batch in a transaction by building the store over
/// `&Transaction` (it dereferences to [`Connection`]) and committing it
/// afterwards.
///
/// [`persist`]: CardStore::persist
///
/// # Examples
///
/// ```
/// use deckstats_core::{CardInfo, CardStore};
/// use deckstats_sqlite::{Migration, SqliteCardStore};
/// use rusqlite::Connection;
///
/// let mut migration = Migration::new(Connection::open_in_memory().unwrap(), "ds_").unwrap();
/// migration.up().unwrap();
///
/// let mut store = SqliteCardStore::new(migration.connection(), "ds_").unwrap();
/// store.merge("Premodern", "Mountain", CardInfo::new("Land", "Basic", "C")).unwrap();
/// assert_eq!(store.count().unwrap(), 1);
/// assert!(store.lookup("premodern", "Goblin Lackey").unwrap().newly_registered);
/// ```
pub struct SqliteCardStore<'a> {
    conn: &'a Connection,
    prefix: String,
}

impl<'a> SqliteCardStore<'a> {
    /// Creates a store over the `{prefix}cards` table.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix is invalid.
    pub fn new(conn: &'a Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { conn, prefix })
    }

    /// Returns the number of stored cards across all formats.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}cards", self.prefix),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Returns the stored formats in sorted order.
    pub fn formats(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT format FROM {}cards ORDER BY format",
            self.prefix
        ))?;
        let formats = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(formats)
    }

    /// Returns every row ordered by format and name.
    pub fn rows(&self) -> Result<Vec<CardMetadata>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT format, name, type, subtype, color FROM {}cards ORDER BY format, name",
            self.prefix
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CardMetadata {
                    format: row.get(0)?,
                    name: row.get(1)?,
                    card_type: row.get(2)?,
                    subtype: row.get(3)?,
                    color: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Returns the names of a format's cards that still have no metadata.
    pub fn unknown_cards(&self, format: &str) -> Result<Vec<String>> {
        let unknown = CardInfo::unknown();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT name FROM {}cards WHERE format = ?1 AND type = ?2 AND subtype = ?3 AND color = ?4 ORDER BY name",
            self.prefix
        ))?;
        let names = stmt
            .query_map(
                params![
                    deckstats_core::normalize_format(format),
                    unknown.card_type,
                    unknown.subtype,
                    unknown.color
                ],
                |row| row.get::<_, String>(0),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Copies the table into an in-memory store.
    pub fn to_memory(&self) -> Result<MemoryCardStore> {
        let mut memory = MemoryCardStore::new();
        let Ok(_) = memory.bulk_import(self.rows()?);
        Ok(memory)
    }
}

impl CardStore for SqliteCardStore<'_> {
    type Error = SqliteError;

    fn get(&self, format: &str, name: &str) -> Result<Option<CardInfo>> {
        let info = self
            .conn
            .query_row(
                &format!(
                    "SELECT type, subtype, color FROM {}cards WHERE format = ?1 AND name = ?2",
                    self.prefix
                ),
                params![format, name],
                |row| {
                    Ok(CardInfo {
                        card_type: row.get(0)?,
                        subtype: row.get(1)?,
                        color: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }

    fn put(&mut self, format: &str, name: &str, info: CardInfo) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {}cards (format, name, type, subtype, color) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (format, name) DO UPDATE SET
                    type = excluded.type, subtype = excluded.subtype, color = excluded.color",
                self.prefix
            ),
            params![format, name, info.card_type, info.subtype, info.color],
        )?;
        trace!(format, card = name, "stored card metadata");
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::generate_schema_sql;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_schema_sql("t_").unwrap()).unwrap();
        conn
    }

    #[test]
    fn test_new_validates_prefix() {
        let conn = setup();
        assert!(SqliteCardStore::new(&conn, "t_").is_ok());
        assert!(matches!(
            SqliteCardStore::new(&conn, "t;"),
            Err(SqliteError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_put_overwrites_get_reads_back() {
        let conn = setup();
        let mut store = SqliteCardStore::new(&conn, "t_").unwrap();
        assert_eq!(store.get("premodern", "Mountain").unwrap(), None);

        store.put("premodern", "Mountain", CardInfo::unknown()).unwrap();
        store
            .put("premodern", "Mountain", CardInfo::new("Land", "Basic", "C"))
            .unwrap();
        assert_eq!(
            store.get("premodern", "Mountain").unwrap(),
            Some(CardInfo::new("Land", "Basic", "C"))
        );
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_unknown_cards_listed_per_format() {
        let conn = setup();
        let mut store = SqliteCardStore::new(&conn, "t_").unwrap();
        store.lookup("Premodern", "Zeta").unwrap();
        store.lookup("Premodern", "Alpha").unwrap();
        store.lookup("Old School", "Alpha").unwrap();
        store
            .merge("premodern", "Mountain", CardInfo::new("Land", "Basic", "C"))
            .unwrap();

        assert_eq!(store.unknown_cards("Premodern").unwrap(), vec!["Alpha", "Zeta"]);
        assert_eq!(store.formats().unwrap(), vec!["old_school", "premodern"]);
    }

    #[test]
    fn test_to_memory_copies_all_rows() {
        let conn = setup();
        let mut store = SqliteCardStore::new(&conn, "t_").unwrap();
        store
            .merge("premodern", "Mountain", CardInfo::new("Land", "Basic", "C"))
            .unwrap();
        store.lookup("premodern", "Mystery").unwrap();

        let memory = store.to_memory().unwrap();
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.rows().collect::<Vec<_>>(), store.rows().unwrap());
    }
}
