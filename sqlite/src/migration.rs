//! Migration lifecycle operations for the SQLite card table.
//!
//! Provides [`Migration`] for creating, dropping, seeding and refreshing the
//! card table. All mutation operations use transactions to ensure atomicity.
//!
//! # Example
//!
//! ```no_run
//! use deckstats_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("cards.db").unwrap();
//! let mut migration = Migration::new(conn, "ds_").unwrap();
//!
//! // Create tables
//! migration.up().unwrap();
//!
//! // Seed from the JSON card database
//! migration.seed("cards_db.json").unwrap();
//!
//! // Check status
//! let status = migration.status().unwrap();
//! println!("{} cards, {} unknown", status.card_count, status.unknown_count);
//! ```

use std::path::Path;

use deckstats_core::{CardInfo, CardMetadata, CardStore, ImportReport};
use deckstats_db::JsonCardStore;
use rusqlite::{Connection, params};
use tracing::info;

use crate::error::{Result, SqliteError};
use crate::schema::{generate_drop_sql, generate_schema_sql, validate_prefix};
use crate::store::SqliteCardStore;

/// Manages the lifecycle of the SQLite card table.
///
/// Owns the connection; borrow a [`SqliteCardStore`] from it with
/// [`store`](Self::store) for lookups during an analysis run.
pub struct Migration {
    conn: Connection,
    prefix: String,
}

impl Migration {
    /// Creates a new migration manager for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid characters.
    pub fn new(conn: Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { conn, prefix })
    }

    /// Creates the card table and its indexes.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS` so it is safe to call multiple times.
    pub fn up(&mut self) -> Result<()> {
        let sql = generate_schema_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to create tables: {e}")))?;
        tx.commit()?;
        Ok(())
    }

    /// Drops the card table.
    pub fn down(&mut self) -> Result<()> {
        let sql = generate_drop_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to drop tables: {e}")))?;
        tx.commit()?;
        Ok(())
    }

    /// Returns whether the table exists and how many rows it holds.
    pub fn status(&self) -> Result<MigrationStatus> {
        if !self.tables_exist()? {
            return Ok(MigrationStatus::default());
        }

        let table = format!("{}cards", self.prefix);
        let card_count = self.count(&format!("SELECT COUNT(*) FROM {table}"), params![])?;
        let format_count = self.count(&format!("SELECT COUNT(DISTINCT format) FROM {table}"), params![])?;
        let unknown = CardInfo::unknown();
        let unknown_count = self.count(
            &format!("SELECT COUNT(*) FROM {table} WHERE type = ?1 AND subtype = ?2 AND color = ?3"),
            params![unknown.card_type, unknown.subtype, unknown.color],
        )?;

        Ok(MigrationStatus {
            tables_exist: true,
            card_count,
            format_count,
            unknown_count,
        })
    }

    /// Merges the rows of a JSON card database into the table.
    ///
    /// Uses the store merge rules: known entries are kept, `unknown` entries
    /// are upgraded, missing entries are inserted.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::LoaderError`] if the JSON file cannot be read,
    /// or [`SqliteError::DatabaseError`] if insertion fails.
    pub fn seed(&mut self, card_db: impl AsRef<Path>) -> Result<ImportReport> {
        let source = JsonCardStore::load(card_db)?;
        let rows: Vec<CardMetadata> = source.cards().rows().collect();
        self.import(rows)
    }

    /// Merges rows into the table within a single transaction.
    pub fn import<I>(&mut self, rows: I) -> Result<ImportReport>
    where
        I: IntoIterator<Item = CardMetadata>,
    {
        let tx = self.conn.transaction()?;
        let report = {
            let mut store = SqliteCardStore::new(&tx, self.prefix.as_str())?;
            store.bulk_import(rows)?
        };
        tx.commit()?;
        info!(
            inserted = report.inserted,
            upgraded = report.upgraded,
            unchanged = report.unchanged,
            "seeded sqlite card table"
        );
        Ok(report)
    }

    /// Drops the table, recreates it and seeds it from a JSON card database.
    pub fn refresh(&mut self, card_db: impl AsRef<Path>) -> Result<ImportReport> {
        self.down()?;
        self.up()?;
        self.seed(card_db)
    }

    /// Borrows a card store over the migrated table.
    pub fn store(&self) -> Result<SqliteCardStore<'_>> {
        SqliteCardStore::new(&self.conn, self.prefix.as_str())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migration and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn tables_exist(&self) -> Result<bool> {
        let table_name = format!("{}cards", self.prefix);
        let count = self.count(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            params![table_name],
        )?;
        Ok(count > 0)
    }

    fn count(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<usize> {
        let count: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Snapshot returned by [`Migration::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Whether the card table exists.
    pub tables_exist: bool,
    pub card_count: usize,
    /// Number of distinct formats.
    pub format_count: usize,
    /// Cards still registered as `unknown`.
    pub unknown_count: usize,
}
