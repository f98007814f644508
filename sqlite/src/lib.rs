//! SQLite storage backend for the card metadata database.
//!
//! The crate stores card metadata in a prefixed `{prefix}cards` table and
//! exposes it through the same [`CardStore`](deckstats_core::CardStore)
//! interface as the in-memory and JSON stores, so the analysis pipeline runs
//! unchanged on top of it.
//!
//! - **`schema`**: SQL generation with customizable table prefixes
//! - **`migration`**: lifecycle operations (up/down/seed/refresh/status)
//! - **`store`**: [`SqliteCardStore`], the runtime card lookup and upsert
//!
//! # Quick start
//!
//! ```no_run
//! use deckstats_core::{PipelineConfig, analyze};
//! use deckstats_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("cards.db").unwrap();
//! let mut migration = Migration::new(conn, "ds_").unwrap();
//! migration.up().unwrap();
//! migration.seed("cards_db.json").unwrap();
//!
//! let blobs = ["4 Goblin Lackey\n20 Mountain"];
//! let mut store = migration.store().unwrap();
//! let run = analyze(&blobs, "premodern", &mut store, &PipelineConfig::default()).unwrap();
//! println!("{} partitions", run.partitions.len());
//! ```

mod error;
mod migration;
mod schema;
mod store;

pub use error::{Result, SqliteError};
pub use migration::{Migration, MigrationStatus};
pub use schema::{generate_drop_sql, generate_schema_sql};
pub use store::SqliteCardStore;
