//! File-backed storage for deckstats.
//!
//! This crate provides the on-disk side of the analysis pipeline:
//!
//! - [`JsonCardStore`]: the card metadata database as a JSON file, with
//!   authoritative rows merged from CSV ([`read_authoritative_csv`]).
//! - [`CorpusDir`]: a directory tree of plain-text decklists implementing
//!   [`DecklistSource`](deckstats_core::DecklistSource), and
//!   [`corpus_fingerprint`] to identify a corpus in reports.
//! - [`RunConfig`]: YAML configuration of an analysis run.
//! - [`write_report`]: CSV, JSON and Markdown report files.
//!
//! # Quick start
//!
//! ```no_run
//! use deckstats_core::{DecklistSource, analyze};
//! use deckstats_db::{CorpusDir, JsonCardStore, RunConfig};
//!
//! let config = RunConfig::load("deckstats.yml").unwrap();
//! let mut store = JsonCardStore::open(&config.card_db).unwrap();
//! let blobs = CorpusDir::new(&config.corpus_dir)
//!     .list_decklist_blobs(&config.format, &config.archetype)
//!     .unwrap();
//! let run = analyze(&blobs, &config.format, &mut store, &config.pipeline).unwrap();
//! println!("{} partitions", run.partitions.len());
//! ```

mod card_db;
mod config;
mod corpus;
mod error;
mod output;

pub use card_db::{JsonCardStore, read_authoritative_csv};
pub use config::{ReportFormat, RunConfig};
pub use corpus::{CorpusDir, corpus_fingerprint};
pub use error::{Result, StoreError};
pub use output::write_report;
