//! Raw decklist parsing.
//!
//! A decklist blob is a sequence of `<qty> <name>` lines. The first blank line
//! separates the main deck from the sideboard; every later non-blank line is a
//! sideboard card. Parsing is an explicit two-state machine over the lines.
//!
//! # Example
//!
//! ```
//! use deckstats_core::{DecklistParser, MalformedLinePolicy};
//!
//! let blob = "4 Goblin Lackey\n20 Mountain\n\n3 Pyroblast\n";
//! let parsed = DecklistParser::new(MalformedLinePolicy::Skip)
//!     .parse_corpus(&[blob])
//!     .unwrap();
//!
//! assert_eq!(parsed.decklists, 1);
//! assert_eq!(parsed.observations.len(), 3);
//! assert!(parsed.observations[2].sideboard);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MalformedLinePolicy;
use crate::error::{PipelineError, Result};
use crate::types::{CardObservation, DecklistId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Main,
    Sideboard,
}

/// A line that could not be read as `<qty> <name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLine {
    pub decklist_id: DecklistId,
    /// 1-based line number within the decklist.
    pub line_number: usize,
    pub text: String,
}

/// Output of parsing a corpus of decklist blobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedCorpus {
    /// Observations in decklist order, main deck before sideboard.
    pub observations: Vec<CardObservation>,
    /// Number of decklists parsed (ids `0..decklists`).
    pub decklists: usize,
    /// Lines dropped under [`MalformedLinePolicy::Skip`].
    pub malformed: Vec<MalformedLine>,
}

impl ParsedCorpus {
    /// Returns the distinct card names in first-seen order.
    pub fn card_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.observations
            .iter()
            .filter(|obs| seen.insert(obs.name.as_str()))
            .map(|obs| obs.name.as_str())
            .collect()
    }
}

/// Splits a trimmed card line into quantity and name.
///
/// Returns `None` when the line does not start with an unsigned integer
/// followed by whitespace and a non-empty name.
///
/// # Examples
///
/// ```
/// use deckstats_core::parse_card_line;
///
/// assert_eq!(parse_card_line("4 Swords to Plowshares"), Some((4, "Swords to Plowshares")));
/// assert_eq!(parse_card_line("  12\tPlains  "), Some((12, "Plains")));
/// assert_eq!(parse_card_line("Sideboard"), None);
/// assert_eq!(parse_card_line("4x Brainstorm"), None);
/// ```
pub fn parse_card_line(line: &str) -> Option<(u32, &str)> {
    // SAFETY: compile-time constant pattern, exercised by tests.
    static CARD_LINE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(\d+)\s+(\S.*)$").expect("static regex must compile"));

    let captures = CARD_LINE_RE.captures(line.trim())?;
    let quantity = captures.get(1)?.as_str().parse::<u32>().ok()?;
    let name = captures.get(2)?.as_str().trim_end();
    Some((quantity, name))
}

/// Decklist parser configured with a malformed-line policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecklistParser {
    policy: MalformedLinePolicy,
}

impl DecklistParser {
    pub fn new(policy: MalformedLinePolicy) -> Self {
        Self { policy }
    }

    /// Parses every blob; blob `i` becomes decklist `i`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedLine`] for the first bad line when the
    /// policy is [`MalformedLinePolicy::Reject`].
    pub fn parse_corpus<S: AsRef<str>>(&self, blobs: &[S]) -> Result<ParsedCorpus> {
        let mut corpus = ParsedCorpus::default();
        for (decklist_id, blob) in blobs.iter().enumerate() {
            self.parse_decklist(decklist_id, blob.as_ref(), &mut corpus)?;
            corpus.decklists += 1;
        }
        if !corpus.malformed.is_empty() {
            warn!(
                count = corpus.malformed.len(),
                "dropped malformed decklist lines"
            );
        }
        debug!(
            decklists = corpus.decklists,
            observations = corpus.observations.len(),
            "parsed decklist corpus"
        );
        Ok(corpus)
    }

    /// Parses one decklist and appends its observations to `corpus`.
    ///
    /// Repeated lines for the same card in the same section are summed into
    /// the first occurrence.
    pub fn parse_decklist(
        &self,
        decklist_id: DecklistId,
        raw: &str,
        corpus: &mut ParsedCorpus,
    ) -> Result<()> {
        let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
        let mut section = Section::Main;
        let mut seen_card = false;
        let mut positions: HashMap<(bool, String), usize> = HashMap::new();

        for (index, line) in normalized.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                // Leading padding before the first card is not a separator.
                if seen_card && section == Section::Main {
                    section = Section::Sideboard;
                }
                continue;
            }

            let Some((quantity, name)) = parse_card_line(trimmed) else {
                self.handle_malformed(decklist_id, index + 1, trimmed, corpus)?;
                continue;
            };

            let sideboard = section == Section::Sideboard;
            match positions.get(&(sideboard, name.to_string())) {
                Some(&pos) => {
                    // A repeat that would overflow the running total is a bad line.
                    let Some(sum) = corpus.observations[pos].quantity.checked_add(quantity) else {
                        self.handle_malformed(decklist_id, index + 1, trimmed, corpus)?;
                        continue;
                    };
                    corpus.observations[pos].quantity = sum;
                }
                None => {
                    positions.insert((sideboard, name.to_string()), corpus.observations.len());
                    corpus
                        .observations
                        .push(CardObservation::new(decklist_id, sideboard, name, quantity));
                }
            }
            seen_card = true;
        }
        Ok(())
    }

    fn handle_malformed(
        &self,
        decklist_id: DecklistId,
        line_number: usize,
        text: &str,
        corpus: &mut ParsedCorpus,
    ) -> Result<()> {
        match self.policy {
            MalformedLinePolicy::Skip => {
                debug!(decklist_id, line = line_number, text, "skipping malformed line");
                corpus.malformed.push(MalformedLine {
                    decklist_id,
                    line_number,
                    text: text.to_string(),
                });
                Ok(())
            }
            MalformedLinePolicy::Reject => Err(PipelineError::MalformedLine {
                decklist_id,
                line_number,
                text: text.to_string(),
            }),
        }
    }
}
