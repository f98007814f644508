//! Error types for the consensus pipeline.
//!
//! Fatal errors are split by scope: [`PipelineError::MalformedLine`] aborts a
//! whole parse (only under [`MalformedLinePolicy::Reject`](crate::MalformedLinePolicy::Reject)),
//! while densification and reconciliation errors abort only the cohort they
//! occurred in and are collected into the run-level error list.

use thiserror::Error;

use crate::types::{DecklistId, GroupKey};

/// Failure to bring a group's final quantities to its target sum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    /// No row can move toward the target and the sum still differs.
    #[error("group {group} cannot reach target {target}: no eligible row (residual {residual})")]
    NoEligibleRow {
        group: GroupKey,
        target: u32,
        /// `target - current sum`.
        residual: i64,
    },

    /// The adjustment loop exceeded its iteration cap.
    #[error(
        "group {group} did not converge to target {target} within {iterations} iterations (residual {residual})"
    )]
    IterationCap {
        group: GroupKey,
        target: u32,
        residual: i64,
        iterations: usize,
    },
}

impl ReconciliationError {
    /// Returns the group that failed.
    pub fn group(&self) -> &GroupKey {
        match self {
            Self::NoEligibleRow { group, .. } | Self::IterationCap { group, .. } => group,
        }
    }

    /// Returns `target - sum` at the time of failure.
    pub fn residual(&self) -> i64 {
        match self {
            Self::NoEligibleRow { residual, .. } | Self::IterationCap { residual, .. } => *residual,
        }
    }
}

/// Errors raised by the decklist pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A decklist line is not `<qty> <name>` and the parser rejects such lines.
    #[error("decklist {decklist_id} line {line_number}: malformed card line {text:?}")]
    MalformedLine {
        decklist_id: DecklistId,
        line_number: usize,
        text: String,
    },

    /// Densification produced the wrong number of rows; indicates a logic bug.
    #[error(
        "cohort '{deck_colors}' ({section}): densified {actual} rows, expected {expected}"
    )]
    DensificationInvariant {
        deck_colors: String,
        section: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Quantities of one card in one decklist add up past `u32::MAX`.
    #[error("cohort '{deck_colors}': quantity of {name:?} in decklist {decklist_id} overflows")]
    QuantityOverflow {
        deck_colors: String,
        decklist_id: DecklistId,
        name: String,
    },

    /// A reconciliation group did not converge.
    #[error("reconciliation failed: {0}")]
    Reconciliation(#[from] ReconciliationError),

    /// The card metadata store failed.
    #[error("card store error: {0}")]
    Store(String),

    /// The pipeline configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias for results with [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;
