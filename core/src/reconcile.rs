//! Final-build reconciliation.
//!
//! Card-level `final_qty` values start at each card's first mode and do not
//! generally add up to a sensible deck size. The reconciler splits the card
//! table into groups, assigns every group a target, and moves quantities until
//! each group sums to its target exactly:
//!
//! * [`TargetMode::Derived`] groups by `(sideboard, type)` and takes the
//!   type-level `final_qty` as target.
//! * [`TargetMode::Fixed`] groups by sideboard flag and uses
//!   [`FixedTargets`](crate::FixedTargets).
//!
//! Adjustment is either mode substitution (swap a card to its second mode) or
//! unit steps (one copy at a time on the card furthest from its mean).

use tracing::{debug, warn};

use crate::config::{Adjustment, PipelineConfig, TargetMode};
use crate::error::ReconciliationError;
use crate::types::{CardAggregate, GroupKey, GroupTarget, TypeAggregate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Decrease,
    Increase,
}

/// Reconciles `cards` in place and returns the targets of every group.
///
/// `types` must be the type-level table (no subtype) of the same cohort; it
/// is only consulted in [`TargetMode::Derived`]. Groups are visited in
/// report order and only groups with at least one card row exist.
///
/// # Errors
///
/// Returns the first [`ReconciliationError`] met. Groups reconciled before
/// the failure keep their adjusted quantities.
pub fn reconcile(
    cards: &mut [CardAggregate],
    types: &[TypeAggregate],
    config: &PipelineConfig,
) -> Result<Vec<GroupTarget>, ReconciliationError> {
    let mut groups: Vec<(GroupKey, Vec<usize>)> = Vec::new();
    for (idx, card) in cards.iter().enumerate() {
        let key = group_key(card, config.target_mode);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(idx),
            None => groups.push((key, vec![idx])),
        }
    }

    let mut targets = Vec::with_capacity(groups.len());
    for (group, members) in groups {
        let target = match config.target_mode {
            TargetMode::Fixed => config.fixed_targets.for_section(group.sideboard),
            TargetMode::Derived => derived_target(&group, types),
        };
        let steps = match config.adjustment {
            Adjustment::ModeSubstitution => {
                substitute_modes(cards, &members, &group, target, config.max_iterations)?
            }
            Adjustment::UnitStep => unit_steps(cards, &members, &group, target, config.max_iterations)?,
        };
        debug!(group = %group, target, steps, "reconciled group");
        targets.push(GroupTarget {
            group,
            target,
            steps,
        });
    }
    Ok(targets)
}

fn group_key(card: &CardAggregate, mode: TargetMode) -> GroupKey {
    GroupKey {
        deck_colors: card.deck_colors.clone(),
        sideboard: card.sideboard,
        card_type: match mode {
            TargetMode::Derived => Some(card.card_type.clone()),
            TargetMode::Fixed => None,
        },
    }
}

fn derived_target(group: &GroupKey, types: &[TypeAggregate]) -> u32 {
    let found = types.iter().find(|t| {
        t.subtype.is_none()
            && t.sideboard == group.sideboard
            && Some(t.card_type.as_str()) == group.card_type.as_deref()
    });
    match found {
        Some(t) => t.final_qty,
        None => {
            warn!(group = %group, "no type aggregate for group; targeting zero");
            0
        }
    }
}

fn group_sum(cards: &[CardAggregate], members: &[usize]) -> i64 {
    members.iter().map(|&i| i64::from(cards[i].final_qty)).sum()
}

fn direction(sum: i64, target: u32) -> Option<Direction> {
    match sum.cmp(&i64::from(target)) {
        std::cmp::Ordering::Greater => Some(Direction::Decrease),
        std::cmp::Ordering::Less => Some(Direction::Increase),
        std::cmp::Ordering::Equal => None,
    }
}

/// Swaps cards to their second mode until the group hits `target`.
///
/// Candidates are ranked by the share of decklists playing their second mode,
/// highest first, cards without a second mode last. Each step rescans the
/// ranking from the top.
fn substitute_modes(
    cards: &mut [CardAggregate],
    members: &[usize],
    group: &GroupKey,
    target: u32,
    max_iterations: usize,
) -> Result<usize, ReconciliationError> {
    let mut ranked = members.to_vec();
    ranked.sort_by(|&a, &b| {
        let share = |i: usize| cards[i].mode_2nd().map_or(f64::NEG_INFINITY, |m| m.fraction);
        share(b).total_cmp(&share(a))
    });

    let mut steps = 0;
    loop {
        let sum = group_sum(cards, members);
        let Some(dir) = direction(sum, target) else {
            return Ok(steps);
        };
        let residual = i64::from(target) - sum;

        let candidate = ranked.iter().copied().find_map(|i| {
            let second = cards[i].mode_2nd()?;
            let eligible = match dir {
                Direction::Decrease => second.value < cards[i].final_qty,
                Direction::Increase => second.value > cards[i].final_qty,
            };
            eligible.then_some((i, second.value))
        });
        let Some((idx, value)) = candidate else {
            return Err(ReconciliationError::NoEligibleRow {
                group: group.clone(),
                target,
                residual,
            });
        };
        if steps >= max_iterations {
            return Err(ReconciliationError::IterationCap {
                group: group.clone(),
                target,
                residual,
                iterations: steps,
            });
        }
        cards[idx].set_final_qty(value);
        steps += 1;
    }
}

/// Moves one copy at a time until the group hits `target`.
///
/// Decreasing picks the card with the largest `diff` among cards still
/// played; increasing picks the smallest `diff`. The first card in report
/// order wins ties.
fn unit_steps(
    cards: &mut [CardAggregate],
    members: &[usize],
    group: &GroupKey,
    target: u32,
    max_iterations: usize,
) -> Result<usize, ReconciliationError> {
    let mut steps = 0;
    loop {
        let sum = group_sum(cards, members);
        let Some(dir) = direction(sum, target) else {
            return Ok(steps);
        };
        let residual = i64::from(target) - sum;

        let mut best: Option<usize> = None;
        for &i in members {
            let card = &cards[i];
            let better = match (dir, best) {
                (Direction::Decrease, _) if card.final_qty == 0 => false,
                (_, None) => true,
                (Direction::Decrease, Some(b)) => card.diff > cards[b].diff,
                (Direction::Increase, Some(b)) => card.diff < cards[b].diff,
            };
            if better {
                best = Some(i);
            }
        }
        let Some(idx) = best else {
            return Err(ReconciliationError::NoEligibleRow {
                group: group.clone(),
                target,
                residual,
            });
        };
        if steps >= max_iterations {
            return Err(ReconciliationError::IterationCap {
                group: group.clone(),
                target,
                residual,
                iterations: steps,
            });
        }
        let qty = cards[idx].final_qty;
        let next = match dir {
            Direction::Decrease => qty - 1,
            Direction::Increase => qty + 1,
        };
        cards[idx].set_final_qty(next);
        steps += 1;
    }
}
