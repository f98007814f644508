//! Numeric helpers shared by the type and card aggregators.

/// Rounds half to even (`2.5 → 2`, `3.5 → 4`).
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Returns `sum / n`, or 0 for an empty group.
pub fn mean(sum: u64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}

/// Sums quantities without overflowing `u32`.
pub fn total<T: Copy + Into<u64>>(values: &[T]) -> u64 {
    values.iter().map(|&v| v.into()).sum()
}

/// Rounds a non-negative mean to the nearest count.
pub fn rounded(mean: f64) -> u32 {
    round_half_even(mean).max(0.0) as u32
}

/// Offsets around the rounded mean covered by the distribution.
pub const NEAR_MEAN_OFFSETS: [i64; 5] = [-2, -1, 0, 1, 2];

/// Share of `totals` equal to `center + k` for each `k` in
/// [`NEAR_MEAN_OFFSETS`].
pub fn near_mean_distribution<T: Copy + Into<u64>>(totals: &[T], center: u32) -> [f64; 5] {
    let mut out = [0.0; 5];
    if totals.is_empty() {
        return out;
    }
    let n = totals.len() as f64;
    for (slot, offset) in out.iter_mut().zip(NEAR_MEAN_OFFSETS) {
        let target = i64::from(center) + offset;
        let hits = totals
            .iter()
            .filter(|&&t| i128::from(t.into()) == i128::from(target))
            .count();
        *slot = hits as f64 / n;
    }
    out
}

/// The count within ±2 of `center` played by the largest share of decklists.
///
/// Ties go to the smallest offset. The result is clamped at zero.
pub fn closest_mode(center: u32, distribution: &[f64; 5]) -> u32 {
    let mut best = 0;
    for (i, share) in distribution.iter().enumerate() {
        if *share > distribution[best] {
            best = i;
        }
    }
    (i64::from(center) + NEAR_MEAN_OFFSETS[best]).max(0) as u32
}

/// Population standard deviation (divisor `n`).
pub fn population_std<T: Copy + Into<u64>>(values: &[T], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let squares: f64 = values
        .iter()
        .map(|&v| (v.into() as f64 - mean).powi(2))
        .sum();
    (squares / values.len() as f64).sqrt()
}

/// Distinct values with their counts, most frequent first.
///
/// Values are tabulated in order of first appearance and then stably sorted
/// by count, so equally frequent values keep first-seen order.
pub fn ranked_values(values: &[u32]) -> Vec<(u32, usize)> {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for &value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
