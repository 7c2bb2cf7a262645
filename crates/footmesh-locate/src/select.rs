//! Best-K neighbor selection.
//!
//! Two phases over `(index, score)` pairs:
//!
//! 1. [`partial_select`] isolates the top `k` with `select_nth_unstable_by`,
//!    linear on average, without ordering the rest.
//! 2. [`bounded_sort`] orders only that `k`-slice.
//!
//! The comparator ranks by score descending and then by directory index
//! ascending. That is a total order, so ties always resolve to insertion
//! order and repeated calls give identical output. NaN scores rank last.

use std::cmp::Ordering;

use crate::{NeighborRecord, ScoreWeights};

/// A directory entry paired with its score for one selection call.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    /// Position of the entry in the directory
    pub index: usize,
    /// The entry itself
    pub record: &'a NeighborRecord,
    /// Score under the weights used for this call
    pub score: f64,
}

/// `(directory index, score)` as ranked by the selector.
pub type Ranked = (usize, f64);

#[inline]
fn rank_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        // Fold -0.0 into 0.0 so equal scores tie.
        score + 0.0
    }
}

/// Selector ordering: higher score first, then lower index.
pub fn by_rank(a: &Ranked, b: &Ranked) -> Ordering {
    rank_key(b.1)
        .total_cmp(&rank_key(a.1))
        .then_with(|| a.0.cmp(&b.0))
}

/// Phase one: move the `k` best pairs to the front and return them.
///
/// The returned slice is in no particular order.
pub fn partial_select(ranked: &mut [Ranked], k: usize) -> &mut [Ranked] {
    let k = k.min(ranked.len());
    if k == 0 {
        return &mut ranked[..0];
    }
    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, by_rank);
    }
    &mut ranked[..k]
}

/// Phase two: order a bounded slice.
pub fn bounded_sort(top: &mut [Ranked]) {
    top.sort_unstable_by(by_rank);
}

/// Score every record and return the top `k`, best first.
pub fn rank_top_k<'a>(
    records: &'a [NeighborRecord],
    weights: &ScoreWeights,
    k: usize,
) -> Vec<ScoredCandidate<'a>> {
    let mut ranked: Vec<Ranked> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, weights.score(r)))
        .collect();

    let top = partial_select(&mut ranked, k);
    bounded_sort(top);

    top.iter()
        .map(|&(index, score)| ScoredCandidate {
            index,
            record: &records[index],
            score,
        })
        .collect()
}

/// The `min(k, len)` most desirable records under the default weights.
pub fn select_best(records: &[NeighborRecord], k: usize) -> Vec<&NeighborRecord> {
    rank_top_k(records, &ScoreWeights::default(), k)
        .into_iter()
        .map(|c| c.record)
        .collect()
}
