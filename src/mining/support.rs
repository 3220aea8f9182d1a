//! Batch support counting over the index, vertical or horizontal

use crate::config::CountingStrategy;
use crate::mining::index::ItemsetIndex;
use crate::mining::itemset::{Itemset, Support};
use rayon::prelude::*;

/// Compute the support of every candidate against the index.
///
/// Both strategies produce identical results; the choice is a tuning decision.
/// Results are returned in candidate order, so the output is deterministic
/// regardless of worker scheduling.
pub fn count_supports(
    index: &ItemsetIndex,
    candidates: &[Itemset],
    strategy: CountingStrategy,
) -> Vec<(Itemset, Support)> {
    let counts = match strategy {
        CountingStrategy::Vertical => count_vertical(index, candidates),
        CountingStrategy::Horizontal => count_horizontal(index, candidates),
    };
    let total = index.total_transactions();
    candidates
        .iter()
        .zip(counts)
        .map(|(candidate, count)| {
            let support = Support {
                count,
                support: count as f64 / total as f64,
            };
            (candidate.clone(), support)
        })
        .collect()
}

/// Per-candidate tidset intersection, parallel across candidates.
fn count_vertical(index: &ItemsetIndex, candidates: &[Itemset]) -> Vec<usize> {
    candidates
        .par_iter()
        .map(|candidate| index.support_count(candidate))
        .collect()
}

/// One pass over the transactions testing every candidate for subset
/// membership, parallel across transactions with a count merge at the end.
fn count_horizontal(index: &ItemsetIndex, candidates: &[Itemset]) -> Vec<usize> {
    index
        .transactions()
        .par_iter()
        .fold(
            || vec![0usize; candidates.len()],
            |mut counts, transaction| {
                for (slot, candidate) in candidates.iter().enumerate() {
                    let contained = candidate
                        .items()
                        .iter()
                        .all(|item| transaction.contains(item.as_str()));
                    if contained {
                        counts[slot] += 1;
                    }
                }
                counts
            },
        )
        .reduce(
            || vec![0usize; candidates.len()],
            |mut merged, counts| {
                for (slot, count) in counts.into_iter().enumerate() {
                    merged[slot] += count;
                }
                merged
            },
        )
}
