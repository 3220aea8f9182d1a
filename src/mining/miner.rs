//! Level-by-level frequent itemset mining

use crate::config::{MiningConfig, SUPPORT_EPSILON};
use crate::error::AnalysisError;
use crate::mining::candidates::{generate_candidates, seed_candidates};
use crate::mining::index::ItemsetIndex;
use crate::mining::itemset::{Itemset, Support};
use crate::mining::support::count_supports;
use std::collections::{BTreeMap, HashMap};

/// All frequent itemsets found in a run, grouped by length, with supports
/// memoized for the rule generator.
#[derive(Debug, Default)]
pub struct FrequentItemsets {
    by_length: BTreeMap<usize, Vec<Itemset>>,
    supports: HashMap<Itemset, Support>,
    total_transactions: usize,
}

impl FrequentItemsets {
    pub fn len(&self) -> usize {
        self.supports.len()
    }

    /// True when mining converged without a single frequent itemset. This is
    /// a valid outcome, not a failure.
    pub fn is_empty(&self) -> bool {
        self.supports.is_empty()
    }

    pub fn total_transactions(&self) -> usize {
        self.total_transactions
    }

    /// Memoized support record; present for every frequent itemset and, by
    /// the Apriori property, for every subset of one.
    pub fn support(&self, itemset: &Itemset) -> Option<&Support> {
        self.supports.get(itemset)
    }

    /// Frequent itemsets of one length, in canonical order.
    pub fn at_length(&self, length: usize) -> &[Itemset] {
        self.by_length
            .get(&length)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Lengths present, ascending.
    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_length.keys().copied()
    }

    /// Every frequent itemset with its support, ordered by length then
    /// canonical itemset order.
    pub fn iter(&self) -> impl Iterator<Item = (&Itemset, &Support)> + '_ {
        self.by_length
            .values()
            .flatten()
            .filter_map(move |itemset| self.supports.get(itemset).map(|support| (itemset, support)))
    }
}

/// Mine all frequent itemsets from the index.
///
/// Runs the candidate -> count -> filter loop level by level until a level
/// comes up empty or `max_length` is reached. Level k+1 never starts before
/// level k has been fully counted.
///
/// # Errors
/// * `InvalidConfig` before any counting when a threshold is out of range
/// * `EmptyDataset` when there are no transactions or no items
/// * `CombinatorialOverflow` when a level's candidate volume exceeds the
///   configured bound
pub fn mine(
    index: &ItemsetIndex,
    config: &MiningConfig,
) -> Result<FrequentItemsets, AnalysisError> {
    config.validate()?;

    if index.total_transactions() == 0 {
        return Err(AnalysisError::EmptyDataset(
            "no transactions with at least one item".to_string(),
        ));
    }
    if index.vocabulary().is_empty() {
        return Err(AnalysisError::EmptyDataset(
            "transaction set has an empty item vocabulary".to_string(),
        ));
    }

    let mut result = FrequentItemsets {
        total_transactions: index.total_transactions(),
        ..FrequentItemsets::default()
    };

    let mut k = 1;
    let mut previous_level: Vec<Itemset> = Vec::new();

    loop {
        let candidates = if k == 1 {
            seed_candidates(index)
        } else {
            generate_candidates(&previous_level, k - 1)
        };
        if candidates.is_empty() {
            break;
        }
        if candidates.len() > config.max_candidates {
            return Err(AnalysisError::CombinatorialOverflow {
                level: k,
                candidates: candidates.len(),
                limit: config.max_candidates,
            });
        }

        let counted = count_supports(index, &candidates, config.strategy);
        let mut frequent_level: Vec<Itemset> = Vec::new();
        for (itemset, support) in counted {
            if support.support + SUPPORT_EPSILON >= config.min_support {
                result.supports.insert(itemset.clone(), support);
                frequent_level.push(itemset);
            }
        }
        log::debug!(
            "level {}: {} candidates, {} frequent",
            k,
            candidates.len(),
            frequent_level.len()
        );

        if frequent_level.is_empty() {
            break;
        }
        result.by_length.insert(k, frequent_level.clone());
        previous_level = frequent_level;

        if let Some(max_length) = config.max_length {
            if k >= max_length {
                break;
            }
        }
        k += 1;
    }

    log::info!(
        "mined {} frequent itemset(s) across {} level(s)",
        result.len(),
        result.by_length.len()
    );
    Ok(result)
}
