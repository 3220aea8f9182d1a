//! Per-item transaction-membership index built from raw (transaction, item) pairs

use crate::mining::itemset::Itemset;
use std::collections::{HashMap, HashSet};

/// Immutable transaction-membership structures for one transaction snapshot.
///
/// For each item the index holds the set of (dense) transaction indices
/// containing it; for each transaction, its distinct item set. Built once,
/// then only read.
#[derive(Debug)]
pub struct ItemsetIndex {
    tidsets: HashMap<String, HashSet<usize>>,
    transactions: Vec<HashSet<String>>,
    skipped_transactions: usize,
    skipped_rows: usize,
}

impl ItemsetIndex {
    /// Build the index from an ordered sequence of (transaction_id, item_name)
    /// pairs.
    ///
    /// Duplicate items within a transaction collapse to one. Rows with a blank
    /// item name are counted as skipped; a transaction whose rows were all
    /// blank is counted as a skipped empty transaction. Neither contributes to
    /// the transaction total.
    pub fn build(pairs: &[(String, String)]) -> Self {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut item_sets: Vec<HashSet<String>> = Vec::new();
        let mut skipped_rows = 0;

        for (transaction_id, item) in pairs {
            let slot = *slots.entry(transaction_id.clone()).or_insert_with(|| {
                item_sets.push(HashSet::new());
                item_sets.len() - 1
            });
            let item = item.trim();
            if item.is_empty() {
                skipped_rows += 1;
                continue;
            }
            item_sets[slot].insert(item.to_string());
        }

        let skipped_transactions = item_sets.iter().filter(|set| set.is_empty()).count();
        if skipped_transactions > 0 {
            log::warn!(
                "skipped {} transaction(s) with no valid items",
                skipped_transactions
            );
        }
        if skipped_rows > 0 {
            log::warn!("skipped {} row(s) with blank item names", skipped_rows);
        }

        let transactions: Vec<HashSet<String>> =
            item_sets.into_iter().filter(|set| !set.is_empty()).collect();

        let mut tidsets: HashMap<String, HashSet<usize>> = HashMap::new();
        for (tid, items) in transactions.iter().enumerate() {
            for item in items {
                tidsets.entry(item.clone()).or_default().insert(tid);
            }
        }

        ItemsetIndex {
            tidsets,
            transactions,
            skipped_transactions,
            skipped_rows,
        }
    }

    /// Number of transactions with at least one valid item.
    pub fn total_transactions(&self) -> usize {
        self.transactions.len()
    }

    /// Transactions dropped for having no valid items.
    pub fn skipped_transactions(&self) -> usize {
        self.skipped_transactions
    }

    /// Input rows dropped for blank item names.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// All distinct items observed, in canonical order.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut items: Vec<String> = self.tidsets.keys().cloned().collect();
        items.sort();
        items
    }

    /// Item sets per transaction, for the horizontal counting strategy.
    pub fn transactions(&self) -> &[HashSet<String>] {
        &self.transactions
    }

    /// Number of transactions containing `itemset` as a subset.
    ///
    /// Intersects the per-item transaction-id sets starting from the smallest,
    /// so a rare item short-circuits the scan.
    pub fn support_count(&self, itemset: &Itemset) -> usize {
        let mut tidsets: Vec<&HashSet<usize>> = Vec::with_capacity(itemset.len());
        for item in itemset.items() {
            match self.tidsets.get(item) {
                Some(set) => tidsets.push(set),
                None => return 0,
            }
        }
        tidsets.sort_by_key(|set| set.len());
        let Some((smallest, rest)) = tidsets.split_first() else {
            return 0;
        };
        smallest
            .iter()
            .filter(|tid| rest.iter().all(|set| set.contains(tid)))
            .count()
    }

    /// Support fraction of `itemset` over all counted transactions.
    pub fn support(&self, itemset: &Itemset) -> f64 {
        if self.transactions.is_empty() {
            return 0.0;
        }
        self.support_count(itemset) as f64 / self.transactions.len() as f64
    }
}
