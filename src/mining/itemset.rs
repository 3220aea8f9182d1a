//! Canonical itemset representation and memoized support records

use std::fmt;

/// A nonempty set of items held as a sorted, deduplicated vector.
///
/// The canonical ordering makes hashing, equality and comparison independent
/// of construction order, so the same itemset reached through different join
/// paths always collapses to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Itemset(Vec<String>);

impl Itemset {
    /// Build an itemset from arbitrary items, sorting and collapsing duplicates.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut items: Vec<String> = items.into_iter().collect();
        items.sort();
        items.dedup();
        Itemset(items)
    }

    /// Build from items already in canonical order.
    pub(crate) fn from_sorted(items: Vec<String>) -> Self {
        debug_assert!(items.windows(2).all(|w| w[0] < w[1]));
        Itemset(items)
    }

    pub fn items(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.binary_search_by(|probe| probe.as_str().cmp(item)).is_ok()
    }

    /// All subsets obtained by dropping exactly one item, used by the
    /// anti-monotone prune.
    pub fn drop_one_subsets(&self) -> impl Iterator<Item = Itemset> + '_ {
        (0..self.0.len()).map(move |skip| {
            let items = self
                .0
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, item)| item.clone())
                .collect();
            Itemset::from_sorted(items)
        })
    }

    /// Human-readable comma-joined form used in reports.
    pub fn label(&self) -> String {
        self.0.join(", ")
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

/// Support of an itemset, memoized once per itemset and reused by the rule
/// generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Support {
    /// Number of transactions containing the itemset
    pub count: usize,
    /// `count / total_transactions`
    pub support: f64,
}
