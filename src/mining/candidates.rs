//! Apriori candidate generation: join frequent k-itemsets, prune by subsets

use crate::mining::index::ItemsetIndex;
use crate::mining::itemset::Itemset;
use std::collections::HashSet;

/// Level-1 candidates: one singleton per item in the observed vocabulary.
pub fn seed_candidates(index: &ItemsetIndex) -> Vec<Itemset> {
    index
        .vocabulary()
        .into_iter()
        .map(|item| Itemset::from_sorted(vec![item]))
        .collect()
}

/// Size-(k+1) candidates from the frequent size-k itemsets.
///
/// Two itemsets join only when they share the first k-1 items in canonical
/// order and differ in the last. A joined candidate survives only if every one
/// of its size-k subsets is itself frequent: support never grows when items
/// are added, so a single infrequent subset certifies the candidate as
/// infrequent. `frequent` must be sorted in canonical order.
pub fn generate_candidates(frequent: &[Itemset], k: usize) -> Vec<Itemset> {
    debug_assert!(k >= 1);
    debug_assert!(frequent.windows(2).all(|w| w[0] < w[1]));

    let frequent_set: HashSet<&Itemset> = frequent.iter().collect();
    let mut candidates: Vec<Itemset> = Vec::new();

    for (i, left) in frequent.iter().enumerate() {
        for right in &frequent[i + 1..] {
            let left_items = left.items();
            let right_items = right.items();
            // Sorted input: once the shared prefix breaks, no later partner matches
            if left_items[..k - 1] != right_items[..k - 1] {
                break;
            }

            let mut joined = left_items.to_vec();
            joined.push(right_items[k - 1].clone());
            let candidate = Itemset::from_sorted(joined);

            let all_subsets_frequent = candidate
                .drop_one_subsets()
                .all(|subset| frequent_set.contains(&subset));
            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }

    candidates.sort();
    candidates.dedup();
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn itemset(items: &[&str]) -> Itemset {
        Itemset::new(items.iter().map(|s| s.to_string()))
    }

    fn itemsets(sets: &[&[&str]]) -> Vec<Itemset> {
        let mut out: Vec<Itemset> = sets.iter().map(|s| itemset(s)).collect();
        out.sort();
        out
    }

    #[test]
    fn test_seed_candidates_cover_vocabulary() {
        let pairs: Vec<(String, String)> = vec![
            ("t1".to_string(), "B".to_string()),
            ("t1".to_string(), "A".to_string()),
            ("t2".to_string(), "C".to_string()),
        ];
        let index = ItemsetIndex::build(&pairs);
        let seeds = seed_candidates(&index);
        assert_eq!(seeds, itemsets(&[&["A"], &["B"], &["C"]]));
    }

    #[test]
    fn test_join_pairs_from_singletons() {
        let frequent = itemsets(&[&["A"], &["B"], &["C"]]);
        let candidates = generate_candidates(&frequent, 1);
        assert_eq!(
            candidates,
            itemsets(&[&["A", "B"], &["A", "C"], &["B", "C"]])
        );
    }

    #[test]
    fn test_join_requires_shared_prefix() {
        let frequent = itemsets(&[&["A", "B"], &["A", "C"], &["B", "C"]]);
        let candidates = generate_candidates(&frequent, 2);
        // {A,B} + {A,C} join to {A,B,C}; every 2-subset is frequent
        assert_eq!(candidates, itemsets(&[&["A", "B", "C"]]));
    }

    #[test]
    fn test_prune_discards_candidates_with_infrequent_subset() {
        // {B,C} missing, so {A,B,C} must be pruned
        let frequent = itemsets(&[&["A", "B"], &["A", "C"]]);
        let candidates = generate_candidates(&frequent, 2);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_no_join_without_common_prefix() {
        let frequent = itemsets(&[&["A", "B"], &["C", "D"]]);
        let candidates = generate_candidates(&frequent, 2);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_candidates_are_unique_and_sorted() {
        let frequent = itemsets(&[&["A"], &["B"], &["C"], &["D"]]);
        let candidates = generate_candidates(&frequent, 1);
        assert_eq!(candidates.len(), 6);
        let mut sorted = candidates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(candidates, sorted);
    }
}
