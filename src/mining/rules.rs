//! Association rule derivation and ranking from mined frequent itemsets

use crate::config::{MiningConfig, SUPPORT_EPSILON};
use crate::error::AnalysisError;
use crate::mining::itemset::Itemset;
use crate::mining::miner::FrequentItemsets;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Largest frequent itemset whose antecedent/consequent splits are enumerated;
/// beyond this the 2^n split count is treated as a combinatorial overflow.
const MAX_RULE_ITEMS: usize = 32;

/// An association rule between two disjoint itemsets whose union is frequent.
/// Read-only once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    /// Support of antecedent and consequent together
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub antecedent_categories: BTreeSet<String>,
    pub consequent_categories: BTreeSet<String>,
    pub is_cross_category: bool,
}

/// Derive, filter and rank association rules.
///
/// Every frequent itemset of size >= 2 is split into all 2^n - 2 nonempty
/// antecedent/consequent pairs; confidence and lift come from the memoized
/// supports only. Retained rules are sorted by lift descending, then
/// confidence, then support, then canonical itemset order so repeated runs
/// emit an identical sequence.
pub fn generate_rules(
    frequent: &FrequentItemsets,
    catalog: &HashMap<String, String>,
    config: &MiningConfig,
) -> Result<Vec<AssociationRule>, AnalysisError> {
    config.validate()?;

    let splittable: Vec<&Itemset> = frequent
        .lengths()
        .filter(|&length| length >= 2)
        .flat_map(|length| frequent.at_length(length).iter())
        .collect();

    if let Some(oversized) = splittable.iter().find(|s| s.len() > MAX_RULE_ITEMS) {
        return Err(AnalysisError::CombinatorialOverflow {
            level: oversized.len(),
            candidates: usize::MAX, // 2^n splits, beyond representation
            limit: 1usize << MAX_RULE_ITEMS,
        });
    }

    let mut rules: Vec<AssociationRule> = splittable
        .into_par_iter()
        .map(|itemset| rules_for_itemset(itemset, frequent, catalog, config))
        .reduce(Vec::new, |mut merged, mut batch| {
            merged.append(&mut batch);
            merged
        });

    rules.sort_by(rank_rules);
    log::info!("generated {} association rule(s)", rules.len());
    Ok(rules)
}

/// All retained rules derivable from one frequent itemset.
fn rules_for_itemset(
    itemset: &Itemset,
    frequent: &FrequentItemsets,
    catalog: &HashMap<String, String>,
    config: &MiningConfig,
) -> Vec<AssociationRule> {
    let items = itemset.items();
    let n = items.len();
    let Some(whole) = frequent.support(itemset) else {
        debug_assert!(false, "itemset missing from its own support memo");
        return Vec::new();
    };

    let mut rules = Vec::new();
    // Masks 1..2^n-1 excluding the full mask: every nonempty proper subset
    for mask in 1u64..((1u64 << n) - 1) {
        let mut antecedent_items = Vec::new();
        let mut consequent_items = Vec::new();
        for (bit, item) in items.iter().enumerate() {
            if mask & (1u64 << bit) != 0 {
                antecedent_items.push(item.clone());
            } else {
                consequent_items.push(item.clone());
            }
        }
        let antecedent = Itemset::from_sorted(antecedent_items);
        let consequent = Itemset::from_sorted(consequent_items);

        // Subsets of a frequent itemset are frequent, so both lookups hit
        let (Some(antecedent_support), Some(consequent_support)) = (
            frequent.support(&antecedent),
            frequent.support(&consequent),
        ) else {
            debug_assert!(false, "subset of a frequent itemset missing a support record");
            continue;
        };

        let confidence = whole.support / antecedent_support.support;
        let lift = confidence / consequent_support.support;
        if confidence + SUPPORT_EPSILON < config.min_confidence {
            continue;
        }
        if lift + SUPPORT_EPSILON < config.min_lift {
            continue;
        }

        let antecedent_categories = categories_for(&antecedent, catalog);
        let consequent_categories = categories_for(&consequent, catalog);
        let is_cross_category = antecedent_categories != consequent_categories;

        rules.push(AssociationRule {
            antecedent,
            consequent,
            support: whole.support,
            confidence,
            lift,
            antecedent_categories,
            consequent_categories,
            is_cross_category,
        });
    }
    rules
}

/// Category labels of an itemset's items; items absent from the catalog
/// contribute nothing.
fn categories_for(itemset: &Itemset, catalog: &HashMap<String, String>) -> BTreeSet<String> {
    itemset
        .items()
        .iter()
        .filter_map(|item| catalog.get(item).cloned())
        .collect()
}

fn rank_rules(a: &AssociationRule, b: &AssociationRule) -> Ordering {
    b.lift
        .partial_cmp(&a.lift)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| b.support.partial_cmp(&a.support).unwrap_or(Ordering::Equal))
        .then_with(|| a.antecedent.cmp(&b.antecedent))
        .then_with(|| a.consequent.cmp(&b.consequent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::index::ItemsetIndex;
    use crate::mining::miner::mine;

    fn itemset(items: &[&str]) -> Itemset {
        Itemset::new(items.iter().map(|s| s.to_string()))
    }

    fn index_of(baskets: &[&[&str]]) -> ItemsetIndex {
        let mut pairs = Vec::new();
        for (tid, basket) in baskets.iter().enumerate() {
            for item in *basket {
                pairs.push((format!("t{tid}"), item.to_string()));
            }
        }
        ItemsetIndex::build(&pairs)
    }

    fn rule_config(min_support: f64, min_confidence: f64, min_lift: f64) -> MiningConfig {
        MiningConfig {
            min_support,
            min_confidence,
            min_lift,
            ..MiningConfig::default()
        }
    }

    #[test]
    fn test_rule_scenario() {
        // [{A,B}, {A,B,C}, {A,B}, {B,C}] at min_support 0.5, min_confidence 0.8
        let index = index_of(&[&["A", "B"], &["A", "B", "C"], &["A", "B"], &["B", "C"]]);
        let config = rule_config(0.5, 0.8, 0.0);
        let frequent = mine(&index, &config).unwrap();
        let rules = generate_rules(&frequent, &HashMap::new(), &config).unwrap();

        let a_to_b = rules
            .iter()
            .find(|r| r.antecedent == itemset(&["A"]) && r.consequent == itemset(&["B"]))
            .expect("rule A -> B must be retained");
        assert!((a_to_b.confidence - 1.0).abs() < 1e-9);
        assert!((a_to_b.lift - 1.0).abs() < 1e-9);
        assert!((a_to_b.support - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_identity_and_bounds() {
        let index = index_of(&[
            &["A", "B", "C"],
            &["A", "B"],
            &["B", "C"],
            &["A", "C"],
            &["A", "B", "C"],
        ]);
        let config = rule_config(0.2, 0.2, 0.0);
        let frequent = mine(&index, &config).unwrap();
        let rules = generate_rules(&frequent, &HashMap::new(), &config).unwrap();
        assert!(!rules.is_empty());

        for rule in &rules {
            let union = Itemset::new(
                rule.antecedent
                    .items()
                    .iter()
                    .chain(rule.consequent.items())
                    .cloned(),
            );
            let union_support = frequent.support(&union).unwrap().support;
            let antecedent_support = frequent.support(&rule.antecedent).unwrap().support;
            assert!((rule.confidence - union_support / antecedent_support).abs() < 1e-9);
            assert!(rule.confidence >= 0.0 && rule.confidence <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_all_splits_enumerated() {
        // One transaction repeated: {A,B,C} is frequent, all 2^3-2 = 6 splits
        let index = index_of(&[&["A", "B", "C"], &["A", "B", "C"]]);
        let config = rule_config(1.0, 0.01, 0.0);
        let frequent = mine(&index, &config).unwrap();
        let rules = generate_rules(&frequent, &HashMap::new(), &config).unwrap();

        let from_triple: Vec<&AssociationRule> = rules
            .iter()
            .filter(|r| r.antecedent.len() + r.consequent.len() == 3)
            .collect();
        assert_eq!(from_triple.len(), 6);
        // Multi-item consequents are part of the contract
        assert!(from_triple.iter().any(|r| r.consequent.len() == 2));
    }

    #[test]
    fn test_threshold_filtering() {
        let index = index_of(&[&["A", "B"], &["A", "B"], &["A"], &["B"]]);
        // confidence(A -> B) = 0.5/0.75 ~ 0.667
        let strict = rule_config(0.25, 0.7, 0.0);
        let frequent = mine(&index, &strict).unwrap();
        let rules = generate_rules(&frequent, &HashMap::new(), &strict).unwrap();
        assert!(rules
            .iter()
            .all(|r| !(r.antecedent == itemset(&["A"]) && r.consequent == itemset(&["B"]))));

        let loose = rule_config(0.25, 0.6, 0.0);
        let rules = generate_rules(&frequent, &HashMap::new(), &loose).unwrap();
        assert!(rules
            .iter()
            .any(|r| r.antecedent == itemset(&["A"]) && r.consequent == itemset(&["B"])));
    }

    #[test]
    fn test_rules_sorted_by_lift_then_confidence() {
        let index = index_of(&[
            &["A", "B"],
            &["A", "B"],
            &["A", "B", "C"],
            &["C", "D"],
            &["C", "D"],
            &["A", "D"],
        ]);
        let config = rule_config(0.1, 0.1, 0.0);
        let frequent = mine(&index, &config).unwrap();
        let rules = generate_rules(&frequent, &HashMap::new(), &config).unwrap();
        for pair in rules.windows(2) {
            assert!(
                pair[0].lift >= pair[1].lift - 1e-12,
                "rules out of lift order"
            );
            if (pair[0].lift - pair[1].lift).abs() < 1e-12 {
                assert!(pair[0].confidence >= pair[1].confidence - 1e-12);
            }
        }
    }

    #[test]
    fn test_cross_category_flag() {
        let mut catalog = HashMap::new();
        catalog.insert("Bread".to_string(), "Bakery".to_string());
        catalog.insert("Butter".to_string(), "Dairy".to_string());
        catalog.insert("Milk".to_string(), "Dairy".to_string());

        let index = index_of(&[
            &["Bread", "Butter"],
            &["Bread", "Butter"],
            &["Milk", "Butter"],
            &["Milk", "Butter"],
        ]);
        let config = rule_config(0.25, 0.1, 0.0);
        let frequent = mine(&index, &config).unwrap();
        let rules = generate_rules(&frequent, &catalog, &config).unwrap();

        let cross = rules
            .iter()
            .find(|r| r.antecedent == itemset(&["Bread"]) && r.consequent == itemset(&["Butter"]))
            .unwrap();
        assert!(cross.is_cross_category);
        assert!(cross.antecedent_categories.contains("Bakery"));

        let same = rules
            .iter()
            .find(|r| r.antecedent == itemset(&["Milk"]) && r.consequent == itemset(&["Butter"]))
            .unwrap();
        assert!(!same.is_cross_category);
    }

    #[test]
    fn test_unknown_items_have_no_categories() {
        let index = index_of(&[&["A", "B"], &["A", "B"]]);
        let config = rule_config(0.5, 0.1, 0.0);
        let frequent = mine(&index, &config).unwrap();
        let rules = generate_rules(&frequent, &HashMap::new(), &config).unwrap();
        assert!(!rules.is_empty());
        for rule in &rules {
            assert!(rule.antecedent_categories.is_empty());
            assert!(rule.consequent_categories.is_empty());
            assert!(!rule.is_cross_category);
        }
    }

    #[test]
    fn test_no_rules_from_empty_mining_result() {
        let index = index_of(&[&["A"], &["B"]]);
        let config = rule_config(0.9, 0.3, 0.0);
        let frequent = mine(&index, &config).unwrap();
        assert!(frequent.is_empty());
        let rules = generate_rules(&frequent, &HashMap::new(), &config).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_idempotent_rule_order() {
        let index = index_of(&[
            &["A", "B", "C"],
            &["A", "B"],
            &["B", "C"],
            &["A", "C"],
            &["A", "B", "C"],
        ]);
        let config = rule_config(0.2, 0.2, 0.0);
        let frequent = mine(&index, &config).unwrap();
        let first = generate_rules(&frequent, &HashMap::new(), &config).unwrap();
        let second = generate_rules(&frequent, &HashMap::new(), &config).unwrap();
        assert_eq!(first, second);
    }
}
