//! Frequent itemset mining and association rule derivation
//!
//! The levelwise pipeline: [`index::ItemsetIndex`] holds the transaction
//! snapshot, [`miner::mine`] drives the candidate/count/filter loop using
//! [`candidates`] and [`support`], and [`rules::generate_rules`] turns the
//! retained itemsets into ranked association rules.

pub mod candidates;
pub mod index;
pub mod itemset;
pub mod miner;
pub mod rules;
pub mod support;

pub use index::ItemsetIndex;
pub use itemset::{Itemset, Support};
pub use miner::{mine, FrequentItemsets};
pub use rules::{generate_rules, AssociationRule};
pub use support::count_supports;
