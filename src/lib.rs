//! BasketForge: market basket analysis and RFM customer segmentation
//!
//! This library mines frequent itemsets from retail transaction data with a
//! levelwise Apriori search, derives ranked association rules, and scores
//! customers into RFM segments for reporting.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod mining;
pub mod report;
pub mod rfm;

// Re-export public items for easier access
pub use cli::Args;
pub use config::{CountingStrategy, MiningConfig, RfmThresholds};
pub use error::AnalysisError;
pub use mining::{
    generate_rules, mine, AssociationRule, FrequentItemsets, Itemset, ItemsetIndex, Support,
};
pub use rfm::{score_customers, summarize_segments, CustomerMetrics, RfmScore, SegmentSummary};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
