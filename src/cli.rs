//! Command-line interface definitions and argument parsing

use crate::config::{CountingStrategy, MiningConfig, RfmThresholds, DEFAULT_MAX_CANDIDATES};
use clap::Parser;

/// Market basket analysis and RFM customer segmentation over retail
/// transaction data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input transactions CSV file
    #[arg(short, long, default_value = "data.csv")]
    pub input: String,

    /// Optional product catalog CSV (ProductName,Category) for cross-category
    /// tagging
    #[arg(short, long)]
    pub categories: Option<String>,

    /// Output directory for generated reports
    #[arg(short, long, default_value = "output")]
    pub output: String,

    /// Minimum itemset support, fraction of transactions in (0, 1]
    #[arg(long, default_value = "0.01")]
    pub min_support: f64,

    /// Minimum rule confidence in (0, 1]
    #[arg(long, default_value = "0.3")]
    pub min_confidence: f64,

    /// Minimum rule lift
    #[arg(long, default_value = "1.2")]
    pub min_lift: f64,

    /// Maximum itemset length; 0 mines until convergence
    #[arg(long, default_value = "3")]
    pub max_length: usize,

    /// Abort a mining level whose candidate count exceeds this bound
    #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATES)]
    pub max_candidates: usize,

    /// Support counting strategy
    #[arg(long, value_enum, default_value_t = CountingStrategy::Vertical)]
    pub strategy: CountingStrategy,

    /// Reference date for recency calculation (RFC 3339); defaults to now
    #[arg(long)]
    pub end_date: Option<String>,

    /// Recency score day breaks as four ascending comma-separated values
    /// Example: --recency-breaks "30,90,180,365"
    #[arg(long, default_value = "30,90,180,365")]
    pub recency_breaks: String,

    /// Number of top rules shown on the console
    #[arg(long, default_value = "20")]
    pub top: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Mining configuration assembled from the thresholds flags.
    pub fn mining_config(&self) -> MiningConfig {
        MiningConfig {
            min_support: self.min_support,
            min_confidence: self.min_confidence,
            min_lift: self.min_lift,
            max_length: if self.max_length == 0 {
                None
            } else {
                Some(self.max_length)
            },
            max_candidates: self.max_candidates,
            strategy: self.strategy,
        }
    }

    /// Parse the recency break list.
    /// Expected format: "30,90,180,365"
    pub fn rfm_thresholds(&self) -> crate::Result<RfmThresholds> {
        let parts: Vec<&str> = self.recency_breaks.split(',').collect();
        if parts.len() != 4 {
            anyhow::bail!("recency breaks must be four comma-separated day counts");
        }

        let mut breaks = [0i64; 4];
        for (slot, part) in breaks.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid recency break: {}", part))?;
        }
        Ok(RfmThresholds {
            recency_breaks: breaks,
        })
    }
}
