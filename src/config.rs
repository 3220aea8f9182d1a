//! Immutable analysis configuration passed explicitly into every component

use crate::error::AnalysisError;
use clap::ValueEnum;

/// Tolerance applied to every support/confidence/lift threshold comparison so
/// values sitting exactly on a threshold are not dropped by floating-point
/// rounding.
pub const SUPPORT_EPSILON: f64 = 1e-9;

/// Default ceiling on the candidate volume of a single mining level.
pub const DEFAULT_MAX_CANDIDATES: usize = 100_000;

/// Support counting strategy, interchangeable for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CountingStrategy {
    /// Intersect per-item transaction-id sets for each candidate
    #[default]
    Vertical,
    /// Scan each transaction once, testing subset membership for all candidates
    Horizontal,
}

/// Thresholds and limits for frequent itemset mining and rule generation.
#[derive(Debug, Clone)]
pub struct MiningConfig {
    /// Minimum fraction of transactions an itemset must appear in, in (0, 1]
    pub min_support: f64,
    /// Minimum rule confidence, in (0, 1]
    pub min_confidence: f64,
    /// Minimum rule lift, >= 0
    pub min_lift: f64,
    /// Largest itemset size to mine; `None` runs until convergence
    pub max_length: Option<usize>,
    /// Ceiling on candidates per level before the run is aborted
    pub max_candidates: usize,
    pub strategy: CountingStrategy,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            min_confidence: 0.3,
            min_lift: 1.2,
            max_length: None,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            strategy: CountingStrategy::Vertical,
        }
    }
}

impl MiningConfig {
    /// Check every threshold against its declared range.
    ///
    /// Called by the miner before any counting begins so a bad configuration
    /// fails the run without partial state.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_support must be in (0, 1], got {}",
                self.min_support
            )));
        }
        if !(self.min_confidence > 0.0 && self.min_confidence <= 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_confidence must be in (0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.min_lift < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_lift must be >= 0, got {}",
                self.min_lift
            )));
        }
        if let Some(max_length) = self.max_length {
            if max_length < 1 {
                return Err(AnalysisError::InvalidConfig(
                    "max_length must be >= 1".to_string(),
                ));
            }
        }
        if self.max_candidates < 1 {
            return Err(AnalysisError::InvalidConfig(
                "max_candidates must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Day thresholds for the recency score.
///
/// `recency_breaks` are the upper day bounds for scores 5 down to 2; anything
/// beyond the last break scores 1.
#[derive(Debug, Clone)]
pub struct RfmThresholds {
    pub recency_breaks: [i64; 4],
}

impl Default for RfmThresholds {
    fn default() -> Self {
        Self {
            recency_breaks: [30, 90, 180, 365],
        }
    }
}

impl RfmThresholds {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.recency_breaks[0] <= 0 {
            return Err(AnalysisError::InvalidConfig(
                "recency breaks must be positive".to_string(),
            ));
        }
        if !self.recency_breaks.windows(2).all(|w| w[0] < w[1]) {
            return Err(AnalysisError::InvalidConfig(format!(
                "recency breaks must be strictly ascending, got {:?}",
                self.recency_breaks
            )));
        }
        Ok(())
    }
}
