//! Error types for the analysis core

use thiserror::Error;

/// Failures produced by the mining core and the RFM scorer.
///
/// A run that finds no frequent itemsets is not an error: `mine` returns an
/// empty [`crate::mining::FrequentItemsets`] and callers distinguish it via
/// `is_empty()`.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No usable transactions or customers to analyze
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    /// A threshold or limit is outside its declared range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Candidate volume exceeded the configured safety bound
    #[error("combinatorial overflow at level {level}: {candidates} candidates exceed limit {limit}")]
    CombinatorialOverflow {
        level: usize,
        candidates: usize,
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::InvalidConfig("min_support must be in (0, 1]".to_string());
        assert!(err.to_string().contains("min_support"));

        let err = AnalysisError::CombinatorialOverflow {
            level: 3,
            candidates: 200_000,
            limit: 100_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("level 3"));
        assert!(msg.contains("200000"));
    }
}
