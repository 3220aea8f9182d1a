//! RFM scoring and customer segmentation
//!
//! Recency is scored against fixed day thresholds; frequency and monetary
//! scores come from equal-frequency quintile binning over the customer
//! population. Segments are assigned by an ordered decision table evaluated
//! top to bottom; the first matching predicate wins, and the table order is
//! part of the contract.

use crate::config::RfmThresholds;
use crate::error::AnalysisError;
use std::collections::BTreeMap;

/// One customer's behavioral metrics, as delivered by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerMetrics {
    pub customer_id: i64,
    pub days_since_last_purchase: i64,
    pub total_orders: u64,
    pub total_revenue: f64,
}

/// Ordinal R/F/M scores and the assigned segment for one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct RfmScore {
    pub customer_id: i64,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub segment: &'static str,
}

impl RfmScore {
    /// Combined "RFM" digit string, e.g. "555".
    pub fn combined(&self) -> String {
        format!("{}{}{}", self.r_score, self.f_score, self.m_score)
    }
}

type SegmentPredicate = fn(u8, u8, u8) -> bool;

/// Segment decision table, evaluated top to bottom, first match wins.
///
/// The order is load-bearing: several predicates overlap (a "Can't Lose Them"
/// triple also satisfies "Loyal Customers" and "About To Sleep" higher up),
/// and precedence is defined purely by position in this table.
const SEGMENT_TABLE: &[(SegmentPredicate, &str)] = &[
    (|r, f, m| r >= 4 && f >= 4 && m >= 4, "Champions"),
    (|_, f, m| f >= 4 && m >= 4, "Loyal Customers"),
    (|r, f, _| r >= 4 && f >= 3, "Potential Loyalist"),
    (|r, f, _| r >= 4 && f <= 2, "Recent Users"),
    (|r, _, m| r >= 3 && m >= 3, "Promising"),
    (|r, f, m| r >= 3 && f >= 2 && m >= 2, "Needs Attention"),
    (|r, f, _| r <= 2 && f >= 2, "About To Sleep"),
    (|r, f, m| r <= 2 && f >= 4 && m >= 4, "Can't Lose Them"),
    (|r, f, m| r <= 2 && f <= 2 && m >= 2, "Hibernating"),
    (|_, _, m| m <= 2, "Price Sensitive"),
    (|r, f, _| r == 1 && f <= 2, "Lost"),
];

const FALLBACK_SEGMENT: &str = "Other";

/// Score every customer and assign a segment.
///
/// # Errors
/// * `InvalidConfig` when the recency breaks are malformed
/// * `EmptyDataset` when there are no customers to bin
pub fn score_customers(
    customers: &[CustomerMetrics],
    thresholds: &RfmThresholds,
) -> Result<Vec<RfmScore>, AnalysisError> {
    thresholds.validate()?;
    if customers.is_empty() {
        return Err(AnalysisError::EmptyDataset(
            "no customers to score".to_string(),
        ));
    }

    let order_edges = quintile_edges(customers.iter().map(|c| c.total_orders as f64));
    let revenue_edges = quintile_edges(customers.iter().map(|c| c.total_revenue));

    let scores = customers
        .iter()
        .map(|customer| {
            let r_score = recency_score(customer.days_since_last_purchase, thresholds);
            let f_score = quintile_score(customer.total_orders as f64, &order_edges);
            let m_score = quintile_score(customer.total_revenue, &revenue_edges);
            RfmScore {
                customer_id: customer.customer_id,
                r_score,
                f_score,
                m_score,
                segment: assign_segment(r_score, f_score, m_score),
            }
        })
        .collect();
    log::info!("scored {} customer(s)", customers.len());
    Ok(scores)
}

/// Recency score 5..1: the fewer days elapsed, the higher the score.
fn recency_score(days: i64, thresholds: &RfmThresholds) -> u8 {
    let above = thresholds
        .recency_breaks
        .iter()
        .filter(|&&bound| days > bound)
        .count();
    5 - above as u8
}

/// Quintile edges at the 20/40/60/80 percent marks, linearly interpolated,
/// deduplicated. Collapsed edges mean fewer effective bins, never a failure.
fn quintile_edges<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted: Vec<f64> = values.into_iter().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut edges: Vec<f64> = [0.2, 0.4, 0.6, 0.8]
        .iter()
        .map(|&q| interpolated_quantile(&sorted, q))
        .collect();
    edges.dedup();
    edges
}

fn interpolated_quantile(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Score 1..=5: one more than the number of distinct edges strictly below the
/// value, so equal boundary values share a bin.
fn quintile_score(value: f64, edges: &[f64]) -> u8 {
    1 + edges.iter().filter(|&&edge| value > edge).count() as u8
}

/// First matching row of the decision table, or the fallback.
pub fn assign_segment(r: u8, f: u8, m: u8) -> &'static str {
    SEGMENT_TABLE
        .iter()
        .find(|(predicate, _)| predicate(r, f, m))
        .map(|(_, label)| *label)
        .unwrap_or(FALLBACK_SEGMENT)
}

/// Per-segment aggregates for the summary report, sorted by total revenue
/// descending.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    pub segment: String,
    pub customer_count: usize,
    pub total_revenue: f64,
    pub avg_revenue: f64,
    pub avg_orders: f64,
    pub avg_recency_days: f64,
    pub avg_order_value: f64,
    pub pct_of_customers: f64,
    pub pct_of_revenue: f64,
}

/// Aggregate scored customers by segment.
///
/// `metrics` and `scores` must be parallel slices as produced by
/// [`score_customers`].
pub fn summarize_segments(
    metrics: &[CustomerMetrics],
    scores: &[RfmScore],
) -> Vec<SegmentSummary> {
    debug_assert_eq!(metrics.len(), scores.len());

    struct Accumulator {
        customers: usize,
        revenue: f64,
        orders: u64,
        recency_days: i64,
        order_value: f64,
    }

    let mut by_segment: BTreeMap<&'static str, Accumulator> = BTreeMap::new();
    for (metric, score) in metrics.iter().zip(scores) {
        let entry = by_segment.entry(score.segment).or_insert(Accumulator {
            customers: 0,
            revenue: 0.0,
            orders: 0,
            recency_days: 0,
            order_value: 0.0,
        });
        entry.customers += 1;
        entry.revenue += metric.total_revenue;
        entry.orders += metric.total_orders;
        entry.recency_days += metric.days_since_last_purchase;
        if metric.total_orders > 0 {
            entry.order_value += metric.total_revenue / metric.total_orders as f64;
        }
    }

    let total_customers: usize = metrics.len();
    let total_revenue: f64 = metrics.iter().map(|m| m.total_revenue).sum();

    let mut summaries: Vec<SegmentSummary> = by_segment
        .into_iter()
        .map(|(segment, acc)| {
            let n = acc.customers as f64;
            SegmentSummary {
                segment: segment.to_string(),
                customer_count: acc.customers,
                total_revenue: acc.revenue,
                avg_revenue: acc.revenue / n,
                avg_orders: acc.orders as f64 / n,
                avg_recency_days: acc.recency_days as f64 / n,
                avg_order_value: acc.order_value / n,
                pct_of_customers: acc.customers as f64 / total_customers as f64 * 100.0,
                pct_of_revenue: if total_revenue > 0.0 {
                    acc.revenue / total_revenue * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.total_revenue
            .partial_cmp(&a.total_revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.segment.cmp(&b.segment))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: i64, days: i64, orders: u64, revenue: f64) -> CustomerMetrics {
        CustomerMetrics {
            customer_id: id,
            days_since_last_purchase: days,
            total_orders: orders,
            total_revenue: revenue,
        }
    }

    /// Five customers spanning the full quintile range.
    fn spread_population() -> Vec<CustomerMetrics> {
        vec![
            customer(1, 400, 1, 50.0),
            customer(2, 200, 3, 300.0),
            customer(3, 100, 5, 800.0),
            customer(4, 45, 8, 2500.0),
            customer(5, 10, 12, 6000.0),
        ]
    }

    #[test]
    fn test_recency_score_buckets() {
        let thresholds = RfmThresholds::default();
        assert_eq!(recency_score(0, &thresholds), 5);
        assert_eq!(recency_score(30, &thresholds), 5);
        assert_eq!(recency_score(31, &thresholds), 4);
        assert_eq!(recency_score(90, &thresholds), 4);
        assert_eq!(recency_score(180, &thresholds), 3);
        assert_eq!(recency_score(365, &thresholds), 2);
        assert_eq!(recency_score(366, &thresholds), 1);
        assert_eq!(recency_score(10_000, &thresholds), 1);
    }

    #[test]
    fn test_top_quintile_customer_is_champion() {
        let scores = score_customers(&spread_population(), &RfmThresholds::default()).unwrap();
        let top = scores.iter().find(|s| s.customer_id == 5).unwrap();
        assert_eq!(top.r_score, 5);
        assert_eq!(top.f_score, 5);
        assert_eq!(top.m_score, 5);
        assert_eq!(top.segment, "Champions");
        assert_eq!(top.combined(), "555");
    }

    #[test]
    fn test_bottom_customer_scores_low() {
        let scores = score_customers(&spread_population(), &RfmThresholds::default()).unwrap();
        let bottom = scores.iter().find(|s| s.customer_id == 1).unwrap();
        assert_eq!(bottom.r_score, 1);
        assert_eq!(bottom.f_score, 1);
        assert_eq!(bottom.m_score, 1);
    }

    #[test]
    fn test_duplicate_values_share_a_bin() {
        let customers: Vec<CustomerMetrics> =
            (0..6).map(|i| customer(i, 10, 3, 100.0)).collect();
        let scores = score_customers(&customers, &RfmThresholds::default()).unwrap();
        let f_scores: Vec<u8> = scores.iter().map(|s| s.f_score).collect();
        let m_scores: Vec<u8> = scores.iter().map(|s| s.m_score).collect();
        // All identical values collapse every quantile edge into one bin
        assert!(f_scores.iter().all(|&s| s == f_scores[0]));
        assert!(m_scores.iter().all(|&s| s == m_scores[0]));
    }

    #[test]
    fn test_empty_population_is_an_error() {
        let err = score_customers(&[], &RfmThresholds::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset(_)));
    }

    #[test]
    fn test_segment_table_order_is_preserved() {
        // Loyal Customers only wins when the Champions arm fails on recency
        assert_eq!(assign_segment(5, 5, 5), "Champions");
        assert_eq!(assign_segment(3, 5, 5), "Loyal Customers");
        assert_eq!(assign_segment(5, 3, 2), "Potential Loyalist");
        assert_eq!(assign_segment(5, 1, 1), "Recent Users");
        assert_eq!(assign_segment(3, 1, 3), "Promising");
        assert_eq!(assign_segment(3, 2, 2), "Needs Attention");
        // Loyal Customers shadows Can't Lose Them for r<=2, f>=4, m>=4
        assert_eq!(assign_segment(2, 5, 5), "Loyal Customers");
        assert_eq!(assign_segment(2, 3, 1), "About To Sleep");
        assert_eq!(assign_segment(1, 1, 3), "Hibernating");
        assert_eq!(assign_segment(3, 1, 2), "Price Sensitive");
        assert_eq!(assign_segment(1, 1, 1), "Price Sensitive");
    }

    #[test]
    fn test_summary_percentages_and_order() {
        let metrics = spread_population();
        let scores = score_customers(&metrics, &RfmThresholds::default()).unwrap();
        let summaries = summarize_segments(&metrics, &scores);

        let customer_total: usize = summaries.iter().map(|s| s.customer_count).sum();
        assert_eq!(customer_total, metrics.len());

        let pct_total: f64 = summaries.iter().map(|s| s.pct_of_customers).sum();
        assert!((pct_total - 100.0).abs() < 1e-6);

        for pair in summaries.windows(2) {
            assert!(pair[0].total_revenue >= pair[1].total_revenue);
        }
    }
}
