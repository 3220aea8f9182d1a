//! Report generation: CSV exports, the combined insights report and console
//! summaries

use crate::mining::miner::FrequentItemsets;
use crate::mining::rules::AssociationRule;
use crate::rfm::{CustomerMetrics, RfmScore, SegmentSummary};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Output layout: CSV tables under `data/`, text reports under `reports/`.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl ReportPaths {
    /// Create the output directory tree under `base`.
    pub fn create(base: &Path) -> crate::Result<Self> {
        let data_dir = base.join("data");
        let reports_dir = base.join("reports");
        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(&reports_dir)?;
        Ok(ReportPaths {
            data_dir,
            reports_dir,
        })
    }

    pub fn rules_csv(&self) -> PathBuf {
        self.data_dir.join("market_basket_rules.csv")
    }

    pub fn itemsets_csv(&self) -> PathBuf {
        self.data_dir.join("frequent_itemsets.csv")
    }

    pub fn rfm_csv(&self) -> PathBuf {
        self.data_dir.join("rfm_segmentation.csv")
    }

    pub fn rfm_summary_csv(&self) -> PathBuf {
        self.data_dir.join("rfm_summary.csv")
    }

    pub fn insights_report(&self) -> PathBuf {
        self.reports_dir.join("insights_report.txt")
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn join_categories(categories: &std::collections::BTreeSet<String>) -> String {
    categories
        .iter()
        .cloned()
        .collect::<Vec<String>>()
        .join(", ")
}

#[derive(Debug, Serialize)]
struct RuleRecord {
    #[serde(rename = "If_Customer_Buys")]
    antecedent: String,
    #[serde(rename = "Then_Also_Buys")]
    consequent: String,
    #[serde(rename = "Support_%")]
    support_pct: f64,
    #[serde(rename = "Confidence_%")]
    confidence_pct: f64,
    #[serde(rename = "Lift")]
    lift: f64,
    #[serde(rename = "Antecedent_Category")]
    antecedent_category: String,
    #[serde(rename = "Consequent_Category")]
    consequent_category: String,
    #[serde(rename = "Cross_Category")]
    cross_category: bool,
}

impl RuleRecord {
    fn from_rule(rule: &AssociationRule) -> Self {
        RuleRecord {
            antecedent: rule.antecedent.label(),
            consequent: rule.consequent.label(),
            support_pct: round2(rule.support * 100.0),
            confidence_pct: round2(rule.confidence * 100.0),
            lift: round2(rule.lift),
            antecedent_category: join_categories(&rule.antecedent_categories),
            consequent_category: join_categories(&rule.consequent_categories),
            cross_category: rule.is_cross_category,
        }
    }
}

/// Write ranked rules to `market_basket_rules.csv`.
pub fn write_rules_csv(rules: &[AssociationRule], path: &Path) -> crate::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for rule in rules {
        writer.serialize(RuleRecord::from_rule(rule))?;
    }
    writer.flush()?;
    log::info!("market basket rules saved to: {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct ItemsetRecord {
    support: f64,
    itemsets: String,
    length: usize,
}

/// Write all frequent itemsets to `frequent_itemsets.csv`.
pub fn write_itemsets_csv(frequent: &FrequentItemsets, path: &Path) -> crate::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (itemset, support) in frequent.iter() {
        writer.serialize(ItemsetRecord {
            support: support.support,
            itemsets: itemset.label(),
            length: itemset.len(),
        })?;
    }
    writer.flush()?;
    log::info!("frequent itemsets saved to: {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct RfmRecord {
    #[serde(rename = "CustomerID")]
    customer_id: i64,
    #[serde(rename = "DaysSinceLastPurchase")]
    days_since_last_purchase: i64,
    #[serde(rename = "TotalOrders")]
    total_orders: u64,
    #[serde(rename = "TotalRevenue")]
    total_revenue: f64,
    #[serde(rename = "R_Score")]
    r_score: u8,
    #[serde(rename = "F_Score")]
    f_score: u8,
    #[serde(rename = "M_Score")]
    m_score: u8,
    #[serde(rename = "RFM_Score")]
    rfm_score: String,
    #[serde(rename = "Segment")]
    segment: String,
}

/// Write scored customers to `rfm_segmentation.csv`, highest revenue first.
///
/// `metrics` and `scores` must be parallel slices.
pub fn write_rfm_csv(
    metrics: &[CustomerMetrics],
    scores: &[RfmScore],
    path: &Path,
) -> crate::Result<()> {
    let mut rows: Vec<(&CustomerMetrics, &RfmScore)> = metrics.iter().zip(scores).collect();
    rows.sort_by(|a, b| {
        b.0.total_revenue
            .partial_cmp(&a.0.total_revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.customer_id.cmp(&b.0.customer_id))
    });

    let mut writer = csv::Writer::from_path(path)?;
    for (metric, score) in rows {
        writer.serialize(RfmRecord {
            customer_id: metric.customer_id,
            days_since_last_purchase: metric.days_since_last_purchase,
            total_orders: metric.total_orders,
            total_revenue: round2(metric.total_revenue),
            r_score: score.r_score,
            f_score: score.f_score,
            m_score: score.m_score,
            rfm_score: score.combined(),
            segment: score.segment.to_string(),
        })?;
    }
    writer.flush()?;
    log::info!("RFM segmentation saved to: {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct SegmentSummaryRecord {
    #[serde(rename = "Segment")]
    segment: String,
    #[serde(rename = "Customer_Count")]
    customer_count: usize,
    #[serde(rename = "Total_Revenue")]
    total_revenue: f64,
    #[serde(rename = "Avg_Revenue_Per_Customer")]
    avg_revenue: f64,
    #[serde(rename = "Avg_Orders")]
    avg_orders: f64,
    #[serde(rename = "Avg_Days_Since_Purchase")]
    avg_recency_days: f64,
    #[serde(rename = "Avg_Order_Value")]
    avg_order_value: f64,
    #[serde(rename = "Percentage_of_Customers")]
    pct_of_customers: f64,
    #[serde(rename = "Percentage_of_Revenue")]
    pct_of_revenue: f64,
}

/// Write the per-segment summary to `rfm_summary.csv`.
pub fn write_segment_summary_csv(
    summaries: &[SegmentSummary],
    path: &Path,
) -> crate::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for summary in summaries {
        writer.serialize(SegmentSummaryRecord {
            segment: summary.segment.clone(),
            customer_count: summary.customer_count,
            total_revenue: round2(summary.total_revenue),
            avg_revenue: round2(summary.avg_revenue),
            avg_orders: round2(summary.avg_orders),
            avg_recency_days: round2(summary.avg_recency_days),
            avg_order_value: round2(summary.avg_order_value),
            pct_of_customers: round2(summary.pct_of_customers),
            pct_of_revenue: round2(summary.pct_of_revenue),
        })?;
    }
    writer.flush()?;
    log::info!("RFM summary saved to: {}", path.display());
    Ok(())
}

/// Write the combined text insights report.
pub fn write_insights_report(
    summaries: &[SegmentSummary],
    rules: &[AssociationRule],
    path: &Path,
) -> crate::Result<()> {
    let mut file = fs::File::create(path)?;
    let line = "=".repeat(80);
    let thin = "-".repeat(80);

    writeln!(file, "{line}")?;
    writeln!(file, "ACTIONABLE INSIGHTS REPORT")?;
    writeln!(file, "Customer Segmentation & Market Basket Analysis")?;
    writeln!(file, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file, "{line}\n")?;

    writeln!(file, "1. CUSTOMER SEGMENTATION (RFM Analysis)")?;
    writeln!(file, "{thin}\n")?;
    writeln!(
        file,
        "{:<20} {:>10} {:>14} {:>10} {:>10}",
        "Segment", "Customers", "Revenue", "Cust_%", "Rev_%"
    )?;
    for summary in summaries {
        writeln!(
            file,
            "{:<20} {:>10} {:>14.2} {:>10.2} {:>10.2}",
            summary.segment,
            summary.customer_count,
            summary.total_revenue,
            summary.pct_of_customers,
            summary.pct_of_revenue
        )?;
    }
    writeln!(file)?;

    writeln!(file, "KEY INSIGHTS:")?;
    writeln!(file, "{thin}")?;
    if let Some(champions) = summaries.iter().find(|s| s.segment == "Champions") {
        writeln!(
            file,
            "• Champions represent {:.2}% of customers but contribute {:.2}% of revenue",
            champions.pct_of_customers, champions.pct_of_revenue
        )?;
    }
    let at_risk: usize = summaries
        .iter()
        .filter(|s| matches!(s.segment.as_str(), "Can't Lose Them" | "About To Sleep"))
        .map(|s| s.customer_count)
        .sum();
    if at_risk > 0 {
        writeln!(
            file,
            "• {at_risk} customers are at risk of churning - immediate retention efforts needed"
        )?;
    }
    writeln!(file, "\n")?;

    writeln!(file, "2. PRODUCT RECOMMENDATIONS (Market Basket Analysis)")?;
    writeln!(file, "{thin}\n")?;
    if rules.is_empty() {
        writeln!(file, "No association rules met the configured thresholds.")?;
    } else {
        writeln!(file, "Top 10 Product Association Rules:\n")?;
        for rule in rules.iter().take(10) {
            writeln!(
                file,
                "  [{}] => [{}]  support {:.2}%  confidence {:.2}%  lift {:.2}",
                rule.antecedent.label(),
                rule.consequent.label(),
                rule.support * 100.0,
                rule.confidence * 100.0,
                rule.lift
            )?;
        }
        let cross: Vec<&AssociationRule> =
            rules.iter().filter(|r| r.is_cross_category).collect();
        if !cross.is_empty() {
            writeln!(file, "\nCross-Category Opportunities:\n")?;
            for rule in cross.iter().take(5) {
                writeln!(
                    file,
                    "  [{}] => [{}]  lift {:.2}",
                    rule.antecedent.label(),
                    rule.consequent.label(),
                    rule.lift
                )?;
            }
        }
    }
    writeln!(file, "\n")?;

    writeln!(file, "3. RECOMMENDED ACTIONS")?;
    writeln!(file, "{thin}")?;
    writeln!(file, "• CHAMPIONS: Reward with exclusive offers, VIP programs, early access to new products")?;
    writeln!(file, "• LOYAL CUSTOMERS: Upsell premium products, request referrals and reviews")?;
    writeln!(file, "• AT RISK: Send personalized win-back campaigns with special discounts")?;
    writeln!(file, "• HIBERNATING: Re-engagement campaigns with strong incentives")?;
    writeln!(file, "• RECENT USERS: Onboarding sequences, product recommendations")?;
    writeln!(file, "• CROSS-SELL: Implement product recommendations based on association rules")?;
    writeln!(file, "{line}")?;

    log::info!("insights report saved to: {}", path.display());
    Ok(())
}

/// Print the top rules as a console table.
pub fn print_rule_table(rules: &[AssociationRule], top: usize) {
    let line = "=".repeat(120);
    println!("\n{line}");
    println!("TOP {} ASSOCIATION RULES (Ordered by Lift)", top.min(rules.len()));
    println!("{line}");
    println!(
        "{:<40} {:<30} {:>9} {:>12} {:>6}  {:<5}",
        "If_Customer_Buys", "Then_Also_Buys", "Support_%", "Confidence_%", "Lift", "Cross"
    );
    for rule in rules.iter().take(top) {
        println!(
            "{:<40} {:<30} {:>9.2} {:>12.2} {:>6.2}  {:<5}",
            rule.antecedent.label(),
            rule.consequent.label(),
            rule.support * 100.0,
            rule.confidence * 100.0,
            rule.lift,
            rule.is_cross_category
        );
    }
    println!("{line}");
}

/// Print the per-segment summary table.
pub fn print_segment_summary(summaries: &[SegmentSummary]) {
    let line = "=".repeat(80);
    println!("\n{line}");
    println!("RFM SEGMENTATION SUMMARY");
    println!("{line}");
    println!(
        "{:<20} {:>10} {:>14} {:>10} {:>10}",
        "Segment", "Customers", "Revenue", "Cust_%", "Rev_%"
    );
    for summary in summaries {
        println!(
            "{:<20} {:>10} {:>14.2} {:>10.2} {:>10.2}",
            summary.segment,
            summary.customer_count,
            summary.total_revenue,
            summary.pct_of_customers,
            summary.pct_of_revenue
        );
    }
    println!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MiningConfig;
    use crate::mining::index::ItemsetIndex;
    use crate::mining::miner::mine;
    use crate::mining::rules::generate_rules;
    use crate::rfm::{score_customers, summarize_segments};
    use crate::config::RfmThresholds;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sample_rules() -> (FrequentItemsets, Vec<AssociationRule>) {
        let pairs: Vec<(String, String)> = [
            ("t1", "Bread"),
            ("t1", "Butter"),
            ("t2", "Bread"),
            ("t2", "Butter"),
            ("t3", "Bread"),
            ("t4", "Milk"),
        ]
        .iter()
        .map(|(t, i)| (t.to_string(), i.to_string()))
        .collect();
        let index = ItemsetIndex::build(&pairs);
        let config = MiningConfig {
            min_support: 0.25,
            min_confidence: 0.5,
            min_lift: 0.0,
            ..MiningConfig::default()
        };
        let frequent = mine(&index, &config).unwrap();
        let rules = generate_rules(&frequent, &HashMap::new(), &config).unwrap();
        (frequent, rules)
    }

    fn sample_customers() -> Vec<CustomerMetrics> {
        (1..=5)
            .map(|i| CustomerMetrics {
                customer_id: i,
                days_since_last_purchase: i * 50,
                total_orders: i as u64 * 2,
                total_revenue: i as f64 * 500.0,
            })
            .collect()
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.6666), 0.67);
        assert_eq!(round2(75.0), 75.0);
    }

    #[test]
    fn test_write_rules_and_itemsets_csv() {
        let (frequent, rules) = sample_rules();
        let dir = tempdir().unwrap();
        let paths = ReportPaths::create(dir.path()).unwrap();

        write_rules_csv(&rules, &paths.rules_csv()).unwrap();
        write_itemsets_csv(&frequent, &paths.itemsets_csv()).unwrap();

        let rules_out = fs::read_to_string(paths.rules_csv()).unwrap();
        assert!(rules_out.starts_with("If_Customer_Buys,Then_Also_Buys,Support_%"));
        assert!(rules_out.contains("Bread"));

        let itemsets_out = fs::read_to_string(paths.itemsets_csv()).unwrap();
        assert!(itemsets_out.starts_with("support,itemsets,length"));
        assert!(itemsets_out.lines().count() > frequent.len());
    }

    #[test]
    fn test_write_rfm_reports() {
        let metrics = sample_customers();
        let scores = score_customers(&metrics, &RfmThresholds::default()).unwrap();
        let summaries = summarize_segments(&metrics, &scores);

        let dir = tempdir().unwrap();
        let paths = ReportPaths::create(dir.path()).unwrap();
        write_rfm_csv(&metrics, &scores, &paths.rfm_csv()).unwrap();
        write_segment_summary_csv(&summaries, &paths.rfm_summary_csv()).unwrap();

        let rfm_out = fs::read_to_string(paths.rfm_csv()).unwrap();
        let mut lines = rfm_out.lines();
        assert!(lines.next().unwrap().starts_with("CustomerID"));
        // Highest revenue first
        assert!(lines.next().unwrap().starts_with('5'));

        let summary_out = fs::read_to_string(paths.rfm_summary_csv()).unwrap();
        assert!(summary_out.starts_with("Segment,Customer_Count"));
    }

    #[test]
    fn test_write_insights_report() {
        let (_, rules) = sample_rules();
        let metrics = sample_customers();
        let scores = score_customers(&metrics, &RfmThresholds::default()).unwrap();
        let summaries = summarize_segments(&metrics, &scores);

        let dir = tempdir().unwrap();
        let paths = ReportPaths::create(dir.path()).unwrap();
        write_insights_report(&summaries, &rules, &paths.insights_report()).unwrap();

        let report = fs::read_to_string(paths.insights_report()).unwrap();
        assert!(report.contains("ACTIONABLE INSIGHTS REPORT"));
        assert!(report.contains("RECOMMENDED ACTIONS"));
    }
}
