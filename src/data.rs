//! Data loading and feature extraction using Polars
//!
//! Input is a retail transactions CSV with the columns InvoiceNo, StockCode,
//! Description, Quantity, InvoiceDate, UnitPrice, CustomerID, Country. The
//! loaders produce the two core input tables: ordered (transaction, item)
//! pairs for basket mining and per-customer RFM metrics.

use crate::rfm::CustomerMetrics;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Load ordered (transaction_id, item_name) pairs for market basket analysis.
///
/// Rows with nonpositive quantity (returns and cancellations) or a missing
/// product description are filtered out before pairing.
pub fn load_transaction_pairs(path: &str) -> crate::Result<Vec<(String, String)>> {
    let df = LazyCsvReader::new(path)
        .has_header(true)
        .finish()?
        .filter(
            col("Quantity")
                .gt(lit(0))
                .and(col("Description").is_not_null()),
        )
        .select([
            col("InvoiceNo").cast(DataType::Utf8),
            col("Description").cast(DataType::Utf8),
        ])
        .collect()?;

    let invoices = df.column("InvoiceNo")?.utf8()?;
    let items = df.column("Description")?.utf8()?;
    let pairs: Vec<(String, String)> = invoices
        .into_iter()
        .zip(items.into_iter())
        .filter_map(|(invoice, item)| match (invoice, item) {
            (Some(invoice), Some(item)) => Some((invoice.to_string(), item.to_string())),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        anyhow::bail!("no valid transaction rows found in {}", path);
    }
    log::info!("loaded {} transaction-item pair(s) from {}", pairs.len(), path);
    Ok(pairs)
}

/// Load per-customer RFM metrics from the transactions CSV.
///
/// # Arguments
/// * `path` - Path to the CSV file
/// * `end_date` - RFC 3339 reference date for recency; defaults to now
///
/// # Returns
/// * Customers with recency in whole days, distinct order count and total
///   revenue, sorted by customer id
pub fn load_customer_metrics(
    path: &str,
    end_date: Option<&str>,
) -> crate::Result<Vec<CustomerMetrics>> {
    let reference_date = match end_date {
        Some(raw) => DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc),
        None => Utc::now(),
    };
    let reference_micros = reference_date.timestamp_micros();

    let df = LazyCsvReader::new(path)
        .has_header(true)
        .finish()?
        .filter(
            // Filter out invalid rows
            col("Quantity")
                .gt(lit(0))
                .and(col("UnitPrice").gt(lit(0.0)))
                .and(col("CustomerID").is_not_null()),
        )
        .with_columns([
            col("InvoiceDate")
                .str()
                .to_datetime(
                    Some(TimeUnit::Microseconds),
                    None,
                    StrptimeOptions {
                        format: None,
                        strict: false,
                        ..Default::default()
                    },
                    lit("raise"),
                )
                .alias("PurchaseTs"),
            (col("Quantity").cast(DataType::Float64) * col("UnitPrice")).alias("TotalAmount"),
        ])
        .group_by([col("CustomerID")])
        .agg([
            // Recency source: timestamp of the most recent purchase
            col("PurchaseTs")
                .max()
                .cast(DataType::Int64)
                .alias("LastPurchaseMicros"),
            // Frequency: number of distinct invoices
            col("InvoiceNo")
                .n_unique()
                .cast(DataType::Int64)
                .alias("Frequency"),
            // Monetary: total spending
            col("TotalAmount").sum().alias("Monetary"),
        ])
        .sort("CustomerID", SortOptions::default())
        .collect()?;

    let ids = df.column("CustomerID")?.i64()?;
    let last_purchase = df.column("LastPurchaseMicros")?.i64()?;
    let frequency = df.column("Frequency")?.i64()?;
    let monetary = df.column("Monetary")?.f64()?;

    let mut customers = Vec::with_capacity(df.height());
    let mut skipped = 0usize;
    for row in 0..df.height() {
        let values = (
            ids.get(row),
            last_purchase.get(row),
            frequency.get(row),
            monetary.get(row),
        );
        let (Some(customer_id), Some(last_micros), Some(orders), Some(revenue)) = values else {
            skipped += 1;
            continue;
        };
        let days = (reference_micros - last_micros) / MICROS_PER_DAY;
        if days < 0 || orders <= 0 || revenue <= 0.0 {
            skipped += 1;
            continue;
        }
        customers.push(CustomerMetrics {
            customer_id,
            days_since_last_purchase: days,
            total_orders: orders as u64,
            total_revenue: revenue,
        });
    }

    if skipped > 0 {
        log::warn!("skipped {} customer row(s) failing quality filters", skipped);
    }
    if customers.is_empty() {
        anyhow::bail!("no customers found after RFM computation");
    }
    log::info!("computed RFM metrics for {} customer(s)", customers.len());
    Ok(customers)
}

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(rename = "ProductName")]
    product_name: String,
    #[serde(rename = "Category")]
    category: String,
}

/// Load the optional product catalog mapping item names to category labels.
pub fn load_category_catalog(path: &str) -> crate::Result<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut catalog = HashMap::new();
    for record in reader.deserialize() {
        let record: CatalogRecord = record?;
        let name = record.product_name.trim();
        if name.is_empty() {
            continue;
        }
        catalog.insert(name.to_string(), record.category.trim().to_string());
    }
    log::info!("loaded {} catalog entr(ies) from {}", catalog.len(), path);
    Ok(catalog)
}
