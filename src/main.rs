//! BasketForge: market basket analysis and RFM segmentation pipeline
//!
//! This is the main entrypoint that orchestrates data loading, frequent
//! itemset mining, rule generation, RFM scoring and report generation.

use anyhow::{Context, Result};
use basketforge::report::{self, ReportPaths};
use basketforge::{data, generate_rules, mine, rfm, Args, ItemsetIndex};
use clap::Parser;
use log::LevelFilter;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .init();

    if args.verbose {
        println!("BasketForge - Market Basket Analysis & RFM Segmentation");
        println!("=======================================================\n");
    }

    run_pipeline(&args)
}

fn run_pipeline(args: &Args) -> Result<()> {
    println!("=== Analysis Pipeline ===\n");

    let start_time = Instant::now();
    let config = args.mining_config();
    let thresholds = args.rfm_thresholds()?;
    let paths = ReportPaths::create(Path::new(&args.output))?;

    // Step 1: Load transaction data
    if args.verbose {
        println!("Step 1: Loading transaction data");
        println!("  Input file: {}", args.input);
    }
    let load_start = Instant::now();
    let pairs = data::load_transaction_pairs(&args.input)?;
    let catalog = match &args.categories {
        Some(path) => data::load_category_catalog(path)?,
        None => HashMap::new(),
    };
    let index = ItemsetIndex::build(&pairs);
    println!(
        "✓ Data loaded: {} transactions, {} distinct products",
        index.total_transactions(),
        index.vocabulary().len()
    );
    if index.skipped_transactions() > 0 || index.skipped_rows() > 0 {
        println!(
            "  Skipped: {} empty transactions, {} blank rows",
            index.skipped_transactions(),
            index.skipped_rows()
        );
    }
    if args.verbose {
        println!("  Loading time: {:.2}s", load_start.elapsed().as_secs_f64());
    }

    // Step 2: Mine frequent itemsets
    if args.verbose {
        println!("\nStep 2: Mining frequent itemsets");
        println!("  min_support: {}", config.min_support);
        println!("  max_length: {:?}", config.max_length);
        println!("  strategy: {:?}", config.strategy);
    }
    let mine_start = Instant::now();
    let frequent = mine(&index, &config).context("frequent itemset mining failed")?;
    println!(
        "✓ Found {} frequent itemsets across {} levels",
        frequent.len(),
        frequent.lengths().count()
    );
    if args.verbose {
        println!("  Mining time: {:.2}s", mine_start.elapsed().as_secs_f64());
    }

    // Step 3: Generate association rules
    let rules = if frequent.is_empty() {
        println!(
            "✓ No itemsets met min_support {}; no rules to derive",
            config.min_support
        );
        Vec::new()
    } else {
        if args.verbose {
            println!("\nStep 3: Generating association rules");
            println!("  min_confidence: {}", config.min_confidence);
            println!("  min_lift: {}", config.min_lift);
        }
        let rules_start = Instant::now();
        let rules =
            generate_rules(&frequent, &catalog, &config).context("rule generation failed")?;
        println!("✓ Generated {} association rules", rules.len());
        if args.verbose {
            println!(
                "  Rule generation time: {:.2}s",
                rules_start.elapsed().as_secs_f64()
            );
        }
        rules
    };

    // Step 4: RFM scoring and segmentation
    if args.verbose {
        println!("\nStep 4: RFM scoring");
        println!("  recency breaks: {:?}", thresholds.recency_breaks);
    }
    let rfm_start = Instant::now();
    let customers = data::load_customer_metrics(&args.input, args.end_date.as_deref())?;
    let scores = rfm::score_customers(&customers, &thresholds)
        .context("RFM scoring failed")?;
    let summaries = rfm::summarize_segments(&customers, &scores);
    println!("✓ Scored {} customers into {} segments", scores.len(), summaries.len());
    if args.verbose {
        println!("  RFM time: {:.2}s", rfm_start.elapsed().as_secs_f64());
    }

    // Step 5: Write reports
    if args.verbose {
        println!("\nStep 5: Writing reports");
        println!("  Output directory: {}", args.output);
    }
    report::write_itemsets_csv(&frequent, &paths.itemsets_csv())?;
    report::write_rules_csv(&rules, &paths.rules_csv())?;
    report::write_rfm_csv(&customers, &scores, &paths.rfm_csv())?;
    report::write_segment_summary_csv(&summaries, &paths.rfm_summary_csv())?;
    report::write_insights_report(&summaries, &rules, &paths.insights_report())?;
    println!("✓ Reports written");

    // Step 6: Console display
    if !rules.is_empty() {
        report::print_rule_table(&rules, args.top);

        let cross_category: Vec<_> = rules.iter().filter(|r| r.is_cross_category).collect();
        println!("\nSTATISTICS:");
        println!("✓ Total association rules found: {}", rules.len());
        println!("✓ Cross-category rules: {}", cross_category.len());
        let avg_lift = rules.iter().map(|r| r.lift).sum::<f64>() / rules.len() as f64;
        let max_lift = rules.iter().map(|r| r.lift).fold(f64::NEG_INFINITY, f64::max);
        println!("✓ Average lift: {avg_lift:.2}");
        println!("✓ Max lift: {max_lift:.2}");
    }
    report::print_segment_summary(&summaries);

    println!("\n=== Pipeline Complete ===");
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    println!("Generated files:");
    println!("  • Frequent itemsets:   {}", paths.itemsets_csv().display());
    println!("  • Market basket rules: {}", paths.rules_csv().display());
    println!("  • RFM segmentation:    {}", paths.rfm_csv().display());
    println!("  • RFM summary:         {}", paths.rfm_summary_csv().display());
    println!("  • Insights report:     {}", paths.insights_report().display());

    Ok(())
}
