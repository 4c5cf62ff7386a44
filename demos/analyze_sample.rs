//! Transaction network analysis example
//!
//! Analyzes the embedded sample dataset, or a CSV/JSON transaction file when a
//! path is given, and prints the rings, the top suspicious accounts and the
//! full JSON result.
//!
//! Usage: `cargo run --example analyze_sample -- [transactions.csv|.json] [config.json]`

use rust_aml_network_analyzer::ingest::{load_csv_file, load_json_file};
use rust_aml_network_analyzer::sample_data::sample_transactions;
use rust_aml_network_analyzer::{DetectionConfig, GraphView, TransactionAnalyzer};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rust_aml_network_analyzer=info".parse()?),
        )
        .compact()
        .init();

    let mut args = std::env::args().skip(1);

    let transactions = match args.next() {
        Some(path) => {
            let path = Path::new(&path);
            let report = if path.extension().map_or(false, |ext| ext == "json") {
                load_json_file(path)?
            } else {
                load_csv_file(path)?
            };
            info!(
                path = %path.display(),
                accepted = report.transactions.len(),
                rejected = report.rejected.len(),
                "loaded transactions"
            );
            report.transactions
        }
        None => sample_transactions(),
    };

    let config = match args.next() {
        Some(path) => DetectionConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => DetectionConfig::default(),
    };

    println!("=== AML Transaction Network Analysis ===\n");

    let analyzer = TransactionAnalyzer::with_config(config);
    let result = analyzer.analyze(&transactions);

    println!("Fraud rings: {}", result.fraud_rings.len());
    for ring in &result.fraud_rings {
        println!(
            "   {} [{}] risk {:.1}: {}",
            ring.ring_id,
            ring.pattern_type,
            ring.risk_score,
            ring.member_accounts.join(" -> ")
        );
    }
    println!();

    println!("Top suspicious accounts:");
    for account in result.suspicious_accounts.iter().take(10) {
        let patterns: Vec<String> = account
            .detected_patterns
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!(
            "   {:<12} {:>5.1}  {:<10} {}",
            account.account_id,
            account.suspicion_score,
            account.ring_id,
            patterns.join(", ")
        );
    }
    println!();

    let view = GraphView::build(&transactions, &result);
    println!(
        "Graph: {} nodes, {} edges",
        view.nodes.len(),
        view.edges.len()
    );
    println!();

    println!("Result JSON:");
    println!("{}", result.to_json()?);

    Ok(())
}
