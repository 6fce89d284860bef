//! impact-runner: headless runner for the retail-competition model.
//!
//! Usage:
//!   impact-runner --db project.db --data-dir ./data
//!   impact-runner --db project.db --import inputs.json
//!   impact-runner --import inputs.json --json

use anyhow::{bail, Result};
use impact_core::{
    aggregate::community_summary,
    engine::{ImpactEngine, RunSummary},
    model::ModelInputs,
    progress::{CancelFlag, LogProgress},
    store::ImpactStore,
};
use std::env;

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    run_id: &'a str,
    flow_rows: usize,
    allocated_status_quo: f64,
    allocated_planned: f64,
    markets: &'a [impact_core::aggregate::MarketSales],
    communities: Vec<impact_core::aggregate::CommunitySummary>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let import = arg_value(&args, "--import");
    let json = args.iter().any(|a| a == "--json");

    if db == ":memory:" && import.is_none() {
        bail!("an in-memory database needs --import <inputs.json>");
    }

    if !json {
        println!("impact-runner");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        if let Some(path) = import {
            println!("  import:    {path}");
        }
        println!();
    }

    let store = ImpactStore::open(db)?;
    store.migrate()?;

    if let Some(path) = import {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let inputs: ModelInputs = serde_json::from_str(&content)?;
        store.replace_inputs(&inputs)?;
        log::info!(
            "imported {} markets, {} cells, {} distances",
            inputs.markets.len(),
            inputs.cells.len(),
            inputs.distances.len()
        );
    }

    let engine = ImpactEngine::build(store, data_dir)?;
    let summary = match engine.run(&mut LogProgress, &CancelFlag::new()) {
        Ok(summary) => summary,
        Err(e) if e.is_user_correctable() => {
            eprintln!("Cannot run: {e}");
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        print_json(&engine, &summary)?;
    } else {
        print_summary(&engine, &summary)?;
    }
    Ok(())
}

fn print_json(engine: &ImpactEngine, summary: &RunSummary) -> Result<()> {
    let store = engine.store();
    let report = JsonReport {
        run_id: &summary.run_id,
        flow_rows: summary.flow_rows,
        allocated_status_quo: summary.allocated_status_quo,
        allocated_planned: summary.allocated_planned,
        markets: &summary.market_sales,
        communities: community_summary(&store.markets()?, &store.cells()?, &store.flow_results()?),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_summary(engine: &ImpactEngine, summary: &RunSummary) -> Result<()> {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:           {}", summary.run_id);
    println!("  flow rows:        {}", summary.flow_rows);
    println!("  allocated (sq):   {:.0}", summary.allocated_status_quo);
    println!("  allocated (plan): {:.0}", summary.allocated_planned);

    println!();
    println!("=== SALES BY MARKET ===");
    for s in &summary.market_sales {
        let change = s
            .change_percent
            .map(|p| format!("{p:+.1}%"))
            .unwrap_or_else(|| "new".to_string());
        println!(
            "  {:>6} {:<30} | SQ: {:>12.0} | Plan: {:>12.0} | {}",
            s.market_id, s.name, s.sales_status_quo, s.sales_planned, change
        );
    }

    println!();
    println!("=== CENTRALITY BY COMMUNITY ===");
    let store = engine.store();
    let communities = community_summary(&store.markets()?, &store.cells()?, &store.flow_results()?);
    for c in communities {
        println!(
            "  {} | SQ: {} | Plan: {}",
            c.ags,
            format_ratio(c.centrality_status_quo),
            format_ratio(c.centrality_planned)
        );
    }
    Ok(())
}

fn format_ratio(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
