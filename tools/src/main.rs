//! desk-runner: headless front end for the bundle-tracking core.
//!
//! Usage:
//!   desk-runner [--data-dir DIR] [--json] <command> [args]
//!
//! Commands:
//!   overview                     snapshot metrics + confidence bins
//!   top <confidence|customers> [n]
//!   search <query> [limit]
//!   sell <branch> <row-index>
//!   summary <branch> [days]
//!   recent <branch> [limit]
//!   rollup [days] [--csv]

use anyhow::{bail, Context, Result};
use bundletrack_core::rollup;
use bundletrack_core::{
    BranchDirectory, BundleCatalog, BundleRow, Clock, DeskConfig, LedgerStore, RankMetric,
    SalesLedger, SystemClock, TimeWindow,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let csv_out = args.iter().any(|a| a == "--csv");

    let config_path = flag_value(&args, "--config").unwrap_or_else(|| "desk_config.json".into());
    let mut config = DeskConfig::load(&config_path)?;
    if let Some(dir) = flag_value(&args, "--data-dir") {
        config.data_dir = dir.into();
    }
    if let Some(file) = flag_value(&args, "--bundles") {
        config.bundle_file = file;
    }
    if let Some(file) = flag_value(&args, "--branches") {
        config.branch_file = file;
    }
    if let Some(file) = flag_value(&args, "--ledger") {
        config.ledger_file = file;
    }

    let positional = positionals(&args);
    let Some(command) = positional.first().map(String::as_str) else {
        bail!("no command given (try: overview, top, search, sell, summary, recent, rollup)");
    };
    let rest = &positional[1..];

    let clock = SystemClock;
    match command {
        "overview" => cmd_overview(&config, json),
        "top" => cmd_top(&config, rest, json),
        "search" => cmd_search(&config, rest, json),
        "sell" => cmd_sell(&config, rest, &clock, json),
        "summary" => cmd_summary(&config, rest, &clock, json),
        "recent" => cmd_recent(&config, rest, json),
        "rollup" => cmd_rollup(&config, rest, &clock, json, csv_out),
        other => bail!("unknown command: {other}"),
    }
}

fn cmd_overview(config: &DeskConfig, json: bool) -> Result<()> {
    let catalog = BundleCatalog::load_path(config.bundle_path(), &config.field_aliases())?;
    let overview = catalog.overview();
    let bins = catalog.confidence_distribution();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "overview": overview,
                "confidence_bins": bins,
            }))?
        );
        return Ok(());
    }

    println!("=== CATALOG OVERVIEW ===");
    println!("  bundles:        {}", overview.total_bundles);
    match overview.total_customers {
        Some(n) => println!("  customers:      {n}"),
        None => println!("  customers:      n/a (column missing)"),
    }
    match overview.avg_confidence {
        Some(c) => println!("  avg confidence: {c:.1}%"),
        None => println!("  avg confidence: n/a (column missing)"),
    }
    match overview.total_revenue {
        Some(r) => println!("  est. revenue:   ${r:.0}"),
        None => println!("  est. revenue:   n/a (column missing)"),
    }
    println!();
    println!("  confidence bins (0-50 / 50-70 / 70-80 / 80-90 / 90-100):");
    println!(
        "    {} / {} / {} / {} / {}",
        bins[0], bins[1], bins[2], bins[3], bins[4]
    );
    Ok(())
}

fn cmd_top(config: &DeskConfig, rest: &[String], json: bool) -> Result<()> {
    let metric = match rest.first().map(String::as_str) {
        Some("confidence") => RankMetric::Confidence,
        Some("customers") => RankMetric::CustomerCount,
        Some(other) => bail!("unknown metric: {other} (expected confidence or customers)"),
        None => RankMetric::Confidence,
    };
    let n = parse_positional(rest.get(1), 20)?;

    let catalog = BundleCatalog::load_path(config.bundle_path(), &config.field_aliases())?;
    let ranking = catalog.top_by_metric(metric, n);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "degraded": ranking.degraded,
                "rows": ranking.rows,
            }))?
        );
        return Ok(());
    }

    if ranking.degraded {
        println!("(metric column missing; showing first {n} rows unranked)");
    }
    for row in &ranking.rows {
        print_bundle_row(row);
    }
    Ok(())
}

fn cmd_search(config: &DeskConfig, rest: &[String], json: bool) -> Result<()> {
    let Some(query) = rest.first() else {
        bail!("search needs a part number query");
    };
    let limit = parse_positional(rest.get(1), 20)?;

    let catalog = BundleCatalog::load_path(config.bundle_path(), &config.field_aliases())?;
    let results = catalog.search_ranked_by_customers(query, limit);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total_matches": results.total_matches,
                "degraded": results.degraded,
                "rows": results.rows,
            }))?
        );
        return Ok(());
    }

    if results.total_matches == 0 {
        println!("No compatible parts found for: {query}");
        return Ok(());
    }
    println!(
        "Found {} compatible parts for: {query}",
        results.total_matches
    );
    if results.degraded {
        println!("(customer column missing; matches are unranked)");
    }
    for row in &results.rows {
        print_bundle_row(row);
    }
    if results.total_matches > results.rows.len() {
        println!(
            "Showing top {} of {} results.",
            results.rows.len(),
            results.total_matches
        );
    }
    Ok(())
}

fn cmd_sell(config: &DeskConfig, rest: &[String], clock: &dyn Clock, json: bool) -> Result<()> {
    let (Some(branch), Some(index)) = (rest.first(), rest.get(1)) else {
        bail!("sell needs a branch name and a row index");
    };
    let index: usize = index
        .parse()
        .with_context(|| format!("invalid row index: {index}"))?;

    let directory = BranchDirectory::load(config.branch_path())?;
    let session = directory.open_session(branch)?;

    let catalog = BundleCatalog::load_path(config.bundle_path(), &config.field_aliases())?;
    let row = catalog
        .get(index)
        .with_context(|| format!("row index {index} out of range (0..{})", catalog.len()))?;

    let ledger = SalesLedger::new(LedgerStore::open(config.ledger_path()));
    let event = session.record_sale(&ledger, row, clock)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(());
    }
    println!(
        "Recorded {} ({} + {}) for {} at {}",
        event.bundle_id, event.part1, event.part2, event.branch_name, event.timestamp
    );
    Ok(())
}

fn cmd_summary(config: &DeskConfig, rest: &[String], clock: &dyn Clock, json: bool) -> Result<()> {
    let Some(branch) = rest.first() else {
        bail!("summary needs a branch name");
    };
    let window = window_from_days(rest.get(1), clock)?;

    let ledger = SalesLedger::new(LedgerStore::open(config.ledger_path()));
    let summary = ledger.summary(branch, &window)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "branch": branch,
                "count": summary.count,
                "total_revenue": summary.total_revenue,
            }))?
        );
        return Ok(());
    }
    println!("=== {branch} ===");
    println!("  bundles sold: {}", summary.count);
    println!("  revenue:      ${:.0}", summary.total_revenue);
    Ok(())
}

fn cmd_recent(config: &DeskConfig, rest: &[String], json: bool) -> Result<()> {
    let Some(branch) = rest.first() else {
        bail!("recent needs a branch name");
    };
    let limit = parse_positional(rest.get(1), 10)?;

    let ledger = SalesLedger::new(LedgerStore::open(config.ledger_path()));
    let records = ledger.recent(branch, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No sales recorded yet for {branch}.");
        return Ok(());
    }
    for record in &records {
        println!(
            "{}  {} + {}  ${:.0}",
            record.raw_timestamp,
            record.part1,
            record.part2,
            record.revenue_estimate.unwrap_or(0.0)
        );
    }
    Ok(())
}

fn cmd_rollup(
    config: &DeskConfig,
    rest: &[String],
    clock: &dyn Clock,
    json: bool,
    csv_out: bool,
) -> Result<()> {
    let window = window_from_days(rest.first(), clock)?;

    let directory = BranchDirectory::load(config.branch_path())?;
    let ledger = SalesLedger::new(LedgerStore::open(config.ledger_path()));
    let table = rollup::rollup(&ledger, &directory, &window)?;
    let totals = rollup::totals(&ledger, &window)?;

    if csv_out {
        print!("{}", rollup::performance_csv(&table)?);
        return Ok(());
    }
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "branches": table,
                "totals": totals,
            }))?
        );
        return Ok(());
    }

    println!("=== BRANCH PERFORMANCE ===");
    for row in &table {
        let last = row
            .last_activity
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Never".to_string());
        println!(
            "  {:<18} {:<8} {:>5} sold  ${:>10.0}  last: {last}",
            row.branch,
            row.status.as_str(),
            row.bundles_sold,
            row.revenue
        );
    }
    println!();
    println!("=== TOTALS ===");
    println!("  bundles sold:    {}", totals.bundles_sold);
    println!("  revenue:         ${:.0}", totals.revenue);
    println!(
        "  active branches: {}/{}",
        totals.active_branch_count,
        directory.len()
    );
    println!("  avg confidence:  {:.0}%", totals.avg_confidence);
    Ok(())
}

fn print_bundle_row(row: &BundleRow) {
    let customers = row
        .customer_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "?".to_string());
    let confidence = row
        .confidence
        .map(|c| format!("{c:.1}%"))
        .unwrap_or_else(|| "n/a".to_string());
    let revenue = row
        .revenue_estimate
        .map(|r| format!("${r:.0}"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "[{:>5}] {} + {}  {customers} customers | {confidence} confidence | {revenue} revenue",
        row.index, row.part_a, row.part_b
    );
    if let (Some(a), Some(b)) = (&row.description_a, &row.description_b) {
        println!("        {a} / {b}");
    }
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].clone())
}

fn positionals(args: &[String]) -> Vec<String> {
    const VALUE_FLAGS: [&str; 5] = ["--config", "--data-dir", "--bundles", "--branches", "--ledger"];
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn parse_positional(arg: Option<&String>, default: usize) -> Result<usize> {
    match arg {
        Some(v) => v.parse().with_context(|| format!("invalid number: {v}")),
        None => Ok(default),
    }
}

fn window_from_days(arg: Option<&String>, clock: &dyn Clock) -> Result<TimeWindow> {
    match arg {
        Some(v) => {
            let days: i64 = v
                .parse()
                .with_context(|| format!("invalid day count: {v}"))?;
            Ok(TimeWindow::last_days(clock.now(), days))
        }
        None => Ok(TimeWindow::AllTime),
    }
}
