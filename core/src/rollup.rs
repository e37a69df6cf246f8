//! Admin rollup — cross-branch aggregates over the sales ledger.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::branch::BranchDirectory;
use crate::error::DeskResult;
use crate::ledger::{sort_newest_first, SalesLedger, TimeWindow};
use crate::store::{SaleRecord, LEDGER_TIMESTAMP_FORMAT};
use crate::types::BranchName;

/// Activity status over the requested window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchStatus {
    Active,
    Inactive,
}

impl BranchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchStatus::Active => "Active",
            BranchStatus::Inactive => "Inactive",
        }
    }
}

/// One row of the per-branch performance table.
#[derive(Debug, Clone, Serialize)]
pub struct BranchPerformance {
    pub branch: BranchName,
    pub status: BranchStatus,
    pub bundles_sold: usize,
    pub revenue: f64,
    pub last_activity: Option<NaiveDateTime>,
}

/// Ledger-wide totals for one window.
#[derive(Debug, Clone, Serialize)]
pub struct RollupTotals {
    pub bundles_sold: usize,
    pub revenue: f64,
    pub active_branch_count: usize,
    pub avg_confidence: f64,
}

/// One table row per directory branch, in directory order. Branches
/// with no in-window events appear as Inactive with zeroes. The
/// directory is authoritative for enumeration: ledger rows whose branch
/// is missing from it do not appear here, though they still count in
/// `totals`, which scans the raw ledger (see DESIGN.md).
pub fn rollup(
    ledger: &SalesLedger,
    directory: &BranchDirectory,
    window: &TimeWindow,
) -> DeskResult<Vec<BranchPerformance>> {
    let records = ledger.all_records()?;
    let mut table = Vec::with_capacity(directory.len());

    for branch in directory.list() {
        let mut bundles_sold = 0;
        let mut revenue = 0.0;
        let mut last_activity: Option<NaiveDateTime> = None;

        for record in records
            .iter()
            .filter(|r| &r.branch_name == branch && window.contains(r.timestamp))
        {
            bundles_sold += 1;
            revenue += record.revenue_estimate.unwrap_or(0.0);
            if let Some(ts) = record.timestamp {
                last_activity = Some(last_activity.map_or(ts, |prev| prev.max(ts)));
            }
        }

        let status = if bundles_sold > 0 {
            BranchStatus::Active
        } else {
            BranchStatus::Inactive
        };
        table.push(BranchPerformance {
            branch: branch.clone(),
            status,
            bundles_sold,
            revenue,
            last_activity,
        });
    }

    Ok(table)
}

/// Window totals from the raw ledger. Branches missing from the
/// directory still count here, toward both the sold/revenue totals and
/// the active-branch count.
pub fn totals(ledger: &SalesLedger, window: &TimeWindow) -> DeskResult<RollupTotals> {
    let records = ledger.all_records()?;
    let mut bundles_sold = 0;
    let mut revenue = 0.0;
    let mut active: HashSet<&str> = HashSet::new();
    let mut confidence_sum = 0.0;
    let mut confidence_n = 0usize;

    for record in records.iter().filter(|r| window.contains(r.timestamp)) {
        bundles_sold += 1;
        revenue += record.revenue_estimate.unwrap_or(0.0);
        active.insert(record.branch_name.as_str());
        if let Some(c) = record.confidence {
            confidence_sum += c;
            confidence_n += 1;
        }
    }

    let avg_confidence = if confidence_n > 0 {
        confidence_sum / confidence_n as f64
    } else {
        0.0
    };
    Ok(RollupTotals {
        bundles_sold,
        revenue,
        active_branch_count: active.len(),
        avg_confidence,
    })
}

/// Newest in-window events across every branch (the dashboard's recent
/// activity table). Unparsable timestamps sort last.
pub fn recent_across_branches(
    ledger: &SalesLedger,
    window: &TimeWindow,
    limit: usize,
) -> DeskResult<Vec<SaleRecord>> {
    let mut records: Vec<SaleRecord> = ledger
        .all_records()?
        .into_iter()
        .filter(|r| window.contains(r.timestamp))
        .collect();
    sort_newest_first(&mut records);
    records.truncate(limit);
    Ok(records)
}

/// CSV rendering of the performance table (the dashboard export).
pub fn performance_csv(rows: &[BranchPerformance]) -> DeskResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Branch", "Status", "Bundles Sold", "Revenue", "Last Activity"])?;
    for row in rows {
        let last_activity = row
            .last_activity
            .map(|t| t.format(LEDGER_TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "Never".to_string());
        writer.write_record([
            row.branch.clone(),
            row.status.as_str().to_string(),
            row.bundles_sold.to_string(),
            format!("{:.0}", row.revenue),
            last_activity,
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing performance export: {e}"))?;
    String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("performance export not UTF-8: {e}").into())
}
