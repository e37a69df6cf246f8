//! Sales ledger — the append-only record of "bundle marked sold"
//! events, with branch-scoped read-side aggregates.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::catalog::BundleRow;
use crate::clock::Clock;
use crate::error::{DeskError, DeskResult};
use crate::store::{LedgerStore, SaleRecord, LEDGER_TIMESTAMP_FORMAT};
use crate::types::BranchName;

/// Time scope for ledger reads. A bounded window needs a parsed
/// timestamp; the all-time window counts every decodable row, so sales
/// logged with a mangled timestamp still show in lifetime totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeWindow {
    AllTime,
    Since(NaiveDateTime),
}

impl TimeWindow {
    /// Trailing window of `days` whole days, lower bound inclusive.
    pub fn last_days(now: NaiveDateTime, days: i64) -> Self {
        TimeWindow::Since(now - Duration::days(days))
    }

    pub fn contains(&self, timestamp: Option<NaiveDateTime>) -> bool {
        match self {
            TimeWindow::AllTime => true,
            TimeWindow::Since(since) => timestamp.map_or(false, |t| t >= *since),
        }
    }
}

/// A persisted "marked sold" event. The catalog metrics are copied in
/// at sale time so the ledger stays readable after snapshot reloads.
#[derive(Debug, Clone, Serialize)]
pub struct SaleEvent {
    pub timestamp: String,
    pub branch_name: BranchName,
    pub bundle_id: String,
    pub part1: String,
    pub part2: String,
    pub customers: Option<u64>,
    pub confidence: Option<f64>,
    pub revenue_estimate: Option<f64>,
    pub status: String,
}

/// Stable bundle identity: FNV-1a over the part pair. The same pair
/// gets the same id in every query and across dataset reloads, unlike
/// a result-row position, which shifts between projections.
pub fn bundle_id(part_a: &str, part_b: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in part_a.bytes().chain([0x1f]).chain(part_b.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("BDL-{:010X}", hash & 0xFF_FFFF_FFFF)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchSummary {
    pub count: usize,
    pub total_revenue: f64,
}

pub struct SalesLedger {
    store: LedgerStore,
}

impl SalesLedger {
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Append one sale. Only emptiness is rejected here; membership in
    /// the branch directory is the caller's concern (see
    /// `BranchSession`). Duplicate pairs are expected — a branch sells
    /// the same bundle to many customers.
    pub fn record_sale(
        &self,
        branch_name: &str,
        row: &BundleRow,
        clock: &dyn Clock,
    ) -> DeskResult<SaleEvent> {
        if branch_name.trim().is_empty() {
            return Err(DeskError::EmptyBranchName);
        }

        let event = SaleEvent {
            timestamp: clock.now().format(LEDGER_TIMESTAMP_FORMAT).to_string(),
            branch_name: branch_name.to_string(),
            bundle_id: bundle_id(&row.part_a, &row.part_b),
            part1: row.part_a.clone(),
            part2: row.part_b.clone(),
            customers: row.customer_count,
            confidence: row.confidence,
            revenue_estimate: row.revenue_estimate,
            status: "Sold".to_string(),
        };
        self.store.append(&event)?;
        log::debug!(
            "recorded sale {} for branch {}",
            event.bundle_id,
            event.branch_name
        );
        Ok(event)
    }

    /// Count and revenue for one branch over `window`.
    pub fn summary(&self, branch_name: &str, window: &TimeWindow) -> DeskResult<BranchSummary> {
        let mut count = 0;
        let mut total_revenue = 0.0;
        for record in self.store.read_all()? {
            if record.branch_name != branch_name || !window.contains(record.timestamp) {
                continue;
            }
            count += 1;
            total_revenue += record.revenue_estimate.unwrap_or(0.0);
        }
        Ok(BranchSummary {
            count,
            total_revenue,
        })
    }

    /// Latest events for one branch, newest first. Events whose
    /// timestamp fails to parse sort last but are not dropped.
    pub fn recent(&self, branch_name: &str, limit: usize) -> DeskResult<Vec<SaleRecord>> {
        let mut records: Vec<SaleRecord> = self
            .store
            .read_all()?
            .into_iter()
            .filter(|r| r.branch_name == branch_name)
            .collect();
        sort_newest_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    /// Every decodable ledger row (the admin read path).
    pub fn all_records(&self) -> DeskResult<Vec<SaleRecord>> {
        self.store.read_all()
    }
}

/// Descending by parsed timestamp, unparsable rows last. Stable, so
/// equal timestamps keep append order.
pub(crate) fn sort_newest_first(records: &mut [SaleRecord]) {
    records.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
