//! Admin rollup tests — per-branch table, window totals, export.

use bundletrack_core::branch::BranchDirectory;
use bundletrack_core::catalog::BundleRow;
use bundletrack_core::ledger::{SalesLedger, TimeWindow};
use bundletrack_core::rollup::{self, BranchStatus};
use bundletrack_core::store::LedgerStore;
use bundletrack_core::FixedClock;
use chrono::{Duration, NaiveDate, NaiveDateTime};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn row(part_a: &str, confidence: f64, revenue: f64) -> BundleRow {
    BundleRow {
        index: 0,
        part_a: part_a.into(),
        part_b: "99112233".into(),
        customer_count: Some(10),
        confidence: Some(confidence),
        revenue_estimate: Some(revenue),
        description_a: None,
        description_b: None,
        manufacturer_a: None,
        manufacturer_b: None,
    }
}

fn directory() -> BranchDirectory {
    BranchDirectory::from_names(
        ["Cambridge", "Marietta", "Holt"].map(String::from),
    )
}

/// Exactly one table row per directory branch, in directory order,
/// including branches with no ledger events at all.
#[test]
fn rollup_covers_every_directory_branch() {
    let ledger = SalesLedger::new(LedgerStore::in_memory());
    let clock = FixedClock(at(2025, 11, 3, 9));
    ledger
        .record_sale("Cambridge", &row("A", 80.0, 1000.0), &clock)
        .unwrap();

    let table = rollup::rollup(&ledger, &directory(), &TimeWindow::AllTime).unwrap();

    assert_eq!(table.len(), 3);
    let names: Vec<&str> = table.iter().map(|r| r.branch.as_str()).collect();
    assert_eq!(names, vec!["Cambridge", "Marietta", "Holt"]);

    assert_eq!(table[0].status, BranchStatus::Active);
    assert_eq!(table[0].bundles_sold, 1);
    assert_eq!(table[0].revenue, 1000.0);

    for inactive in &table[1..] {
        assert_eq!(inactive.status, BranchStatus::Inactive, "{}", inactive.branch);
        assert_eq!(inactive.bundles_sold, 0);
        assert_eq!(inactive.revenue, 0.0);
        assert!(inactive.last_activity.is_none());
    }
}

/// Active means at least one event inside the window. A branch whose
/// sales all predate the window shows Inactive, and last_activity is
/// the newest in-window timestamp.
#[test]
fn rollup_applies_window_to_status_and_activity() {
    let ledger = SalesLedger::new(LedgerStore::in_memory());
    let now = at(2025, 11, 10, 12);

    let old = now - Duration::days(30);
    ledger
        .record_sale("Marietta", &row("A", 80.0, 500.0), &FixedClock(old))
        .unwrap();
    ledger
        .record_sale("Cambridge", &row("B", 70.0, 800.0), &FixedClock(now - Duration::days(2)))
        .unwrap();
    ledger
        .record_sale("Cambridge", &row("C", 75.0, 900.0), &FixedClock(now - Duration::days(1)))
        .unwrap();

    let window = TimeWindow::last_days(now, 7);
    let table = rollup::rollup(&ledger, &directory(), &window).unwrap();

    let cambridge = &table[0];
    assert_eq!(cambridge.status, BranchStatus::Active);
    assert_eq!(cambridge.bundles_sold, 2);
    assert_eq!(cambridge.last_activity, Some(now - Duration::days(1)));

    let marietta = &table[1];
    assert_eq!(marietta.status, BranchStatus::Inactive);
    assert_eq!(marietta.bundles_sold, 0, "out-of-window sales must not count");
}

/// A ledger branch missing from the directory is invisible in the
/// per-branch table but still counts in the raw-ledger totals.
#[test]
fn orphan_branch_counts_in_totals_only() {
    let ledger = SalesLedger::new(LedgerStore::in_memory());
    let clock = FixedClock(at(2025, 11, 3, 9));
    ledger
        .record_sale("Cambridge", &row("A", 80.0, 1000.0), &clock)
        .unwrap();
    ledger
        .record_sale("Springfield", &row("B", 90.0, 2000.0), &clock)
        .unwrap();

    let table = rollup::rollup(&ledger, &directory(), &TimeWindow::AllTime).unwrap();
    assert!(
        table.iter().all(|r| r.branch != "Springfield"),
        "directory is authoritative for the table"
    );

    let totals = rollup::totals(&ledger, &TimeWindow::AllTime).unwrap();
    assert_eq!(totals.bundles_sold, 2);
    assert_eq!(totals.revenue, 3000.0);
    assert_eq!(totals.active_branch_count, 2, "orphan branch counts as active");
    assert!((totals.avg_confidence - 85.0).abs() < 1e-9);
}

/// Totals respect the window and average confidence only over events
/// that carry one.
#[test]
fn totals_window_and_confidence_mean() {
    let ledger = SalesLedger::new(LedgerStore::in_memory());
    let now = at(2025, 11, 10, 12);

    ledger
        .record_sale("Cambridge", &row("A", 60.0, 100.0), &FixedClock(now - Duration::days(30)))
        .unwrap();
    ledger
        .record_sale("Cambridge", &row("B", 90.0, 300.0), &FixedClock(now - Duration::days(1)))
        .unwrap();
    let mut no_confidence = row("C", 0.0, 500.0);
    no_confidence.confidence = None;
    ledger
        .record_sale("Holt", &no_confidence, &FixedClock(now - Duration::days(1)))
        .unwrap();

    let totals = rollup::totals(&ledger, &TimeWindow::last_days(now, 7)).unwrap();
    assert_eq!(totals.bundles_sold, 2);
    assert_eq!(totals.revenue, 800.0);
    assert_eq!(totals.active_branch_count, 2);
    assert!(
        (totals.avg_confidence - 90.0).abs() < 1e-9,
        "mean must skip the event without a confidence value"
    );
}

/// An empty ledger rolls up to all-Inactive and zero totals.
#[test]
fn empty_ledger_rolls_up_to_zeroes() {
    let ledger = SalesLedger::new(LedgerStore::in_memory());

    let table = rollup::rollup(&ledger, &directory(), &TimeWindow::AllTime).unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.iter().all(|r| r.status == BranchStatus::Inactive));

    let totals = rollup::totals(&ledger, &TimeWindow::AllTime).unwrap();
    assert_eq!(totals.bundles_sold, 0);
    assert_eq!(totals.active_branch_count, 0);
    assert_eq!(totals.avg_confidence, 0.0);
}

/// Cross-branch recent view interleaves branches newest-first.
#[test]
fn recent_across_branches_orders_newest_first() {
    let ledger = SalesLedger::new(LedgerStore::in_memory());
    let now = at(2025, 11, 10, 12);

    ledger
        .record_sale("Cambridge", &row("A", 80.0, 100.0), &FixedClock(now - Duration::days(3)))
        .unwrap();
    ledger
        .record_sale("Holt", &row("B", 80.0, 200.0), &FixedClock(now - Duration::days(1)))
        .unwrap();
    ledger
        .record_sale("Marietta", &row("C", 80.0, 300.0), &FixedClock(now - Duration::days(2)))
        .unwrap();

    let recent = rollup::recent_across_branches(&ledger, &TimeWindow::AllTime, 2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].branch_name, "Holt");
    assert_eq!(recent[1].branch_name, "Marietta");
}

/// The export carries the table header and renders zero-activity
/// branches with "Never".
#[test]
fn performance_csv_renders_table() {
    let ledger = SalesLedger::new(LedgerStore::in_memory());
    let clock = FixedClock(at(2025, 11, 3, 9));
    ledger
        .record_sale("Cambridge", &row("A", 80.0, 1000.0), &clock)
        .unwrap();

    let table = rollup::rollup(&ledger, &directory(), &TimeWindow::AllTime).unwrap();
    let csv = rollup::performance_csv(&table).unwrap();

    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Branch,Status,Bundles Sold,Revenue,Last Activity"
    );
    assert_eq!(csv.lines().count(), 4, "header plus one line per branch");
    assert!(csv.contains("Cambridge,Active,1,1000,2025-11-03 09:00:00"));
    assert!(csv.contains("Marietta,Inactive,0,0,Never"));
}
