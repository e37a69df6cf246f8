//! Bundle catalog tests — ranked views, part search, derived revenue.

use bundletrack_core::catalog::BundleCatalog;
use bundletrack_core::schema::FieldAliases;
use bundletrack_core::{DeskError, RankMetric};

fn catalog_from(csv: &str) -> BundleCatalog {
    BundleCatalog::load_reader(csv.as_bytes(), &FieldAliases::default()).unwrap()
}

const SNAPSHOT: &str = "\
Part_1,Part_2,Customers,Enhanced_Confidence,Annual_Revenue_Potential
47833556,99112233,42,87.5,12600
10000001,20000002,130,76.0,9100
47830007,30000003,7,91.2,2100
40000004,50000005,,64.0,800
60000006,70000007,0,99.9,5000
";

/// Top-by-confidence never exceeds n, sorts descending, and excludes
/// rows with a missing confidence value.
#[test]
fn top_by_confidence_caps_and_sorts() {
    let catalog = catalog_from(SNAPSHOT);
    let ranking = catalog.top_by_metric(RankMetric::Confidence, 3);

    assert!(!ranking.degraded);
    assert_eq!(ranking.rows.len(), 3);
    let confidences: Vec<f64> = ranking.rows.iter().map(|r| r.confidence.unwrap()).collect();
    assert_eq!(confidences, vec![99.9, 91.2, 87.5]);
}

/// Rows missing the requested metric are excluded before ranking.
#[test]
fn top_by_metric_excludes_missing_values() {
    let csv = "\
Part_1,Part_2,Enhanced_Confidence
A,B,80.0
C,D,
E,F,60.0
";
    let catalog = catalog_from(csv);
    let ranking = catalog.top_by_metric(RankMetric::Confidence, 10);

    assert_eq!(ranking.rows.len(), 2, "the blank-confidence row must drop out");
    assert!(ranking.rows.iter().all(|r| r.confidence.is_some()));
}

/// The customer-ranked view drops zero counts too, not just missing
/// ones — same cleaning as the search path.
#[test]
fn top_by_customers_excludes_non_positive_counts() {
    let catalog = catalog_from(SNAPSHOT);
    let ranking = catalog.top_by_metric(RankMetric::CustomerCount, 10);

    let counts: Vec<u64> = ranking
        .rows
        .iter()
        .map(|r| r.customer_count.unwrap())
        .collect();
    assert_eq!(counts, vec![130, 42, 7]);
}

/// Equal metric values keep their load order (stable sort).
#[test]
fn top_by_metric_ties_keep_load_order() {
    let csv = "\
Part_1,Part_2,Customers
A,B,50
C,D,50
E,F,50
";
    let catalog = catalog_from(csv);
    let ranking = catalog.top_by_metric(RankMetric::CustomerCount, 3);

    let parts: Vec<&str> = ranking.rows.iter().map(|r| r.part_a.as_str()).collect();
    assert_eq!(parts, vec!["A", "C", "E"]);
}

/// An unresolved metric column degrades to the first n rows in load
/// order, flagged so a consumer can present the data as unranked.
#[test]
fn top_by_metric_degrades_without_column() {
    let csv = "\
Part_1,Part_2
A,B
C,D
E,F
";
    let catalog = catalog_from(csv);
    let ranking = catalog.top_by_metric(RankMetric::Confidence, 2);

    assert!(ranking.degraded);
    assert_eq!(ranking.rows.len(), 2);
    assert_eq!(ranking.rows[0].part_a, "A");
    assert_eq!(ranking.rows[1].part_a, "C");
}

/// A partial part number matches by substring on either side of the
/// pair: "4783" must find both 47833556 (part 1) and 47830007 (part 1).
#[test]
fn search_matches_by_substring() {
    let catalog = catalog_from(SNAPSHOT);
    let results = catalog.search_ranked_by_customers("4783", 20);

    assert_eq!(results.total_matches, 2);
    let parts: Vec<&str> = results.rows.iter().map(|r| r.part_a.as_str()).collect();
    // 42 customers ranks above 7.
    assert_eq!(parts, vec!["47833556", "47830007"]);
}

/// Search is case-insensitive on part identifiers.
#[test]
fn search_is_case_insensitive() {
    let csv = "\
Part_1,Part_2,Customers
AB-100x,ZZ,3
other,ab-100X,5
";
    let catalog = catalog_from(csv);
    let results = catalog.search_ranked_by_customers("Ab-100", 10);
    assert_eq!(results.total_matches, 2);
}

/// Matches with a missing or zero customer count are cleaned out
/// before ranking.
#[test]
fn search_excludes_missing_and_zero_customers() {
    let catalog = catalog_from(SNAPSHOT);
    // 40000004 has a blank count, 60000006 has zero; neither may match.
    assert_eq!(catalog.search_ranked_by_customers("40000004", 10).total_matches, 0);
    assert_eq!(catalog.search_ranked_by_customers("60000006", 10).total_matches, 0);
}

/// The true total is reported even when results are truncated.
#[test]
fn search_reports_total_when_truncated() {
    let catalog = catalog_from(SNAPSHOT);
    // "0000" survives cleaning for 10000001/20000002 and 47830007/30000003.
    let results = catalog.search_ranked_by_customers("0000", 1);

    assert_eq!(results.rows.len(), 1);
    assert_eq!(results.total_matches, 2);
    assert!(
        results.total_matches > results.rows.len(),
        "expected more matches ({}) than shown ({})",
        results.total_matches,
        results.rows.len()
    );
}

/// The branch-tracking variant ranks the same cleaned matches by
/// confidence instead of customer count.
#[test]
fn search_ranked_by_confidence_uses_confidence_order() {
    let catalog = catalog_from(SNAPSHOT);
    let by_customers = catalog.search_ranked_by_customers("0000", 10);
    let by_confidence = catalog.search_ranked_by_confidence("0000", 10);

    assert_eq!(by_customers.total_matches, by_confidence.total_matches);
    let top_customers = by_customers.rows[0].customer_count.unwrap();
    assert_eq!(top_customers, 130);
    let top_confidence = by_confidence.rows[0].confidence.unwrap();
    assert_eq!(top_confidence, 91.2);
}

/// With no customer column at all, search hands back raw matches and
/// flags the result instead of failing.
#[test]
fn search_degrades_without_customer_column() {
    let csv = "\
Part_1,Part_2
47833556,99112233
";
    let catalog = catalog_from(csv);
    let results = catalog.search_ranked_by_customers("4783", 10);

    assert!(results.degraded);
    assert_eq!(results.total_matches, 1);
}

/// floor(12600 / 42) = 300. Without a positive count the raw revenue
/// value passes through untouched.
#[test]
fn per_unit_revenue_floors_when_count_present() {
    let catalog = catalog_from(SNAPSHOT);
    let row = &catalog.rows()[0];
    assert_eq!(row.per_unit_revenue(), Some(300.0));

    // Blank customer count: raw revenue passes through.
    let row = &catalog.rows()[3];
    assert_eq!(row.per_unit_revenue(), Some(800.0));

    // Zero customer count: raw revenue passes through.
    let row = &catalog.rows()[4];
    assert_eq!(row.per_unit_revenue(), Some(5000.0));
}

/// Overview aggregates sum what is present and skip what is not.
#[test]
fn overview_aggregates_resolved_columns() {
    let catalog = catalog_from(SNAPSHOT);
    let overview = catalog.overview();

    assert_eq!(overview.total_bundles, 5);
    assert_eq!(overview.total_customers, Some(42 + 130 + 7 + 0));
    assert_eq!(overview.total_revenue, Some(12600.0 + 9100.0 + 2100.0 + 800.0 + 5000.0));
    let avg = overview.avg_confidence.unwrap();
    assert!((avg - (87.5 + 76.0 + 91.2 + 64.0 + 99.9) / 5.0).abs() < 1e-9);
}

#[test]
fn overview_without_columns_is_none() {
    let catalog = catalog_from("Part_1,Part_2\nA,B\n");
    let overview = catalog.overview();

    assert_eq!(overview.total_bundles, 1);
    assert!(overview.total_customers.is_none());
    assert!(overview.avg_confidence.is_none());
    assert!(overview.total_revenue.is_none());
}

/// Bins are (0,50] (50,70] (70,80] (80,90] (90,100].
#[test]
fn confidence_distribution_bins() {
    let catalog = catalog_from(SNAPSHOT);
    // 87.5 -> (80,90], 76.0 -> (70,80], 91.2 -> (90,100],
    // 64.0 -> (50,70], 99.9 -> (90,100]
    assert_eq!(catalog.confidence_distribution(), [0, 1, 1, 1, 2]);
}

/// Filter clauses apply when their columns resolved; a missing column
/// disables its clause rather than matching nothing.
#[test]
fn filter_applies_resolved_clauses() {
    let catalog = catalog_from(SNAPSHOT);
    let rows = catalog.filter(80.0, 10);
    let parts: Vec<&str> = rows.iter().map(|r| r.part_a.as_str()).collect();
    assert_eq!(parts, vec!["47833556"]);

    let no_conf = catalog_from("Part_1,Part_2,Customers\nA,B,100\nC,D,5\n");
    let rows = no_conf.filter(99.0, 50);
    assert_eq!(rows.len(), 1, "confidence clause must be disabled, customer clause active");
    assert_eq!(rows[0].part_a, "A");
}

/// A missing dataset file is the one fatal error: queries cannot run.
#[test]
fn missing_dataset_is_unavailable() {
    let err = BundleCatalog::load_path(
        "/nonexistent/bundle_analysis.csv",
        &FieldAliases::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DeskError::DatasetUnavailable { .. }));
}
