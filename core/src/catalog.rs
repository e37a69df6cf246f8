//! Bundle catalog — a read-only view over one dataset snapshot.
//!
//! Loading parses every row; nothing is discarded up front. Cleaning
//! (dropping rows without a positive customer count) happens per query,
//! so a snapshot with patchy columns still serves whatever it can.

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::error::{DeskError, DeskResult};
use crate::schema::{self, FieldAliases, FieldMap, LogicalField};
use crate::types::RowIndex;

/// One bundle/compatibility record. Optional fields stay `None` when
/// the column is absent or the cell fails numeric coercion.
#[derive(Debug, Clone, Serialize)]
pub struct BundleRow {
    pub index: RowIndex,
    pub part_a: String,
    pub part_b: String,
    pub customer_count: Option<u64>,
    pub confidence: Option<f64>,
    pub revenue_estimate: Option<f64>,
    pub description_a: Option<String>,
    pub description_b: Option<String>,
    pub manufacturer_a: Option<String>,
    pub manufacturer_b: Option<String>,
}

impl BundleRow {
    /// Derived per-unit revenue. The snapshot's revenue column is an
    /// aggregate across customers in some exports and a per-unit figure
    /// in others, so both readings stay exposed: `revenue_estimate`
    /// holds the raw value, and this returns floor(revenue / customers)
    /// when a positive count exists, else the raw value unchanged.
    pub fn per_unit_revenue(&self) -> Option<f64> {
        match (self.revenue_estimate, self.customer_count) {
            (Some(revenue), Some(count)) if count > 0 => Some((revenue / count as f64).floor()),
            (revenue, _) => revenue,
        }
    }
}

/// Metric for ranked top-N queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    Confidence,
    CustomerCount,
}

impl RankMetric {
    fn field(&self) -> LogicalField {
        match self {
            RankMetric::Confidence => LogicalField::Confidence,
            RankMetric::CustomerCount => LogicalField::CustomerCount,
        }
    }

    fn value(&self, row: &BundleRow) -> Option<f64> {
        match self {
            RankMetric::Confidence => row.confidence,
            RankMetric::CustomerCount => row.customer_count.map(|n| n as f64),
        }
    }

    /// Whether a row belongs in this metric's ranked view. Customer
    /// ranking also drops zero counts, matching the cleaning the
    /// search path applies.
    fn qualifies(&self, row: &BundleRow) -> bool {
        match self {
            RankMetric::Confidence => row.confidence.is_some(),
            RankMetric::CustomerCount => row.customer_count.map_or(false, |n| n > 0),
        }
    }
}

/// Rows from a top-N query. `degraded` means the metric's column never
/// resolved and the rows are in plain load order, unranked.
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    pub rows: Vec<&'a BundleRow>,
    pub degraded: bool,
}

/// Rows from a part-number search. `total_matches` counts every match
/// after cleaning, before truncation, so a consumer can report
/// "N total, showing top limit". `degraded` means the customer-count
/// column never resolved: matches are returned raw, unfiltered and
/// unranked.
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    pub rows: Vec<&'a BundleRow>,
    pub total_matches: usize,
    pub degraded: bool,
}

/// Snapshot-wide aggregates for the analyzer overview. Each value is
/// `None` when its column never resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogOverview {
    pub total_bundles: usize,
    pub total_customers: Option<u64>,
    pub avg_confidence: Option<f64>,
    pub total_revenue: Option<f64>,
}

#[derive(Debug)]
pub struct BundleCatalog {
    rows: Vec<BundleRow>,
    field_map: FieldMap,
}

impl BundleCatalog {
    /// Load a snapshot from disk. A missing file is the one fatal error
    /// in this subsystem: every query needs the dataset.
    pub fn load_path(path: impl AsRef<Path>, aliases: &FieldAliases) -> DeskResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DeskError::DatasetUnavailable {
                path: path.display().to_string(),
            });
        }
        let file = std::fs::File::open(path)?;
        let catalog = Self::load_reader(file, aliases)?;
        log::info!(
            "loaded {} bundle rows from {}",
            catalog.rows.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Load a snapshot from any reader (tests use string literals).
    pub fn load_reader(reader: impl Read, aliases: &FieldAliases) -> DeskResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let field_map = schema::resolve(&columns, aliases);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("skipping unreadable dataset row: {e}");
                    continue;
                }
            };
            rows.push(parse_row(rows.len(), &record, &field_map));
        }

        Ok(Self { rows, field_map })
    }

    pub fn rows(&self) -> &[BundleRow] {
        &self.rows
    }

    pub fn get(&self, index: RowIndex) -> Option<&BundleRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The columns each logical field actually bound to.
    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    /// Top `n` rows by `metric`, descending, ties in load order. Rows
    /// missing the metric are excluded. An unresolved metric column
    /// degrades to the first `n` rows in load order, flagged so the
    /// consumer can present the data as unranked.
    pub fn top_by_metric(&self, metric: RankMetric, n: usize) -> Ranking<'_> {
        if !self.field_map.is_resolved(metric.field()) {
            log::warn!(
                "'{}' column unresolved; serving first {n} rows unranked",
                metric.field().key()
            );
            return Ranking {
                rows: self.rows.iter().take(n).collect(),
                degraded: true,
            };
        }

        let mut ranked: Vec<&BundleRow> = self.rows.iter().filter(|r| metric.qualifies(r)).collect();
        sort_by_metric(&mut ranked, metric);
        ranked.truncate(n);
        Ranking {
            rows: ranked,
            degraded: false,
        }
    }

    /// Part-number search ranked by customer count (the search page's
    /// ordering).
    pub fn search_ranked_by_customers(&self, query: &str, limit: usize) -> SearchResults<'_> {
        self.search(query, limit, RankMetric::CustomerCount)
    }

    /// Part-number search ranked by confidence (the branch-tracking
    /// ordering). Cleaning is identical; only the sort key differs.
    pub fn search_ranked_by_confidence(&self, query: &str, limit: usize) -> SearchResults<'_> {
        self.search(query, limit, RankMetric::Confidence)
    }

    fn search(&self, query: &str, limit: usize, metric: RankMetric) -> SearchResults<'_> {
        let needle = query.to_lowercase();
        let matches = self.rows.iter().filter(|r| {
            r.part_a.to_lowercase().contains(&needle) || r.part_b.to_lowercase().contains(&needle)
        });

        // Without a customer column there is nothing to clean or rank
        // on; hand back the raw matches and say so.
        if !self.field_map.is_resolved(LogicalField::CustomerCount) {
            let rows: Vec<&BundleRow> = matches.collect();
            let total_matches = rows.len();
            return SearchResults {
                rows: rows.into_iter().take(limit).collect(),
                total_matches,
                degraded: true,
            };
        }

        let mut cleaned: Vec<&BundleRow> = matches
            .filter(|r| r.customer_count.map_or(false, |n| n > 0))
            .collect();
        let rank_resolved = self.field_map.is_resolved(metric.field());
        if rank_resolved {
            sort_by_metric(&mut cleaned, metric);
        }
        let total_matches = cleaned.len();
        cleaned.truncate(limit);
        SearchResults {
            rows: cleaned,
            total_matches,
            degraded: !rank_resolved,
        }
    }

    /// Snapshot-wide aggregates (the analyzer's header metrics).
    pub fn overview(&self) -> CatalogOverview {
        let total_customers = self
            .field_map
            .is_resolved(LogicalField::CustomerCount)
            .then(|| self.rows.iter().filter_map(|r| r.customer_count).sum::<u64>());

        let avg_confidence = if self.field_map.is_resolved(LogicalField::Confidence) {
            let values: Vec<f64> = self.rows.iter().filter_map(|r| r.confidence).collect();
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        } else {
            None
        };

        let total_revenue = self
            .field_map
            .is_resolved(LogicalField::Revenue)
            .then(|| self.rows.iter().filter_map(|r| r.revenue_estimate).sum::<f64>());

        CatalogOverview {
            total_bundles: self.rows.len(),
            total_customers,
            avg_confidence,
            total_revenue,
        }
    }

    /// Confidence histogram over the bins (0,50] (50,70] (70,80]
    /// (80,90] (90,100]. Values outside (0,100] fall in no bin.
    pub fn confidence_distribution(&self) -> [u64; 5] {
        const EDGES: [f64; 6] = [0.0, 50.0, 70.0, 80.0, 90.0, 100.0];
        let mut bins = [0u64; 5];
        for value in self.rows.iter().filter_map(|r| r.confidence) {
            for i in 0..5 {
                if value > EDGES[i] && value <= EDGES[i + 1] {
                    bins[i] += 1;
                    break;
                }
            }
        }
        bins
    }

    /// The analyzer's data-table filter. A clause whose column never
    /// resolved is disabled rather than filtering everything out.
    pub fn filter(&self, min_confidence: f64, min_customers: u64) -> Vec<&BundleRow> {
        let check_confidence = self.field_map.is_resolved(LogicalField::Confidence);
        let check_customers = self.field_map.is_resolved(LogicalField::CustomerCount);
        self.rows
            .iter()
            .filter(|r| {
                let conf_ok =
                    !check_confidence || r.confidence.map_or(false, |c| c >= min_confidence);
                let cust_ok =
                    !check_customers || r.customer_count.map_or(false, |n| n >= min_customers);
                conf_ok && cust_ok
            })
            .collect()
    }
}

/// Descending, stable: equal keys keep their load order.
fn sort_by_metric(rows: &mut [&BundleRow], metric: RankMetric) {
    rows.sort_by(|a, b| {
        let a_val = metric.value(a).unwrap_or(f64::NEG_INFINITY);
        let b_val = metric.value(b).unwrap_or(f64::NEG_INFINITY);
        b_val.partial_cmp(&a_val).unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn parse_row(index: RowIndex, record: &csv::StringRecord, map: &FieldMap) -> BundleRow {
    BundleRow {
        index,
        part_a: cell(record, map, LogicalField::PartA).unwrap_or_default(),
        part_b: cell(record, map, LogicalField::PartB).unwrap_or_default(),
        customer_count: cell(record, map, LogicalField::CustomerCount)
            .as_deref()
            .and_then(parse_count),
        confidence: cell(record, map, LogicalField::Confidence)
            .as_deref()
            .and_then(parse_float),
        revenue_estimate: cell(record, map, LogicalField::Revenue)
            .as_deref()
            .and_then(parse_float),
        description_a: cell(record, map, LogicalField::DescriptionA),
        description_b: cell(record, map, LogicalField::DescriptionB),
        manufacturer_a: cell(record, map, LogicalField::ManufacturerA),
        manufacturer_b: cell(record, map, LogicalField::ManufacturerB),
    }
}

fn cell(record: &csv::StringRecord, map: &FieldMap, field: LogicalField) -> Option<String> {
    map.index(field)
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Lenient count parse: exports write counts as "42" or "42.0", and a
/// negative or garbage cell degrades to absent.
fn parse_count(cell: &str) -> Option<u64> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

fn parse_float(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}
