//! Schema resolution — maps logical fields onto whatever columns a
//! dataset snapshot actually carries.
//!
//! Column names in exported snapshots drift (`Part_1`, `part1`,
//! `PartNumber1`, truncated headers, ...), so each logical field has an
//! ordered list of candidate substrings. Resolution is case-insensitive
//! and deterministic: candidates are tried in priority order, and for
//! each candidate the columns are scanned in declared order; the first
//! containing column wins. A field that matches nothing is simply
//! absent from the map — callers degrade per-field, they never fail.

use std::collections::HashMap;

/// Logical fields the subsystem understands. A snapshot may carry any
/// subset of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    PartA,
    PartB,
    CustomerCount,
    Confidence,
    Revenue,
    DescriptionA,
    DescriptionB,
    ManufacturerA,
    ManufacturerB,
}

impl LogicalField {
    pub const ALL: [LogicalField; 9] = [
        LogicalField::PartA,
        LogicalField::PartB,
        LogicalField::CustomerCount,
        LogicalField::Confidence,
        LogicalField::Revenue,
        LogicalField::DescriptionA,
        LogicalField::DescriptionB,
        LogicalField::ManufacturerA,
        LogicalField::ManufacturerB,
    ];

    /// Key used in config overrides and log lines.
    pub fn key(&self) -> &'static str {
        match self {
            LogicalField::PartA => "part_a",
            LogicalField::PartB => "part_b",
            LogicalField::CustomerCount => "customer_count",
            LogicalField::Confidence => "confidence",
            LogicalField::Revenue => "revenue",
            LogicalField::DescriptionA => "description_a",
            LogicalField::DescriptionB => "description_b",
            LogicalField::ManufacturerA => "manufacturer_a",
            LogicalField::ManufacturerB => "manufacturer_b",
        }
    }

    pub fn from_key(key: &str) -> Option<LogicalField> {
        LogicalField::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Default candidate substrings, most specific first.
    fn default_candidates(&self) -> &'static [&'static str] {
        match self {
            LogicalField::PartA => &["part_1", "part1", "partnumber1"],
            LogicalField::PartB => &["part_2", "part2", "partnumber2"],
            LogicalField::CustomerCount => &["customer", "customers", "customer_base"],
            LogicalField::Confidence => &["confidence", "enhanced_confidence", "conf"],
            LogicalField::Revenue => &["revenue", "annual_revenue", "revenue_potential"],
            LogicalField::DescriptionA => {
                &["description_1", "desc_1", "desc1", "part1_desc", "part_1_description"]
            }
            LogicalField::DescriptionB => {
                &["description_2", "desc_2", "desc2", "part2_desc", "part_2_description"]
            }
            LogicalField::ManufacturerA => &["manufacturer_1", "mfg_1", "brand_1"],
            LogicalField::ManufacturerB => &["manufacturer_2", "mfg_2", "brand_2"],
        }
    }
}

/// Ordered candidate lists per logical field. Substring matching can
/// bind a superficially similar column (`confidence_delta` before
/// `confidence`), so lists are overridable per deployment.
#[derive(Debug, Clone)]
pub struct FieldAliases {
    candidates: HashMap<LogicalField, Vec<String>>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        let candidates = LogicalField::ALL
            .iter()
            .map(|f| {
                (
                    *f,
                    f.default_candidates().iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self { candidates }
    }
}

impl FieldAliases {
    /// Replace one field's candidate list (the config override path).
    pub fn set(&mut self, field: LogicalField, candidates: Vec<String>) {
        self.candidates.insert(field, candidates);
    }

    pub fn candidates(&self, field: LogicalField) -> &[String] {
        self.candidates.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A column bound to a logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub name: String,
    pub index: usize,
}

/// The resolved mapping for one snapshot. Inspectable so a deployment
/// can verify what actually got bound before trusting ranked output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    resolved: HashMap<LogicalField, ResolvedColumn>,
}

impl FieldMap {
    pub fn column(&self, field: LogicalField) -> Option<&ResolvedColumn> {
        self.resolved.get(&field)
    }

    pub fn index(&self, field: LogicalField) -> Option<usize> {
        self.resolved.get(&field).map(|c| c.index)
    }

    pub fn is_resolved(&self, field: LogicalField) -> bool {
        self.resolved.contains_key(&field)
    }
}

/// Resolve every logical field against the snapshot's declared columns.
/// Never fails; unmatched fields are absent from the returned map.
pub fn resolve(columns: &[String], aliases: &FieldAliases) -> FieldMap {
    let lowered: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
    let mut resolved = HashMap::new();

    for field in LogicalField::ALL {
        let hit = aliases.candidates(field).iter().find_map(|candidate| {
            let needle = candidate.to_lowercase();
            lowered.iter().position(|col| col.contains(&needle))
        });
        match hit {
            Some(index) => {
                resolved.insert(
                    field,
                    ResolvedColumn {
                        name: columns[index].clone(),
                        index,
                    },
                );
            }
            None => log::debug!("no column matched logical field '{}'", field.key()),
        }
    }

    FieldMap { resolved }
}
