//! Branch directory — the authoritative list of sales locations, and
//! the validated session handle a front end threads through writes.

use std::path::Path;

use crate::catalog::BundleRow;
use crate::clock::Clock;
use crate::error::{DeskError, DeskResult};
use crate::ledger::{SaleEvent, SalesLedger};
use crate::types::BranchName;

/// Shipped list used when no directory file is deployed.
pub const FALLBACK_BRANCHES: [&str; 18] = [
    "Cambridge",
    "Marietta",
    "Holt",
    "Monroe",
    "Mentor",
    "Brunswick",
    "Gallipolis",
    "North Canton",
    "Evansville",
    "Dublin",
    "Perrysburg",
    "Burlington",
    "Indianapolis",
    "Fort Wayne",
    "Heath",
    "Mansfield",
    "Novi",
    "South Charleston",
];

pub struct BranchDirectory {
    branches: Vec<BranchName>,
}

impl BranchDirectory {
    /// Load from a CSV with a `branch_name` column. A missing file, or
    /// a file without that column, falls back to the shipped list.
    pub fn load(path: impl AsRef<Path>) -> DeskResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "no branch directory at {}; using fallback list",
                path.display()
            );
            return Ok(Self::fallback());
        }

        let mut reader = csv::Reader::from_path(path)?;
        let column = reader
            .headers()?
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("branch_name"));
        let Some(column) = column else {
            log::warn!(
                "{} has no branch_name column; using fallback list",
                path.display()
            );
            return Ok(Self::fallback());
        };

        let mut names = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(name) = record.get(column) {
                names.push(name.to_string());
            }
        }
        Ok(Self::from_names(names))
    }

    pub fn fallback() -> Self {
        Self::from_names(FALLBACK_BRANCHES.iter().map(|s| s.to_string()))
    }

    /// Build from explicit names, preserving order and dropping blanks
    /// and duplicates.
    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let mut branches: Vec<BranchName> = Vec::new();
        for name in names {
            let name = name.trim();
            if !name.is_empty() && !branches.iter().any(|b| b == name) {
                branches.push(name.to_string());
            }
        }
        Self { branches }
    }

    /// Branch names in directory order.
    pub fn list(&self) -> &[BranchName] {
        &self.branches
    }

    pub fn contains(&self, name: &str) -> bool {
        self.branches.iter().any(|b| b == name)
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Validate a branch name and hand back a session for it. The
    /// session replaces the old ambient login flags: it is an explicit
    /// value, created only through this check, that callers pass into
    /// ledger writes.
    pub fn open_session(&self, name: &str) -> DeskResult<BranchSession> {
        if !self.contains(name) {
            return Err(DeskError::UnknownBranch {
                name: name.to_string(),
            });
        }
        Ok(BranchSession {
            branch: name.to_string(),
        })
    }
}

/// Proof that a branch name passed the directory check.
#[derive(Debug, Clone)]
pub struct BranchSession {
    branch: BranchName,
}

impl BranchSession {
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Record a sale under this session's branch.
    pub fn record_sale(
        &self,
        ledger: &SalesLedger,
        row: &BundleRow,
        clock: &dyn Clock,
    ) -> DeskResult<SaleEvent> {
        ledger.record_sale(&self.branch, row, clock)
    }
}
