//! Shared primitive types used across the bundle-tracking core.

/// A branch (physical sales location) name, the ledger's scoping key.
pub type BranchName = String;

/// Position of a row within its source dataset snapshot.
pub type RowIndex = usize;
