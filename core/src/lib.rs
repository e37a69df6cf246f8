//! Bundle-tracking core: CSV-backed bundle/part matching and the
//! branch sales ledger.
//!
//! Subsystems:
//!   - `schema`  — logical-field resolution over loosely named columns
//!   - `catalog` — ranked top-N and part-number search over a snapshot
//!   - `ledger`  — append-only "marked sold" events, branch aggregates
//!   - `branch`  — branch directory and validated sessions
//!   - `rollup`  — cross-branch admin aggregates
//!
//! The presentation layer (pages, auth UI, charts) lives outside this
//! crate and calls the query surface re-exported below.

pub mod branch;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod rollup;
pub mod schema;
pub mod store;
pub mod types;

pub use branch::{BranchDirectory, BranchSession};
pub use catalog::{BundleCatalog, BundleRow, RankMetric};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DeskConfig;
pub use error::{DeskError, DeskResult};
pub use ledger::{SalesLedger, TimeWindow};
pub use store::LedgerStore;
