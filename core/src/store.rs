//! Ledger persistence layer.
//!
//! RULE: Only store.rs touches the ledger file.
//! The ledger subsystem calls store methods — it never does file I/O.
//!
//! Writes are strictly append-only: one record is appended and flushed
//! per call, so there is no load-append-rewrite window for a concurrent
//! writer to fall into, and an internal mutex serializes writers within
//! the process. Reads are tolerant: rows that fail to decode are
//! skipped with a warning, never fatal.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::DeskResult;
use crate::ledger::SaleEvent;

/// Timestamp layout used in the ledger file. Zero-padded so rows sort
/// lexicographically.
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ledger column order. External consumers read this file directly.
const LEDGER_HEADERS: [&str; 9] = [
    "timestamp",
    "branch_name",
    "bundle_id",
    "part1",
    "part2",
    "customers",
    "confidence",
    "revenue_estimate",
    "status",
];

/// One decoded ledger row. The raw timestamp string is kept alongside
/// the parsed value: an unparsable timestamp drops the row out of
/// windowed aggregates but not out of the read path.
#[derive(Debug, Clone, Serialize)]
pub struct SaleRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub raw_timestamp: String,
    pub branch_name: String,
    pub bundle_id: String,
    pub part1: String,
    pub part2: String,
    pub customers: Option<u64>,
    pub confidence: Option<f64>,
    pub revenue_estimate: Option<f64>,
    pub status: String,
}

/// Wire shape: every ledger cell as written, one string per column.
#[derive(Debug, Serialize, Deserialize)]
struct WireRow {
    timestamp: String,
    branch_name: String,
    bundle_id: String,
    part1: String,
    part2: String,
    customers: String,
    confidence: String,
    revenue_estimate: String,
    status: String,
}

impl WireRow {
    fn from_event(event: &SaleEvent) -> Self {
        Self {
            timestamp: event.timestamp.clone(),
            branch_name: event.branch_name.clone(),
            bundle_id: event.bundle_id.clone(),
            part1: event.part1.clone(),
            part2: event.part2.clone(),
            customers: event.customers.map(|n| n.to_string()).unwrap_or_default(),
            confidence: event.confidence.map(|v| v.to_string()).unwrap_or_default(),
            revenue_estimate: event
                .revenue_estimate
                .map(|v| v.to_string())
                .unwrap_or_default(),
            status: event.status.clone(),
        }
    }

    fn into_record(self) -> SaleRecord {
        let parsed = NaiveDateTime::parse_from_str(&self.timestamp, LEDGER_TIMESTAMP_FORMAT).ok();
        SaleRecord {
            timestamp: parsed,
            raw_timestamp: self.timestamp,
            branch_name: self.branch_name,
            bundle_id: self.bundle_id,
            part1: self.part1,
            part2: self.part2,
            customers: self
                .customers
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64),
            confidence: self.confidence.trim().parse().ok(),
            revenue_estimate: self.revenue_estimate.trim().parse().ok(),
            status: self.status,
        }
    }
}

enum Backend {
    File(PathBuf),
    Memory(Vec<u8>),
}

pub struct LedgerStore {
    backend: Mutex<Backend>,
}

impl LedgerStore {
    /// File-backed store. The file need not exist yet; it is created
    /// with a header row on first append.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            backend: Mutex::new(Backend::File(path.as_ref().to_path_buf())),
        }
    }

    /// In-memory store (used in tests).
    pub fn in_memory() -> Self {
        Self {
            backend: Mutex::new(Backend::Memory(Vec::new())),
        }
    }

    /// Append one event and flush. Never rewrites existing rows.
    pub fn append(&self, event: &SaleEvent) -> DeskResult<()> {
        let wire = WireRow::from_event(event);
        let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);

        match &mut *backend {
            Backend::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(&*path)?;
                let fresh = file.metadata()?.len() == 0;
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(file);
                if fresh {
                    writer.write_record(LEDGER_HEADERS)?;
                }
                writer.serialize(&wire)?;
                writer.flush()?;
            }
            Backend::Memory(buffer) => {
                let fresh = buffer.is_empty();
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(&mut *buffer);
                if fresh {
                    writer.write_record(LEDGER_HEADERS)?;
                }
                writer.serialize(&wire)?;
                writer.flush()?;
            }
        }
        Ok(())
    }

    /// Every decodable row in append order. A missing or empty backing
    /// file reads as an empty ledger; malformed rows are skipped.
    pub fn read_all(&self) -> DeskResult<Vec<SaleRecord>> {
        let raw = {
            let backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
            match &*backend {
                Backend::File(path) => {
                    if !path.exists() {
                        return Ok(Vec::new());
                    }
                    std::fs::read(path)?
                }
                Backend::Memory(buffer) => buffer.clone(),
            }
        };
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_reader(raw.as_slice());
        let mut records = Vec::new();
        for row in reader.deserialize::<WireRow>() {
            match row {
                Ok(wire) => records.push(wire.into_record()),
                Err(e) => log::warn!("skipping malformed ledger row: {e}"),
            }
        }
        Ok(records)
    }
}
