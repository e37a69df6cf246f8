//! Deployment configuration — file locations and schema alias
//! overrides, loadable from an optional JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::schema::{FieldAliases, LogicalField};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub data_dir: PathBuf,
    /// Bundle/compatibility snapshot, relative to `data_dir`.
    pub bundle_file: String,
    /// Branch directory CSV, relative to `data_dir`. A missing file
    /// falls back to the shipped branch list.
    pub branch_file: String,
    /// Sales ledger CSV, relative to `data_dir`. Created on first sale.
    pub ledger_file: String,
    /// Candidate-substring overrides keyed by logical field name
    /// (e.g. "confidence"). An entry replaces that field's default
    /// list, so a deployment can pin an exact column when substring
    /// matching would bind the wrong one.
    pub aliases: HashMap<String, Vec<String>>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bundle_file: "bundle_analysis.csv".into(),
            branch_file: "branch_list.csv".into(),
            ledger_file: "bundle_sales_log.csv".into(),
            aliases: HashMap::new(),
        }
    }
}

impl DeskConfig {
    /// Read from a JSON config file; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.data_dir.join(&self.bundle_file)
    }

    pub fn branch_path(&self) -> PathBuf {
        self.data_dir.join(&self.branch_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }

    /// Default alias lists with this config's overrides applied.
    pub fn field_aliases(&self) -> FieldAliases {
        let mut aliases = FieldAliases::default();
        for (key, candidates) in &self.aliases {
            match LogicalField::from_key(key) {
                Some(field) => aliases.set(field, candidates.clone()),
                None => log::warn!("ignoring alias override for unknown field '{key}'"),
            }
        }
        aliases
    }
}
