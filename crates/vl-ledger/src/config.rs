use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vl_store::SyncMode;
use vl_types::DigestAlgorithm;

use crate::error::{LedgerError, LedgerResult};

/// File name the CLI uses for the ledger configuration.
pub const CONFIG_FILE: &str = "vledger.toml";

/// Ledger configuration, stored as TOML.
///
/// ```toml
/// algorithm = "sha256"
///
/// [store]
/// path = "leaves.vlh"
/// sync_mode = "every_write"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Digest used for every leaf and node hash. Fixed for the ledger's life.
    pub algorithm: DigestAlgorithm,
    pub store: StoreConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Hash file location. Relative paths resolve against the config's directory.
    pub path: PathBuf,
    pub sync_mode: SyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("leaves.vlh"),
            sync_mode: SyncMode::default(),
        }
    }
}

impl LedgerConfig {
    /// Read a configuration file.
    pub fn load(path: &Path) -> LedgerResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> LedgerResult<Self> {
        toml::from_str(text).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> LedgerResult<String> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> LedgerResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LedgerError::Config(format!("{}: {e}", parent.display())))?;
        }
        fs::write(path, self.to_toml()?)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))
    }

    /// The store path, resolved against `base` when relative.
    pub fn store_path(&self, base: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            base.join(&self.store.path)
        }
    }
}
