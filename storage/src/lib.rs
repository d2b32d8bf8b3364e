//! Sysres Storage Layer - File-Based Snapshots
//!
//! Persistence model of the local simulator:
//! - Contract state and the in-memory host stay in memory during a call
//! - Every committed call writes a new snapshot named after the state version
//! - The latest snapshot is loaded on startup

use chrono::{DateTime, Utc};
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use sysres_core::MemoryHost;
use system_contract::SystemState;
use thiserror::Error;

const SNAPSHOT_PREFIX: &str = "state-";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Everything needed to resume a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub taken_at: DateTime<Utc>,
    pub state: SystemState,
    pub host: MemoryHost,
}

impl Snapshot {
    pub fn new(state: SystemState, host: MemoryHost) -> Self {
        Self {
            version: state.global.version,
            taken_at: Utc::now(),
            state,
            host,
        }
    }

    /// File stem the snapshot is stored under; sorts by version
    pub fn name(&self) -> String {
        format!("{}{:012}", SNAPSHOT_PREFIX, self.version)
    }
}

/// Directory of versioned snapshots
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Open storage directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self { data_dir })
    }

    /// Save a snapshot (JSON for readability, Bincode for speed); returns its name
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<String> {
        let name = snapshot.name();
        self.write(&name, snapshot)?;
        debug!("saved snapshot {} to {}", name, self.data_dir.display());
        Ok(name)
    }

    /// Load a snapshot (tries Bincode first, falls back to JSON)
    pub fn load_snapshot(&self, name: &str) -> Result<Snapshot> {
        self.read(name)
    }

    /// Most recent snapshot, if any was saved
    pub fn load_latest(&self) -> Result<Option<Snapshot>> {
        match self.list_snapshots()?.last() {
            Some(name) => self.load_snapshot(name).map(Some),
            None => Ok(None),
        }
    }

    /// Check if snapshot exists
    pub fn has_snapshot(&self, name: &str) -> bool {
        self.bin_path(name).exists() || self.json_path(name).exists()
    }

    /// Snapshot names, oldest first
    pub fn list_snapshots(&self) -> Result<Vec<String>> {
        let mut snapshots = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();

            if let Some(name) = path.file_stem().and_then(|name| name.to_str()) {
                if name.starts_with(SNAPSHOT_PREFIX) && !snapshots.iter().any(|s| s == name) {
                    snapshots.push(name.to_string());
                }
            }
        }

        snapshots.sort();
        Ok(snapshots)
    }

    /// Delete a snapshot
    pub fn delete_snapshot(&self, name: &str) -> Result<()> {
        let bin_path = self.bin_path(name);
        let json_path = self.json_path(name);

        if bin_path.exists() {
            fs::remove_file(bin_path)?;
        }
        if json_path.exists() {
            fs::remove_file(json_path)?;
        }

        Ok(())
    }

    /// Keep only the newest `keep` snapshots; returns how many were removed
    pub fn prune(&self, keep: usize) -> Result<usize> {
        let snapshots = self.list_snapshots()?;
        let excess = snapshots.len().saturating_sub(keep);
        for name in &snapshots[..excess] {
            self.delete_snapshot(name)?;
        }
        if excess > 0 {
            debug!("pruned {} snapshots", excess);
        }
        Ok(excess)
    }

    /// Get storage directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn write<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(self.json_path(name), json)?;

        let bin = bincode::serialize(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(self.bin_path(name), bin)?;

        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let bin_path = self.bin_path(name);
        let json_path = self.json_path(name);

        if bin_path.exists() {
            let data = fs::read(&bin_path)?;
            return bincode::deserialize(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        if json_path.exists() {
            let data = fs::read_to_string(&json_path)?;
            return serde_json::from_str(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        Err(StorageError::SnapshotNotFound(name.to_string()))
    }

    fn bin_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.bin", name))
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }
}
