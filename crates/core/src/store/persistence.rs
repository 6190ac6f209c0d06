//! Where committed snapshots go.

use super::data::ClinicData;
use crate::{ClinicError, ClinicResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable backing for a [`Database`](super::Database).
///
/// `save` is called with the full post-transaction state while the write lock is held. If it
/// returns an error the transaction is discarded and the in-memory state is left untouched.
pub trait Persistence: Send + Sync + std::fmt::Debug {
    /// Returns the last saved snapshot, or `None` when nothing has been saved yet.
    fn load(&self) -> ClinicResult<Option<ClinicData>>;

    fn save(&self, data: &ClinicData) -> ClinicResult<()>;
}

/// Keeps nothing. Used by tests and throwaway sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemory;

impl Persistence for InMemory {
    fn load(&self) -> ClinicResult<Option<ClinicData>> {
        Ok(None)
    }

    fn save(&self, _data: &ClinicData) -> ClinicResult<()> {
        Ok(())
    }
}

/// Single YAML snapshot file, replaced atomically on every commit.
///
/// The snapshot is written to a sibling `.tmp` file, flushed, then renamed over the live file,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct YamlSnapshot {
    path: PathBuf,
}

impl YamlSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Persistence for YamlSnapshot {
    fn load(&self) -> ClinicResult<Option<ClinicData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).map_err(ClinicError::FileRead)?;
        let data = serde_yaml::from_str(&raw).map_err(ClinicError::YamlDeserialization)?;
        Ok(Some(data))
    }

    fn save(&self, data: &ClinicData) -> ClinicResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ClinicError::StorageDirCreation)?;
        }
        let yaml = serde_yaml::to_string(data).map_err(ClinicError::YamlSerialization)?;

        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).map_err(ClinicError::FileWrite)?;
        file.write_all(yaml.as_bytes())
            .map_err(ClinicError::FileWrite)?;
        file.sync_all().map_err(ClinicError::FileWrite)?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(ClinicError::FileWrite(e));
        }
        Ok(())
    }
}
