//! Transactional record store.
//!
//! All clinic collections live in one [`ClinicData`] value behind a lock. Reads see a consistent
//! snapshot. Writes go through [`Database::transact`], which applies the closure to a private copy,
//! hands the copy to the configured [`Persistence`], and only then publishes it. Either every
//! change in a transaction becomes visible or none does, and writers are serialised so concurrent
//! read-modify-write sequences cannot interleave.

mod data;
mod persistence;

pub use data::ClinicData;
pub use persistence::{InMemory, Persistence, YamlSnapshot};

use crate::diagnosis::DiagnosisCode;
use crate::{ClinicError, ClinicResult};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug)]
pub struct Database {
    data: RwLock<ClinicData>,
    diagnosis_codes: RwLock<Arc<Vec<DiagnosisCode>>>,
    persistence: Box<dyn Persistence>,
}

impl Database {
    /// Opens a store over `persistence`, loading the last saved snapshot if there is one.
    pub fn open(persistence: Box<dyn Persistence>) -> ClinicResult<Self> {
        let data = persistence.load()?.unwrap_or_default();
        tracing::info!(
            patients = data.patients.len(),
            visits = data.visits.len(),
            medicines = data.medicines.len(),
            "clinic store opened"
        );
        Ok(Self {
            data: RwLock::new(data),
            diagnosis_codes: RwLock::new(Arc::new(Vec::new())),
            persistence,
        })
    }

    /// Opens the YAML snapshot at `path`.
    pub fn open_snapshot(path: &Path) -> ClinicResult<Self> {
        Self::open(Box::new(YamlSnapshot::new(path)))
    }

    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(ClinicData::default()),
            diagnosis_codes: RwLock::new(Arc::new(Vec::new())),
            persistence: Box::new(InMemory),
        }
    }

    /// Runs `f` against a consistent snapshot.
    pub fn read<T>(&self, f: impl FnOnce(&ClinicData) -> T) -> ClinicResult<T> {
        let guard = self.data.read().map_err(|_| ClinicError::LockPoisoned)?;
        Ok(f(&guard))
    }

    /// Runs `f` as one all-or-nothing write.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or the persistence error if the snapshot could not be saved.
    /// In both cases no change made by `f` is visible afterwards.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut ClinicData) -> ClinicResult<T>,
    ) -> ClinicResult<T> {
        let mut guard = self.data.write().map_err(|_| ClinicError::LockPoisoned)?;
        let mut working = guard.clone();
        let out = f(&mut working)?;
        self.persistence.save(&working)?;
        *guard = working;
        Ok(out)
    }

    /// Replaces the diagnosis reference table.
    pub fn set_diagnosis_codes(&self, codes: Vec<DiagnosisCode>) -> ClinicResult<()> {
        let mut guard = self
            .diagnosis_codes
            .write()
            .map_err(|_| ClinicError::LockPoisoned)?;
        *guard = Arc::new(codes);
        Ok(())
    }

    pub fn diagnosis_codes(&self) -> ClinicResult<Arc<Vec<DiagnosisCode>>> {
        let guard = self
            .diagnosis_codes
            .read()
            .map_err(|_| ClinicError::LockPoisoned)?;
        Ok(Arc::clone(&guard))
    }
}

/// Offset/limit window over an already ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    pub fn apply<I: IntoIterator>(self, items: I) -> Vec<I::Item> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}
