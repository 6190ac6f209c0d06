//! Medicine catalog and stock ledger.
//!
//! Stock only goes down through the visit commit. This service adds stock (restock), maintains
//! catalog entries and reports what is running low.

use crate::config::CoreConfig;
use crate::medicine::{low_stock, Medicine, MedicineForm};
use crate::session::{AuthService, Session};
use crate::store::Database;
use crate::{ClinicError, ClinicResult};
use chrono::Utc;
use clinic_uuid::RecordId;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct StockService {
    cfg: Arc<CoreConfig>,
    db: Arc<Database>,
    auth: AuthService,
}

impl StockService {
    pub fn new(cfg: Arc<CoreConfig>, db: Arc<Database>, auth: AuthService) -> Self {
        Self { cfg, db, auth }
    }

    /// Catalog ordered by name.
    pub fn list(&self) -> ClinicResult<Vec<Medicine>> {
        self.db.read(|d| {
            let mut all: Vec<Medicine> = d.medicines.values().cloned().collect();
            all.sort_by(|a, b| a.name.cmp(&b.name));
            all
        })
    }

    pub fn get(&self, id: &RecordId) -> ClinicResult<Medicine> {
        self.db.read(|d| d.medicine(id).cloned())?
    }

    pub fn create(&self, session: &Session, form: &MedicineForm) -> ClinicResult<Medicine> {
        self.auth.revalidate(session)?;
        let form = form.validated()?;
        let medicine = Medicine {
            id: RecordId::new(),
            name: form.name,
            unit: form.unit,
            price_per_unit: form.price_per_unit,
            stock_qty: form.stock_qty,
            instruction: form.instruction,
            created_at: Utc::now(),
        };
        self.db.transact(|d| {
            d.medicines.insert(medicine.id, medicine.clone());
            Ok(())
        })?;
        tracing::info!(name = %medicine.name, stock = medicine.stock_qty, "medicine added");
        Ok(medicine)
    }

    /// Replaces a catalog entry. Prices already copied onto prescriptions are unaffected.
    pub fn update(
        &self,
        session: &Session,
        id: &RecordId,
        form: &MedicineForm,
    ) -> ClinicResult<Medicine> {
        self.auth.revalidate(session)?;
        let form = form.validated()?;
        self.db.transact(|d| {
            let medicine = d.medicine_mut(id)?;
            medicine.name = form.name.clone();
            medicine.unit = form.unit.clone();
            medicine.price_per_unit = form.price_per_unit;
            medicine.stock_qty = form.stock_qty;
            medicine.instruction = form.instruction.clone();
            Ok(medicine.clone())
        })
    }

    /// Removes a catalog entry that no prescription refers to.
    pub fn delete(&self, session: &Session, id: &RecordId) -> ClinicResult<()> {
        self.auth.revalidate(session)?;
        self.db.transact(|d| {
            d.medicine(id)?;
            if d.medicine_is_prescribed(id) {
                return Err(ClinicError::MedicineInUse(id.to_string()));
            }
            d.medicines.remove(id);
            Ok(())
        })
    }

    /// Adds `qty` units to stock and returns the new level.
    pub fn restock(&self, session: &Session, id: &RecordId, qty: i64) -> ClinicResult<u32> {
        self.auth.revalidate(session)?;
        let qty = u32::try_from(qty)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                ClinicError::InvalidInput("restock quantity must be a positive whole number".into())
            })?;

        let level = self.db.transact(|d| {
            let medicine = d.medicine_mut(id)?;
            medicine.stock_qty = medicine
                .stock_qty
                .checked_add(qty)
                .ok_or_else(|| crate::error::overflow("stock level"))?;
            Ok(medicine.stock_qty)
        })?;
        tracing::info!(medicine_id = %id, added = qty, level, "medicine restocked");
        Ok(level)
    }

    /// Medicines strictly below the configured threshold, lowest stock first.
    pub fn low_stock_alerts(&self) -> ClinicResult<Vec<Medicine>> {
        let threshold = self.cfg.low_stock_threshold();
        self.db.read(|d| low_stock(d.medicines.values(), threshold))
    }
}
