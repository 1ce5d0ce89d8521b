use crate::{
    error::{AppResult, ErrorReason},
    types::{normalize_category, CertificatePatch, CertificateRecord},
};
use std::collections::HashSet;

mod seed;
mod storage;

pub use seed::load_default_dataset;
pub use storage::*;

/// Result of a mutation that was applied in memory. A persistence failure
/// does not undo the mutation; it is handed back as a warning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationOutcome {
    pub changed: bool,
    pub persist_warning: Option<String>,
}

impl MutationOutcome {
    fn unchanged() -> Self {
        Self {
            changed: false,
            persist_warning: None,
        }
    }
}

/// Sole owner of the certificate collection.
#[derive(Debug)]
pub struct CertificateStore<S> {
    records: Vec<CertificateRecord>,
    storage: S,
}

impl<S: CatalogStorage> CertificateStore<S> {
    /// Load the persisted catalog, falling back to `defaults` when nothing was
    /// persisted or the persisted document is unreadable.
    pub fn load(storage: S, defaults: Vec<CertificateRecord>) -> Self {
        let records = match storage.load() {
            Ok(Some(records)) => {
                info!("Loaded {} certificates from storage", records.len());
                sanitize(records)
            }
            Ok(None) => {
                info!("No persisted catalog, using {} default certificates", defaults.len());
                sanitize(defaults)
            }
            Err(e) => {
                warn!("Failed to load certificates from storage: {}", e);
                sanitize(defaults)
            }
        };

        Self { records, storage }
    }

    pub fn records(&self) -> &[CertificateRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&CertificateRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Insert a new record at the front of the catalog.
    pub fn create(&mut self, mut record: CertificateRecord) -> AppResult<MutationOutcome> {
        record.validate()?;
        record.category = normalize_category(record.category);
        if self.get(&record.id).is_some() {
            return Err(ErrorReason::DuplicateId(record.id).into());
        }

        debug!("Creating certificate {}", record);
        self.records.insert(0, record);
        Ok(self.commit())
    }

    /// Merge `patch` over the record with the given id. The id itself is immutable.
    pub fn update(&mut self, id: &str, patch: CertificatePatch) -> AppResult<MutationOutcome> {
        let Some(index) = self.records.iter().position(|record| record.id == id) else {
            warn!("Update of unknown certificate {}", id);
            return Err(ErrorReason::NotFound(id.to_owned()).into());
        };

        let mut updated = self.records[index].clone();
        updated.apply(patch);
        updated.validate()?;

        debug!("Updating certificate {}", updated);
        self.records[index] = updated;
        Ok(self.commit())
    }

    /// Remove the record with the given id. Removing an unknown id is a no-op.
    pub fn delete(&mut self, id: &str) -> MutationOutcome {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        if self.records.len() == before {
            debug!("Delete of unknown certificate {} ignored", id);
            return MutationOutcome::unchanged();
        }

        debug!("Deleted certificate {}", id);
        self.commit()
    }

    /// Write the full collection to storage.
    pub fn persist(&mut self) -> AppResult<()> {
        self.storage.save(&self.records)
    }

    fn commit(&mut self) -> MutationOutcome {
        let persist_warning = match self.persist() {
            Ok(()) => None,
            Err(e) => {
                error!("Failed to persist certificates: {}", e);
                Some(e.to_string())
            }
        };

        MutationOutcome {
            changed: true,
            persist_warning,
        }
    }
}

/// Drop records that fail validation, then keep the first record of each id.
fn sanitize(records: Vec<CertificateRecord>) -> Vec<CertificateRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            if let Err(e) = record.validate() {
                warn!("Dropping invalid certificate {}: {}", record, e);
                return false;
            }
            let fresh = seen.insert(record.id.clone());
            if !fresh {
                warn!("Dropping duplicate certificate {}", record.id);
            }
            fresh
        })
        .collect()
}
