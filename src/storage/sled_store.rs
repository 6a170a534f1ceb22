//! Sled-backed well store
//!
//! Layout:
//! - `wells` tree: key = well id, value = JSON `Well`
//! - `drilling_parameters`, `well_logs`, `operations`, `witsml_data` trees:
//!   key = `<well id> 0x00 <sled-generated u64, big-endian>`, value = JSON row
//!
//! The generated id is monotonic, so a prefix scan returns a well's rows in
//! insertion order.
//!
//! Well updates, well removal and child inserts run as sled transactions
//! that read the `wells` entry, so a delete is never undone by a racing
//! write.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{Batch, Transactional, Tree};

use super::{StoreError, WellStore};
use crate::types::{DrillingParameter, Operation, Well, WellLog, WitsmlDataEntry};

const WELLS_TREE: &str = "wells";
const PARAMETERS_TREE: &str = "drilling_parameters";
const LOGS_TREE: &str = "well_logs";
const OPERATIONS_TREE: &str = "operations";
const WITSML_TREE: &str = "witsml_data";

fn abort<E: Into<StoreError>>(err: E) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(err.into())
}

fn tx_error(err: TransactionError<StoreError>) -> StoreError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => e.into(),
    }
}

/// Durable well store on an embedded sled database.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
    wells: Tree,
    parameters: Tree,
    logs: Tree,
    operations: Tree,
    witsml: Tree,
}

impl SledStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let store = Self {
            wells: db.open_tree(WELLS_TREE)?,
            parameters: db.open_tree(PARAMETERS_TREE)?,
            logs: db.open_tree(LOGS_TREE)?,
            operations: db.open_tree(OPERATIONS_TREE)?,
            witsml: db.open_tree(WITSML_TREE)?,
            db: Arc::new(db),
        };

        tracing::info!(path = ?path_ref, wells = store.wells.len(), "Well storage opened");
        Ok(store)
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Get database size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }

    fn child_prefix(well_id: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(well_id.len() + 1);
        prefix.extend_from_slice(well_id.as_bytes());
        prefix.push(0);
        prefix
    }

    fn child_key(&self, well_id: &str) -> Result<Vec<u8>, StoreError> {
        let mut key = Self::child_prefix(well_id);
        key.extend_from_slice(&self.db.generate_id()?.to_be_bytes());
        Ok(key)
    }

    fn insert_child<T: Serialize>(
        &self,
        tree: &Tree,
        well_id: &str,
        row: &T,
    ) -> Result<(), StoreError> {
        let key = self.child_key(well_id)?;
        let value = serde_json::to_vec(row)?;
        (&self.wells, tree)
            .transaction(
                |(wells, children)| -> ConflictableTransactionResult<(), StoreError> {
                    if wells.get(well_id.as_bytes())?.is_none() {
                        return Err(abort(StoreError::NotFound("Well")));
                    }
                    children.insert(key.as_slice(), value.as_slice())?;
                    Ok(())
                },
            )
            .map_err(tx_error)
    }

    fn scan_children<T: DeserializeOwned>(
        tree: &Tree,
        well_id: &str,
    ) -> Result<Vec<T>, StoreError> {
        let mut rows = Vec::new();
        for item in tree.scan_prefix(Self::child_prefix(well_id)) {
            let (_key, value) = item?;
            match serde_json::from_slice::<T>(&value) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    tracing::warn!(well_id = %well_id, error = %e, "Skipping unreadable record");
                }
            }
        }
        Ok(rows)
    }

    fn clear_children(tree: &Tree, well_id: &str) -> Result<usize, StoreError> {
        let mut batch = Batch::default();
        let mut removed = 0;
        for item in tree.scan_prefix(Self::child_prefix(well_id)) {
            let (key, _value) = item?;
            batch.remove(key);
            removed += 1;
        }
        tree.apply_batch(batch)?;
        Ok(removed)
    }
}

impl WellStore for SledStore {
    fn backend_name(&self) -> &'static str {
        "Sled"
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.wells.first()?;
        Ok(())
    }

    fn all_wells(&self) -> Result<Vec<Well>, StoreError> {
        let mut wells = Vec::with_capacity(self.wells.len());
        for item in self.wells.iter() {
            let (_key, value) = item?;
            match serde_json::from_slice::<Well>(&value) {
                Ok(well) => wells.push(well),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable well record"),
            }
        }
        Ok(wells)
    }

    fn find_well(&self, id: &str) -> Result<Option<Well>, StoreError> {
        match self.wells.get(id.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn put_well(&self, well: &Well) -> Result<(), StoreError> {
        self.wells
            .insert(well.id.as_bytes(), serde_json::to_vec(well)?)?;
        Ok(())
    }

    fn modify_well(
        &self,
        id: &str,
        apply: &dyn Fn(&mut Well),
    ) -> Result<Option<Well>, StoreError> {
        self.wells
            .transaction(|wells| -> ConflictableTransactionResult<Option<Well>, StoreError> {
                let Some(current) = wells.get(id.as_bytes())? else {
                    return Ok(None);
                };
                let mut well: Well = serde_json::from_slice(&current).map_err(abort)?;
                apply(&mut well);
                wells.insert(id.as_bytes(), serde_json::to_vec(&well).map_err(abort)?)?;
                Ok(Some(well))
            })
            .map_err(tx_error)
    }

    fn remove_well(&self, id: &str) -> Result<bool, StoreError> {
        let existed = self
            .wells
            .transaction(|wells| -> ConflictableTransactionResult<bool, StoreError> {
                Ok(wells.remove(id.as_bytes())?.is_some())
            })
            .map_err(tx_error)?;
        if !existed {
            return Ok(false);
        }

        let removed = Self::clear_children(&self.parameters, id)?
            + Self::clear_children(&self.logs, id)?
            + Self::clear_children(&self.operations, id)?
            + Self::clear_children(&self.witsml, id)?;
        tracing::debug!(well_id = %id, child_rows = removed, "Removed well records");
        Ok(true)
    }

    fn parameters_for(&self, well_id: &str) -> Result<Vec<DrillingParameter>, StoreError> {
        Self::scan_children(&self.parameters, well_id)
    }

    fn insert_parameter(&self, row: &DrillingParameter) -> Result<(), StoreError> {
        self.insert_child(&self.parameters, &row.well_id, row)
    }

    fn logs_for(&self, well_id: &str) -> Result<Vec<WellLog>, StoreError> {
        Self::scan_children(&self.logs, well_id)
    }

    fn insert_log(&self, row: &WellLog) -> Result<(), StoreError> {
        self.insert_child(&self.logs, &row.well_id, row)
    }

    fn operations_for(&self, well_id: &str) -> Result<Vec<Operation>, StoreError> {
        Self::scan_children(&self.operations, well_id)
    }

    fn insert_operation(&self, row: &Operation) -> Result<(), StoreError> {
        self.insert_child(&self.operations, &row.well_id, row)
    }

    fn witsml_for(&self, well_id: &str) -> Result<Vec<WitsmlDataEntry>, StoreError> {
        Self::scan_children(&self.witsml, well_id)
    }

    fn insert_witsml(&self, row: &WitsmlDataEntry) -> Result<(), StoreError> {
        self.insert_child(&self.witsml, &row.well_id, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewWell;

    #[test]
    fn test_sled_store_behaviour() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(temp_dir.path()).unwrap();
        crate::storage::tests::exercise_store(&store);
    }

    #[test]
    fn test_delete_wins_over_concurrent_writes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(temp_dir.path()).unwrap();
        crate::storage::tests::exercise_delete_races(&store, 500);
    }

    #[test]
    fn test_wells_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let id = {
            let store = SledStore::open(temp_dir.path()).unwrap();
            let well = store.create_well(NewWell::new("A", "X", 10.0)).unwrap();
            store.flush().unwrap();
            well.id
        };

        let store = SledStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.get_well(&id).unwrap().well.name, "A");
    }

    #[test]
    fn test_child_prefix_does_not_leak_between_wells() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(temp_dir.path()).unwrap();
        let a = store.create_well(NewWell::new("A", "X", 10.0)).unwrap();
        let b = store.create_well(NewWell::new("B", "X", 10.0)).unwrap();

        store
            .create_log(
                &a.id,
                crate::types::NewWellLog {
                    log_type: "gamma".to_string(),
                    depth: 5.0,
                    value: 80.0,
                    unit: "API".to_string(),
                },
            )
            .unwrap();

        assert_eq!(store.logs_for(&a.id).unwrap().len(), 1);
        assert!(store.logs_for(&b.id).unwrap().is_empty());
    }
}
