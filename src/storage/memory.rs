//! In-memory well store for tests and minimal deployments
//!
//! Thread-safe via `RwLock`. Not durable; data is lost on restart.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{StoreError, WellStore};
use crate::types::{DrillingParameter, Operation, Well, WellLog, WitsmlDataEntry};

#[derive(Default)]
struct Tables {
    wells: HashMap<String, Well>,
    parameters: Vec<DrillingParameter>,
    logs: Vec<WellLog>,
    operations: Vec<Operation>,
    witsml: Vec<WitsmlDataEntry>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

/// Must be called under the same write guard as the insert it protects.
fn require_owner(tables: &Tables, well_id: &str) -> Result<(), StoreError> {
    if tables.wells.contains_key(well_id) {
        Ok(())
    } else {
        Err(StoreError::NotFound("Well"))
    }
}

fn rows_for<T: Clone>(rows: &[T], well_id: &str, owner: impl Fn(&T) -> &str) -> Vec<T> {
    rows.iter()
        .filter(|row| owner(row) == well_id)
        .cloned()
        .collect()
}

impl WellStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "InMemory"
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }

    fn all_wells(&self) -> Result<Vec<Well>, StoreError> {
        Ok(self.read()?.wells.values().cloned().collect())
    }

    fn find_well(&self, id: &str) -> Result<Option<Well>, StoreError> {
        Ok(self.read()?.wells.get(id).cloned())
    }

    fn put_well(&self, well: &Well) -> Result<(), StoreError> {
        self.write()?.wells.insert(well.id.clone(), well.clone());
        Ok(())
    }

    fn modify_well(
        &self,
        id: &str,
        apply: &dyn Fn(&mut Well),
    ) -> Result<Option<Well>, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.wells.get_mut(id).map(|well| {
            apply(well);
            well.clone()
        }))
    }

    fn remove_well(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.wells.remove(id).is_none() {
            return Ok(false);
        }
        tables.parameters.retain(|p| p.well_id != id);
        tables.logs.retain(|l| l.well_id != id);
        tables.operations.retain(|o| o.well_id != id);
        tables.witsml.retain(|w| w.well_id != id);
        Ok(true)
    }

    fn parameters_for(&self, well_id: &str) -> Result<Vec<DrillingParameter>, StoreError> {
        Ok(rows_for(&self.read()?.parameters, well_id, |p| p.well_id.as_str()))
    }

    fn insert_parameter(&self, row: &DrillingParameter) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        require_owner(&tables, &row.well_id)?;
        tables.parameters.push(row.clone());
        Ok(())
    }

    fn logs_for(&self, well_id: &str) -> Result<Vec<WellLog>, StoreError> {
        Ok(rows_for(&self.read()?.logs, well_id, |l| l.well_id.as_str()))
    }

    fn insert_log(&self, row: &WellLog) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        require_owner(&tables, &row.well_id)?;
        tables.logs.push(row.clone());
        Ok(())
    }

    fn operations_for(&self, well_id: &str) -> Result<Vec<Operation>, StoreError> {
        Ok(rows_for(&self.read()?.operations, well_id, |o| o.well_id.as_str()))
    }

    fn insert_operation(&self, row: &Operation) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        require_owner(&tables, &row.well_id)?;
        tables.operations.push(row.clone());
        Ok(())
    }

    fn witsml_for(&self, well_id: &str) -> Result<Vec<WitsmlDataEntry>, StoreError> {
        Ok(rows_for(&self.read()?.witsml, well_id, |w| w.well_id.as_str()))
    }

    fn insert_witsml(&self, row: &WitsmlDataEntry) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        require_owner(&tables, &row.well_id)?;
        tables.witsml.push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store_behaviour() {
        let store = InMemoryStore::new();
        crate::storage::tests::exercise_store(&store);
    }

    #[test]
    fn test_delete_wins_over_concurrent_writes() {
        let store = InMemoryStore::new();
        crate::storage::tests::exercise_delete_races(&store, 200);
    }

    #[test]
    fn test_trait_object() {
        let store: Box<dyn WellStore> = Box::new(InMemoryStore::new());
        assert_eq!(store.backend_name(), "InMemory");
        assert!(store.ping().is_ok());
    }
}
