//! Well storage
//!
//! [`WellStore`] abstracts persistence so backends can be swapped without
//! touching the API layer:
//! - [`InMemoryStore`]: RwLock-guarded tables for tests and minimal deployments
//! - [`SledStore`]: embedded sled database, one tree per collection
//!
//! Backends implement only raw record I/O. Validation, filtering, ordering
//! and pagination live in the provided trait methods so every backend
//! answers queries identically.

mod memory;
pub mod query;
pub mod seed;
mod sled_store;

pub use memory::InMemoryStore;
pub use query::{LogQuery, OperationQuery, ParameterQuery, WellQuery, WitsmlQuery};
pub use sled_store::SledStore;

use chrono::Utc;
use uuid::Uuid;

use crate::config::defaults;
use crate::types::{
    DrillingParameter, NewDrillingParameter, NewOperation, NewWell, NewWellLog, NewWitsmlEntry,
    Operation, Pagination, Well, WellDetail, WellLog, WellPage, WellPatch, WellSummary,
    WitsmlDataEntry,
};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Persistence backend for wells and their child records.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across request handlers. Concurrent updates to the same well resolve as
/// last write wins, but no write ever recreates a deleted well or attaches
/// rows to one.
pub trait WellStore: Send + Sync {
    /// Backend name for logging
    fn backend_name(&self) -> &'static str;

    /// Cheap liveness check used by the health endpoint.
    fn ping(&self) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Raw record I/O
    // ------------------------------------------------------------------

    fn all_wells(&self) -> Result<Vec<Well>, StoreError>;

    fn find_well(&self, id: &str) -> Result<Option<Well>, StoreError>;

    /// Insert or replace a well record.
    fn put_well(&self, well: &Well) -> Result<(), StoreError>;

    /// Atomically read, modify and write back a well. Returns `None` and
    /// writes nothing if the well does not exist. `apply` may run more than
    /// once.
    fn modify_well(
        &self,
        id: &str,
        apply: &dyn Fn(&mut Well),
    ) -> Result<Option<Well>, StoreError>;

    /// Remove a well and all of its child records. Returns whether it existed.
    fn remove_well(&self, id: &str) -> Result<bool, StoreError>;

    /// Child rows for a well, oldest insert first.
    ///
    /// Inserts fail with `NotFound` unless the owning well exists at the
    /// moment of the write.
    fn parameters_for(&self, well_id: &str) -> Result<Vec<DrillingParameter>, StoreError>;
    fn insert_parameter(&self, row: &DrillingParameter) -> Result<(), StoreError>;

    fn logs_for(&self, well_id: &str) -> Result<Vec<WellLog>, StoreError>;
    fn insert_log(&self, row: &WellLog) -> Result<(), StoreError>;

    fn operations_for(&self, well_id: &str) -> Result<Vec<Operation>, StoreError>;
    fn insert_operation(&self, row: &Operation) -> Result<(), StoreError>;

    fn witsml_for(&self, well_id: &str) -> Result<Vec<WitsmlDataEntry>, StoreError>;
    fn insert_witsml(&self, row: &WitsmlDataEntry) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Wells
    // ------------------------------------------------------------------

    /// Filtered, paginated well list, most recently updated first.
    fn list_wells(&self, query: &WellQuery) -> Result<WellPage, StoreError> {
        let (wells, total) = query::select_wells(self.all_wells()?, query);

        let mut data = Vec::with_capacity(wells.len());
        for well in wells {
            let drilling_parameters =
                query::newest_first(self.parameters_for(&well.id)?, |p| p.timestamp)
                    .into_iter()
                    .take(1)
                    .collect();
            let operations =
                query::newest_first(self.operations_for(&well.id)?, |o| o.start_time)
                    .into_iter()
                    .take(1)
                    .collect();
            data.push(WellSummary {
                well,
                drilling_parameters,
                operations,
            });
        }

        Ok(WellPage {
            data,
            pagination: Pagination::new(query.page, query.limit, total),
        })
    }

    /// A well with its recent related records.
    fn get_well(&self, id: &str) -> Result<WellDetail, StoreError> {
        let well = self.find_well(id)?.ok_or(StoreError::NotFound("Well"))?;

        let drilling_parameters = query::newest_first(self.parameters_for(id)?, |p| p.timestamp)
            .into_iter()
            .take(defaults::DETAIL_PARAMETER_LIMIT)
            .collect();
        let witsml_data = query::newest_first(self.witsml_for(id)?, |w| w.timestamp)
            .into_iter()
            .take(defaults::DETAIL_WITSML_LIMIT)
            .collect();
        let well_logs = query::newest_first(self.logs_for(id)?, |l| l.timestamp)
            .into_iter()
            .take(defaults::DETAIL_LOG_LIMIT)
            .collect();
        let operations = query::newest_first(self.operations_for(id)?, |o| o.start_time)
            .into_iter()
            .take(defaults::DETAIL_OPERATION_LIMIT)
            .collect();

        Ok(WellDetail {
            well,
            drilling_parameters,
            witsml_data,
            well_logs,
            operations,
        })
    }

    fn create_well(&self, new: NewWell) -> Result<Well, StoreError> {
        if new.name.trim().is_empty() || new.location.trim().is_empty() {
            return Err(StoreError::Invalid(
                "name and location must not be empty".to_string(),
            ));
        }
        let well = Well::from_new(new_id(), new, Utc::now());
        self.put_well(&well)?;
        tracing::debug!(well_id = %well.id, name = %well.name, "Well created");
        Ok(well)
    }

    /// Partial update; absent patch fields keep their stored values.
    fn update_well(&self, id: &str, patch: WellPatch) -> Result<Well, StoreError> {
        let now = Utc::now();
        let well = self
            .modify_well(id, &|well| well.apply_patch(patch.clone(), now))?
            .ok_or(StoreError::NotFound("Well"))?;
        tracing::debug!(well_id = %id, "Well updated");
        Ok(well)
    }

    fn delete_well(&self, id: &str) -> Result<(), StoreError> {
        if self.remove_well(id)? {
            tracing::debug!(well_id = %id, "Well deleted");
            Ok(())
        } else {
            Err(StoreError::NotFound("Well"))
        }
    }

    fn well_count(&self) -> Result<usize, StoreError> {
        Ok(self.all_wells()?.len())
    }

    // ------------------------------------------------------------------
    // Child collections
    // ------------------------------------------------------------------

    fn list_parameters(
        &self,
        well_id: &str,
        query: &ParameterQuery,
    ) -> Result<Vec<DrillingParameter>, StoreError> {
        self.require_well(well_id)?;
        Ok(query::select_parameters(self.parameters_for(well_id)?, query))
    }

    fn create_parameter(
        &self,
        well_id: &str,
        new: NewDrillingParameter,
    ) -> Result<DrillingParameter, StoreError> {
        let row = DrillingParameter {
            id: new_id(),
            well_id: well_id.to_string(),
            name: new.name,
            value: new.value,
            unit: new.unit,
            status: new.status,
            timestamp: Utc::now(),
        };
        self.insert_parameter(&row)?;
        Ok(row)
    }

    fn list_logs(&self, well_id: &str, query: &LogQuery) -> Result<Vec<WellLog>, StoreError> {
        self.require_well(well_id)?;
        Ok(query::select_logs(self.logs_for(well_id)?, query))
    }

    fn create_log(&self, well_id: &str, new: NewWellLog) -> Result<WellLog, StoreError> {
        let row = WellLog {
            id: new_id(),
            well_id: well_id.to_string(),
            log_type: new.log_type,
            depth: new.depth,
            value: new.value,
            unit: new.unit,
            timestamp: Utc::now(),
        };
        self.insert_log(&row)?;
        Ok(row)
    }

    fn list_operations(
        &self,
        well_id: &str,
        query: &OperationQuery,
    ) -> Result<Vec<Operation>, StoreError> {
        self.require_well(well_id)?;
        Ok(query::select_operations(self.operations_for(well_id)?, query))
    }

    fn create_operation(&self, well_id: &str, new: NewOperation) -> Result<Operation, StoreError> {
        let row = Operation {
            id: new_id(),
            well_id: well_id.to_string(),
            kind: new.kind,
            description: new.description,
            start_time: new.start_time,
            end_time: new.end_time,
            status: new.status,
            result: new.result,
        };
        self.insert_operation(&row)?;
        Ok(row)
    }

    fn list_witsml(
        &self,
        well_id: &str,
        query: &WitsmlQuery,
    ) -> Result<Vec<WitsmlDataEntry>, StoreError> {
        self.require_well(well_id)?;
        Ok(query::select_witsml(self.witsml_for(well_id)?, query))
    }

    fn create_witsml(
        &self,
        well_id: &str,
        new: NewWitsmlEntry,
    ) -> Result<WitsmlDataEntry, StoreError> {
        let row = WitsmlDataEntry {
            id: new_id(),
            well_id: well_id.to_string(),
            data_type: new.data_type,
            version: new.version,
            xml_data: new.xml_data,
            json_data: new.json_data,
            timestamp: Utc::now(),
        };
        self.insert_witsml(&row)?;
        Ok(row)
    }

    /// Fail with `NotFound` unless the well exists.
    fn require_well(&self, well_id: &str) -> Result<(), StoreError> {
        if self.find_well(well_id)?.is_some() {
            Ok(())
        } else {
            Err(StoreError::NotFound("Well"))
        }
    }
}
