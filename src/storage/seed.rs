//! Demo data inserted into an empty store at startup.

use chrono::NaiveDate;

use super::{StoreError, WellStore};
use crate::types::{NewWell, WellStatus};

struct DemoWell {
    name: &'static str,
    location: &'static str,
    field: &'static str,
    status: WellStatus,
    depth: f64,
    target_depth: f64,
    temperature: f64,
    pressure: f64,
    flow_rate: f64,
    witsml_version: &'static str,
    spud: (i32, u32, u32),
}

const DEMO_WELLS: [DemoWell; 3] = [
    DemoWell {
        name: "Well-A-01",
        location: "South Pars Field",
        field: "South Pars",
        status: WellStatus::Drilling,
        depth: 3250.0,
        target_depth: 4100.0,
        temperature: 85.0,
        pressure: 4500.0,
        flow_rate: 0.0,
        witsml_version: "2.1",
        spud: (2023, 10, 15),
    },
    DemoWell {
        name: "Well-B-02",
        location: "North Dome Field",
        field: "North Dome",
        status: WellStatus::Producing,
        depth: 2800.0,
        target_depth: 2800.0,
        temperature: 78.0,
        pressure: 3800.0,
        flow_rate: 1250.0,
        witsml_version: "2.1",
        spud: (2023, 8, 20),
    },
    DemoWell {
        name: "Well-C-03",
        location: "West Oil Field",
        field: "West Oil",
        status: WellStatus::Completed,
        depth: 4100.0,
        target_depth: 4100.0,
        temperature: 92.0,
        pressure: 5200.0,
        flow_rate: 980.0,
        witsml_version: "2.0",
        spud: (2023, 5, 10),
    },
];

/// The three sample wells inserted into an empty store.
pub fn demo_wells() -> Vec<NewWell> {
    DEMO_WELLS
        .iter()
        .map(|demo| {
            let mut new = NewWell::new(demo.name, demo.location, demo.depth);
            new.field = Some(demo.field.to_string());
            new.status = demo.status;
            new.target_depth = Some(demo.target_depth);
            new.temperature = Some(demo.temperature);
            new.pressure = Some(demo.pressure);
            new.flow_rate = Some(demo.flow_rate);
            new.witsml_version = demo.witsml_version.to_string();
            let (y, m, d) = demo.spud;
            new.spud_date = NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc());
            new
        })
        .collect()
}

/// Insert the demo wells if the store holds no wells. Returns how many
/// were inserted.
pub fn seed_if_empty(store: &dyn WellStore) -> Result<usize, StoreError> {
    if store.well_count()? > 0 {
        tracing::debug!("Store already populated, skipping demo seed");
        return Ok(0);
    }

    let wells = demo_wells();
    let count = wells.len();
    for new in wells {
        store.create_well(new)?;
    }
    tracing::info!(count, "Seeded demo wells");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, WellQuery};

    #[test]
    fn test_seed_only_when_empty() {
        let store = InMemoryStore::new();
        assert_eq!(seed_if_empty(&store).unwrap(), 3);
        assert_eq!(seed_if_empty(&store).unwrap(), 0);
        assert_eq!(store.well_count().unwrap(), 3);

        let drilling = store
            .list_wells(&WellQuery {
                status: Some(WellStatus::Drilling),
                ..WellQuery::default()
            })
            .unwrap();
        assert_eq!(drilling.data.len(), 1);
        assert_eq!(drilling.data[0].well.name, "Well-A-01");
    }

    #[test]
    fn test_demo_wells_pass_form_rules() {
        for well in demo_wells() {
            assert!(well.form_violations().is_empty(), "{}", well.name);
            assert!(well.spud_date.is_some());
        }
    }
}
