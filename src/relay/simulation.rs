//! Synthetic drilling parameter generator
//!
//! Stands in for a rig feed: each catalog entry draws uniformly from a fixed
//! band and classifies the value against its warning/critical thresholds.

use chrono::Utc;
use rand::Rng;

use super::protocol::{DrillingParameterUpdate, LatestData, WellSnapshot};
use crate::types::ParameterStatus;

/// One simulated channel.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub unit: &'static str,
    /// Lower bound of the generated band
    pub base: f64,
    /// Width of the generated band
    pub span: f64,
    pub warning: f64,
    pub critical: f64,
}

impl ParameterSpec {
    pub fn classify(&self, value: f64) -> ParameterStatus {
        if value >= self.critical {
            ParameterStatus::Critical
        } else if value >= self.warning {
            ParameterStatus::Warning
        } else {
            ParameterStatus::Normal
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.base + rng.gen::<f64>() * self.span
    }

    fn reading<R: Rng + ?Sized>(&self, well_id: &str, rng: &mut R) -> DrillingParameterUpdate {
        let value = self.sample(rng);
        DrillingParameterUpdate {
            well_id: well_id.to_string(),
            name: self.name.to_string(),
            value,
            unit: self.unit.to_string(),
            status: self.classify(value),
            timestamp: Utc::now(),
        }
    }
}

pub const CATALOG: [ParameterSpec; 5] = [
    ParameterSpec {
        name: "ROP",
        unit: "m/h",
        base: 25.0,
        span: 10.0,
        warning: 33.0,
        critical: 34.5,
    },
    ParameterSpec {
        name: "Standpipe Pressure",
        unit: "PSI",
        base: 4500.0,
        span: 200.0,
        warning: 4650.0,
        critical: 4690.0,
    },
    ParameterSpec {
        name: "Mud Flow",
        unit: "gpm",
        base: 450.0,
        span: 50.0,
        warning: 490.0,
        critical: 498.0,
    },
    ParameterSpec {
        name: "Torque",
        unit: "ft-lb",
        base: 15000.0,
        span: 1000.0,
        warning: 15800.0,
        critical: 15950.0,
    },
    ParameterSpec {
        name: "Rotary Speed",
        unit: "rpm",
        base: 120.0,
        span: 10.0,
        warning: 128.0,
        critical: 129.5,
    },
];

/// Cycles through [`CATALOG`], one reading per call.
#[derive(Debug, Default)]
pub struct Simulator {
    cursor: usize,
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_update(&mut self, well_id: &str) -> DrillingParameterUpdate {
        let spec = &CATALOG[self.cursor % CATALOG.len()];
        self.cursor = self.cursor.wrapping_add(1);
        spec.reading(well_id, &mut rand::thread_rng())
    }
}

/// Fresh synthetic snapshot: one reading per catalog entry plus gauges.
pub fn latest_snapshot(well_id: &str) -> LatestData {
    let mut rng = rand::thread_rng();
    let parameters = CATALOG
        .iter()
        .map(|spec| spec.reading(well_id, &mut rng))
        .collect();
    LatestData {
        well_id: well_id.to_string(),
        parameters,
        well_data: WellSnapshot {
            depth: 3250.0 + rng.gen::<f64>() * 5.0,
            temperature: 85.0 + rng.gen::<f64>() * 2.0,
            pressure: 4500.0 + rng.gen::<f64>() * 100.0,
        },
    }
}
