use super::{Measurement, MeasurementHandle};
use crate::error::Result;
use crate::sim::simulation::Simulation;
use std::path::PathBuf;

/// Stops the run at `stop_time`, optionally writing the crystal as binary STL first.
#[derive(Debug, Clone)]
pub struct StopAtTick {
    pub stop_time: u64,
    pub export_path: Option<PathBuf>,
}

impl StopAtTick {
    pub fn new(stop_time: u64) -> Self {
        Self {
            stop_time,
            export_path: None,
        }
    }

    pub fn with_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub fn handle(self) -> MeasurementHandle {
        MeasurementHandle::new(Box::new(self))
    }
}

impl Measurement for StopAtTick {
    fn name(&self) -> &str {
        "stop_at_tick"
    }

    fn measure(&mut self, sim: &mut Simulation) -> Result<()> {
        let Some(state) = sim.state() else {
            return Ok(());
        };
        if state.time() < self.stop_time {
            return Ok(());
        }
        log::info!("reached tick {}, stopping", state.time());
        if let Some(path) = &self.export_path {
            state.export_stl(path)?;
        }
        sim.stop()
    }
}
