// Observers that run between ticks
pub mod callback;
pub mod progress_reporter;
pub mod stop_at_tick;

pub use callback::{CallbackMeasurement, Control};
pub use progress_reporter::ProgressReporter;
pub use stop_at_tick::StopAtTick;

use crate::error::Result;
use crate::sim::simulation::{OpTiming, Simulation};
use std::time::Instant;

pub trait Measurement {
    /// The name of this measurement (for timing reports and logs)
    fn name(&self) -> &str;

    /// Called once after seeding, before the first tick
    fn init_sim(&mut self, _sim: &mut Simulation) -> Result<()> {
        Ok(())
    }

    /// Called after every tick the handle's interval selects
    fn measure(&mut self, _sim: &mut Simulation) -> Result<()> {
        Ok(())
    }

    /// Called once when the run stops cleanly
    fn after_sim(&mut self, _sim: &mut Simulation) -> Result<()> {
        Ok(())
    }
}

pub struct MeasurementHandle {
    pub measurement: Box<dyn Measurement>,
    pub interval: u64,
}

impl MeasurementHandle {
    pub fn new(measurement: Box<dyn Measurement>) -> Self {
        MeasurementHandle {
            measurement,
            interval: 1,
        }
    }

    /// Fire every `ticks` ticks instead of after each one; zero is treated as one.
    pub fn every(mut self, ticks: u64) -> Self {
        self.interval = ticks.max(1);
        self
    }

    pub fn is_due(&self, time: u64) -> bool {
        time % self.interval == 0
    }
}

/// Registered measurements in registration order, with per-measurement timing.
#[derive(Default)]
pub struct MeasurementScheduler {
    handles: Vec<MeasurementHandle>,
    timings: Vec<OpTiming>,
}

impl MeasurementScheduler {
    pub fn register(&mut self, handle: MeasurementHandle) {
        self.timings
            .push(OpTiming::new(handle.measurement.name().to_string()));
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn timings(&self) -> &[OpTiming] {
        &self.timings
    }

    pub(crate) fn reset_timings(&mut self) {
        for timing in &mut self.timings {
            *timing = OpTiming::new(timing.op_name.clone());
        }
    }

    pub(crate) fn init_all(&mut self, sim: &mut Simulation) -> Result<()> {
        for (i, handle) in self.handles.iter_mut().enumerate() {
            let start = Instant::now();
            handle.measurement.init_sim(sim)?;
            self.timings[i].init_time = start.elapsed();
        }
        Ok(())
    }

    /// Run every measurement due at `time`; all of them see the same tick even
    /// if an earlier one asked to stop.
    pub(crate) fn fire(&mut self, sim: &mut Simulation, time: u64) -> Result<()> {
        for (i, handle) in self.handles.iter_mut().enumerate() {
            if !handle.is_due(time) {
                continue;
            }
            let start = Instant::now();
            handle.measurement.measure(sim)?;
            self.timings[i].total_update_time += start.elapsed();
            self.timings[i].update_call_count += 1;
        }
        Ok(())
    }

    pub(crate) fn finish_all(&mut self, sim: &mut Simulation) -> Result<()> {
        for (i, handle) in self.handles.iter_mut().enumerate() {
            let start = Instant::now();
            handle.measurement.after_sim(sim)?;
            self.timings[i].after_time = start.elapsed();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    impl Measurement for Named {
        fn name(&self) -> &str {
            "named"
        }
    }

    #[test]
    fn interval_selects_ticks() {
        let handle = MeasurementHandle::new(Box::new(Named)).every(5);
        assert!(!handle.is_due(1));
        assert!(handle.is_due(5));
        assert!(handle.is_due(10));
        let every_tick = MeasurementHandle::new(Box::new(Named)).every(0);
        assert_eq!(every_tick.interval, 1);
    }

    #[test]
    fn registration_tracks_timings() {
        let mut scheduler = MeasurementScheduler::default();
        scheduler.register(MeasurementHandle::new(Box::new(Named)));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.timings()[0].op_name, "named");
    }
}
