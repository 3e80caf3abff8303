use crate::error::{Result, SimError};
use crate::field::VoxelField;
use crate::measurement::{MeasurementHandle, MeasurementScheduler};
use crate::params::SimulationParameters;
use crate::sim::state::SimulationState;
use crate::stepper::{GrowthStepper, StepReport};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct OpTiming {
    pub op_name: String,
    pub init_time: Duration,
    pub total_update_time: Duration,
    pub update_call_count: u32,
    pub after_time: Duration,
}

impl OpTiming {
    pub fn new(op_name: String) -> Self {
        Self {
            op_name,
            init_time: Duration::ZERO,
            total_update_time: Duration::ZERO,
            update_call_count: 0,
            after_time: Duration::ZERO,
        }
    }

    pub fn avg_update_time(&self) -> Duration {
        if self.update_call_count > 0 {
            self.total_update_time / self.update_call_count
        } else {
            Duration::ZERO
        }
    }

    pub fn total_time(&self) -> Duration {
        self.init_time + self.total_update_time + self.after_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A measurement called [`Simulation::stop`].
    Requested,
    /// `tick_limit` was reached.
    TickLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub stop_reason: StopReason,
    pub seed_cells: usize,
    pub occupied_cells: usize,
    pub elapsed: Duration,
}

/// Owns one growth run at a time: field, stepper and measurements.
///
/// `run` blocks until a measurement calls [`stop`](Self::stop) or the tick
/// limit is reached. Measurements are handed `&mut Simulation` between ticks,
/// so they read the field through [`state`](Self::state) and may stop the run,
/// but cannot start another one.
#[derive(Default)]
pub struct Simulation {
    scheduler: MeasurementScheduler,
    status: RunStatus,
    stop_requested: bool,
    params: Option<SimulationParameters>,
    field: Option<VoxelField>,
    stepper: Option<GrowthStepper>,
    time: u64,
    seed_cells: usize,
    elapsed: Duration,
    last_report: Option<StepReport>,
}

impl Simulation {
    pub fn new() -> Simulation {
        Simulation::default()
    }

    /// Register a measurement; they fire in registration order.
    pub fn measurement(&mut self, handle: MeasurementHandle) -> Result<()> {
        if self.status == RunStatus::Running {
            return Err(SimError::state(
                "measurements cannot be registered while a simulation is running",
            ));
        }
        self.scheduler.register(handle);
        Ok(())
    }

    /// Ask the run to end after the current tick's measurements.
    pub fn stop(&mut self) -> Result<()> {
        if self.status != RunStatus::Running {
            log::error!("stop() called while no simulation is running");
            return Err(SimError::state("no simulation is running"));
        }
        self.stop_requested = true;
        Ok(())
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Ticks completed by the current or last run.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn seed_cells(&self) -> usize {
        self.seed_cells
    }

    pub fn last_step_report(&self) -> Option<StepReport> {
        self.last_report
    }

    pub fn timings(&self) -> &[OpTiming] {
        self.scheduler.timings()
    }

    /// View of the field; kept after the run ends, including after a failed tick.
    pub fn state(&self) -> Option<SimulationState<'_>> {
        match (&self.field, &self.params) {
            (Some(field), Some(params)) => Some(SimulationState::new(field, params, self.time)),
            _ => None,
        }
    }

    pub fn run(&mut self, params: SimulationParameters) -> Result<RunSummary> {
        if self.status == RunStatus::Running {
            return Err(SimError::state("run() called while a simulation is already running"));
        }
        let dims = params.validate()?;
        if params.tick_limit.is_none() && self.scheduler.is_empty() {
            log::warn!("no measurements and no tick limit; the run will never stop");
        }

        let mut field = VoxelField::new(dims, params.medium.rho as f32);
        let seed_cells = params.seed.plant(&mut field)?;
        let stepper = GrowthStepper::from_params(&params)?;
        log::info!(
            "starting run on {}x{}x{} grid, seed radius {} thickness {} ({} cells)",
            dims.x,
            dims.y,
            dims.z,
            params.seed.radius,
            params.seed.thickness,
            seed_cells
        );

        self.params = Some(params);
        self.field = Some(field);
        self.stepper = Some(stepper);
        self.time = 0;
        self.seed_cells = seed_cells;
        self.last_report = None;
        self.stop_requested = false;
        self.scheduler.reset_timings();
        self.status = RunStatus::Running;

        let start = Instant::now();
        let outcome = self.simulate_loop();
        self.elapsed = start.elapsed();

        let stop_reason = match outcome {
            Ok(reason) => reason,
            Err(err) => {
                self.status = RunStatus::Stopped;
                log::error!("run aborted after {} ticks: {}", self.time, err);
                return Err(err);
            }
        };
        // still Running here, so after_sim cannot start another run
        let finished = self.with_scheduler(|scheduler, sim| scheduler.finish_all(sim));
        self.status = RunStatus::Stopped;
        finished?;
        self.log_timing_report();

        let summary = RunSummary {
            ticks: self.time,
            stop_reason,
            seed_cells,
            occupied_cells: self.field.as_ref().map_or(0, VoxelField::occupied_count),
            elapsed: self.elapsed,
        };
        log::info!(
            "run stopped ({:?}) at tick {} with {} ice cells in {:.2}s",
            summary.stop_reason,
            summary.ticks,
            summary.occupied_cells,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    fn simulate_loop(&mut self) -> Result<StopReason> {
        self.with_scheduler(|scheduler, sim| scheduler.init_all(sim))?;
        let tick_limit = self.params.as_ref().and_then(|p| p.tick_limit);
        loop {
            if self.stop_requested {
                return Ok(StopReason::Requested);
            }
            if tick_limit.is_some_and(|limit| self.time >= limit) {
                return Ok(StopReason::TickLimit);
            }

            self.advance()?;
            let time = self.time;
            self.with_scheduler(|scheduler, sim| scheduler.fire(sim, time))?;
        }
    }

    fn advance(&mut self) -> Result<StepReport> {
        let (Some(field), Some(stepper)) = (self.field.as_mut(), self.stepper.as_mut()) else {
            return Err(SimError::state("no field to advance"));
        };
        let report = stepper.step(field)?;
        self.time = report.tick;
        self.last_report = Some(report);
        Ok(report)
    }

    /// Measurements borrow the driver mutably, so the scheduler is moved out while they run.
    fn with_scheduler<R>(
        &mut self,
        f: impl FnOnce(&mut MeasurementScheduler, &mut Simulation) -> R,
    ) -> R {
        let mut scheduler = std::mem::take(&mut self.scheduler);
        let result = f(&mut scheduler, self);
        self.scheduler = scheduler;
        result
    }

    fn log_timing_report(&self) {
        let ticks = self.time.max(1) as f64;
        log::debug!(
            "{} ticks in {:.2}s ({:.2} ms/tick)",
            self.time,
            self.elapsed.as_secs_f64(),
            self.elapsed.as_secs_f64() * 1000.0 / ticks
        );
        for timing in self.scheduler.timings() {
            log::debug!(
                "measurement {:<20} total {:>8.2}ms, avg {:>8.3}ms over {} calls",
                timing.op_name,
                timing.total_time().as_secs_f64() * 1000.0,
                timing.avg_update_time().as_secs_f64() * 1000.0,
                timing.update_call_count
            );
        }
    }

    pub fn print_timing_report(&self) {
        println!("\n📊 === SIMULATION TIMING REPORT ===");
        println!("🔄 Total ticks: {}", self.time);
        println!();

        let mut measured = Duration::ZERO;
        for timing in self.scheduler.timings() {
            measured += timing.total_time();
        }

        println!("📈 PER-MEASUREMENT BREAKDOWN:");
        for timing in self.scheduler.timings() {
            let share = if self.elapsed.as_secs_f64() > 0.0 {
                timing.total_time().as_secs_f64() / self.elapsed.as_secs_f64() * 100.0
            } else {
                0.0
            };
            println!(
                "  🔧 {:<25} | Total: {:>8.2}ms | Avg/call: {:>8.3}ms | Init: {:>6.2}ms | After: {:>6.2}ms | Share: {:>5.1}%",
                timing.op_name,
                timing.total_time().as_secs_f64() * 1000.0,
                timing.avg_update_time().as_secs_f64() * 1000.0,
                timing.init_time.as_secs_f64() * 1000.0,
                timing.after_time.as_secs_f64() * 1000.0,
                share
            );
        }

        println!();
        println!(
            "⏱️  TOTAL RUN TIME: {:.2}ms ({:.2}s), {:.2}ms in measurements",
            self.elapsed.as_secs_f64() * 1000.0,
            self.elapsed.as_secs_f64(),
            measured.as_secs_f64() * 1000.0
        );
        if self.time > 0 && self.elapsed.as_secs_f64() > 0.0 {
            println!(
                "🚀 Average time per tick: {:.3}ms",
                self.elapsed.as_secs_f64() * 1000.0 / self.time as f64
            );
            println!("💫 Ticks per second: {:.2}", self.time as f64 / self.elapsed.as_secs_f64());
        }
        println!("📊 === END TIMING REPORT ===\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{CallbackMeasurement, Control};
    use crate::medium::Medium;
    use crate::seed_crystal::SeedCrystal;

    fn small_params() -> SimulationParameters {
        SimulationParameters::new(Medium::default(), SeedCrystal::new(2, 1), 16, 16, 8)
    }

    #[test]
    fn creation() {
        let sim = Simulation::new();
        assert_eq!(sim.status(), RunStatus::Idle);
        assert!(sim.state().is_none());
        assert_eq!(sim.time(), 0);
    }

    #[test]
    fn tick_limit_stops_the_run() {
        let mut sim = Simulation::new();
        let summary = sim.run(small_params().with_tick_limit(12)).unwrap();
        assert_eq!(summary.ticks, 12);
        assert_eq!(summary.stop_reason, StopReason::TickLimit);
        assert_eq!(summary.seed_cells, 19);
        assert_eq!(sim.status(), RunStatus::Stopped);
        assert_eq!(sim.state().unwrap().time(), 12);
        assert_eq!(sim.last_step_report().unwrap().tick, 12);
    }

    #[test]
    fn stop_outside_a_run_is_a_state_error() {
        let mut sim = Simulation::new();
        assert!(matches!(sim.stop(), Err(SimError::State(_))));
    }

    #[test]
    fn stop_from_a_callback_ends_after_that_tick() {
        let mut sim = Simulation::new();
        sim.measurement(CallbackMeasurement::handle("stopper", (), |state, time, _| {
            assert_eq!(time, state.time() as f64);
            if time >= 5.0 { Control::Stop } else { Control::Continue }
        }))
        .unwrap();
        let summary = sim.run(small_params()).unwrap();
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.stop_reason, StopReason::Requested);
        assert_eq!(sim.timings()[0].update_call_count, 5);
    }
}
