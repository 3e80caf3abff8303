/// Progress reporting measurement
/// Logs crystal size and remaining vapor at the handle's interval

use super::{Measurement, MeasurementHandle};
use crate::error::Result;
use crate::sim::simulation::Simulation;
use colored::Colorize;

pub struct ProgressReporter {
    console: bool,
    seed_cells: usize,
    last_occupied: usize,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            console: false,
            seed_cells: 0,
            last_occupied: 0,
        }
    }

    /// Also print a coloured status line to stdout.
    pub fn with_console(mut self) -> Self {
        self.console = true;
        self
    }

    pub fn handle(every: u64) -> MeasurementHandle {
        MeasurementHandle::new(Box::new(Self::new())).every(every)
    }

    pub fn console_handle(every: u64) -> MeasurementHandle {
        MeasurementHandle::new(Box::new(Self::new().with_console())).every(every)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Measurement for ProgressReporter {
    fn name(&self) -> &str {
        "progress_reporter"
    }

    fn init_sim(&mut self, sim: &mut Simulation) -> Result<()> {
        if let Some(state) = sim.state() {
            let dims = state.dims();
            self.seed_cells = state.occupied_count();
            self.last_occupied = self.seed_cells;
            log::info!(
                "growing on a {}x{}x{} grid from {} seed cells",
                dims.x,
                dims.y,
                dims.z,
                self.seed_cells
            );
        }
        Ok(())
    }

    fn measure(&mut self, sim: &mut Simulation) -> Result<()> {
        let Some(state) = sim.state() else {
            return Ok(());
        };
        let occupied = state.occupied_count();
        let (radius, half_height) = state.crystal_extent().unwrap_or((0, 0));
        let vapor = state.field().total_diffusive_mass();
        let grown = occupied.saturating_sub(self.last_occupied);
        self.last_occupied = occupied;

        log::info!(
            "tick {}: {} ice cells (+{}), radius {}, half-height {}, vapor {:.3}",
            state.time(),
            occupied,
            grown,
            radius,
            half_height,
            vapor
        );
        if self.console {
            println!(
                "{} tick {:>7} | {:>8} ice cells {} | radius {:>4} | half-height {:>4}",
                "❄".cyan(),
                state.time(),
                occupied,
                format!("(+{})", grown).green(),
                radius,
                half_height
            );
        }
        Ok(())
    }

    fn after_sim(&mut self, sim: &mut Simulation) -> Result<()> {
        if let Some(state) = sim.state() {
            let occupied = state.occupied_count();
            log::info!(
                "finished at tick {} with {} ice cells ({} grown)",
                state.time(),
                occupied,
                occupied.saturating_sub(self.seed_cells)
            );
            if self.console {
                println!(
                    "{} finished at tick {} with {} ice cells",
                    "✅".green(),
                    state.time(),
                    occupied.to_string().bold()
                );
            }
        }
        Ok(())
    }
}
