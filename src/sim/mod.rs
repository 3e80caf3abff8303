pub mod simulation;
pub mod state;

pub use simulation::{OpTiming, RunStatus, RunSummary, Simulation, StopReason};
pub use state::SimulationState;
