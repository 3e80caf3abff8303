pub mod constants;
pub mod error;
pub mod field;
pub mod measurement;
pub mod medium;
pub mod mesh;
pub mod params;
pub mod seed_crystal;
pub mod sim;
pub mod stepper;

pub use error::{Result, SimError};
pub use field::{Dimensions, VoxelField};
pub use measurement::{CallbackMeasurement, Control, Measurement, MeasurementHandle};
pub use medium::{Medium, NeighborShell, RateTable};
pub use mesh::{Mesh, StlFormat};
pub use params::{EdgePolicy, SimulationParameters};
pub use seed_crystal::SeedCrystal;
pub use sim::{RunStatus, RunSummary, Simulation, SimulationState, StopReason};
pub use stepper::{GrowthStepper, StepReport};
