// Default medium: "canonical" air as used by the reference snowflake runs.
pub const DEFAULT_RHO: f64 = 0.1;
pub const DEFAULT_PHI: f64 = 0.0;
pub const DEFAULT_KAPPA: f64 = 0.1;
pub const DEFAULT_MU: f64 = 0.001;
pub const DEFAULT_BETA: f64 = 1.0;

pub const DEFAULT_BETA_01: f64 = 2.5;
pub const DEFAULT_BETA_10: f64 = 2.0;
pub const DEFAULT_BETA_11: f64 = 2.0;
pub const DEFAULT_BETA_20: f64 = 2.0;
pub const DEFAULT_BETA_21: f64 = 1.0;
pub const DEFAULT_BETA_30: f64 = 1.0;
pub const DEFAULT_BETA_31: f64 = 1.0;

// Seed crystal
pub const DEFAULT_SEED_RADIUS: u32 = 2;
pub const DEFAULT_SEED_THICKNESS: u32 = 1;

// Grid
pub const DEFAULT_XSIZE: usize = 320;
pub const DEFAULT_YSIZE: usize = 320;
pub const DEFAULT_ZSIZE: usize = 256;
/// Smallest voxel count per axis; anything smaller leaves no free space around a seed.
pub const MIN_VOXEL_COUNT: usize = 3;

// Lattice
/// In-plane (hexagonal ring) neighbor count.
pub const IN_PLANE_NEIGHBORS: usize = 6;
/// Out-of-plane (vertical pair) neighbor count.
pub const VERTICAL_NEIGHBORS: usize = 2;
/// Crystal mass at which a cell becomes ice.
pub const CELL_CAPACITY: f32 = 1.0;

pub const SQRT_3: f64 = 1.732_050_807_568_877_2;
/// Volume of one hexagonal prism cell (circumradius 1/sqrt(3), height 1).
pub const CELL_VOLUME: f64 = SQRT_3 / 2.0;

// STL
pub const STL_HEADER_TEXT: &str = "generated snowfake STL";
pub const STL_HEADER_LEN: usize = 80;
pub const STL_FACET_LEN: usize = 50;
