use crate::constants::{DEFAULT_XSIZE, DEFAULT_YSIZE, DEFAULT_ZSIZE, MIN_VOXEL_COUNT};
use crate::error::{Result, SimError};
use crate::field::Dimensions;
use crate::medium::Medium;
use crate::seed_crystal::SeedCrystal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What diffusion sees past the lattice edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// No flux crosses the edge; total mass is conserved.
    #[default]
    Reflective,
    /// The outside is an empty sink; vapor that leaves is lost.
    Absorbing,
    /// The outside holds ambient `rho`, feeding vapor back in.
    Reservoir,
}

/// Everything a run needs: medium, seed geometry and grid size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub medium: Medium,
    pub seed: SeedCrystal,
    pub voxel_x_count: usize,
    pub voxel_y_count: usize,
    pub voxel_z_count: usize,
    pub edge_policy: EdgePolicy,
    /// Stop after this many ticks even if no measurement asks for it.
    pub tick_limit: Option<u64>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            medium: Medium::default(),
            seed: SeedCrystal::default(),
            voxel_x_count: DEFAULT_XSIZE,
            voxel_y_count: DEFAULT_YSIZE,
            voxel_z_count: DEFAULT_ZSIZE,
            edge_policy: EdgePolicy::default(),
            tick_limit: None,
        }
    }
}

impl SimulationParameters {
    pub fn new(medium: Medium, seed: SeedCrystal, x: usize, y: usize, z: usize) -> Self {
        Self {
            medium,
            seed,
            voxel_x_count: x,
            voxel_y_count: y,
            voxel_z_count: z,
            ..Self::default()
        }
    }

    pub fn with_edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    pub fn dimensions(&self) -> Result<Dimensions> {
        Dimensions::new(self.voxel_x_count, self.voxel_y_count, self.voxel_z_count)
    }

    /// Check every parameter before a run; nothing is touched on failure.
    pub fn validate(&self) -> Result<Dimensions> {
        let dims = self.dimensions()?;
        if dims.x < MIN_VOXEL_COUNT || dims.y < MIN_VOXEL_COUNT || dims.z < MIN_VOXEL_COUNT {
            return Err(SimError::validation(format!(
                "grid {}x{}x{} is too small, every axis needs at least {} voxels",
                dims.x, dims.y, dims.z, MIN_VOXEL_COUNT
            )));
        }
        self.medium.validate()?;
        self.seed.validate(&dims)?;
        if self.tick_limit == Some(0) {
            return Err(SimError::validation("tick limit must be positive"));
        }

        let outflow = self.medium.max_outflow_rate();
        if outflow > 1.0 {
            log::warn!(
                "kappa up to {} gives a per-tick outflow of {:.3} (> 1); diffusion may drive vapor negative",
                self.medium.max_kappa(),
                outflow
            );
        }
        Ok(dims)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let params = Self::from_json_str(&content)?;
        log::debug!("loaded simulation parameters from {}", path.as_ref().display());
        Ok(params)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
