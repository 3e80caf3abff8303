use crate::constants::CELL_CAPACITY;
use crate::error::{Result, SimError};
use crate::field::lattice::{hex_distance, Dimensions};
use rayon::prelude::*;

/// Per-cell physical state read back from the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSample {
    pub occupancy: bool,
    pub diffusive_mass: f32,
    pub boundary_mass: f32,
    /// Frozen mass accumulated towards `CELL_CAPACITY`.
    pub crystal_mass: f32,
}

impl CellSample {
    /// What lies beyond the simulated domain: free space at ambient vapor density.
    pub fn ambient(rho: f32) -> Self {
        Self {
            occupancy: false,
            diffusive_mass: rho,
            boundary_mass: 0.0,
            crystal_mass: 0.0,
        }
    }
}

/// Dense 3D lattice of ice/vapor state, one flat buffer per quantity.
///
/// Occupancy is monotonic: nothing in the crate clears a set flag.
#[derive(Debug, Clone)]
pub struct VoxelField {
    pub(crate) dims: Dimensions,
    pub(crate) occupancy: Vec<bool>,
    pub(crate) diffusive: Vec<f32>,
    pub(crate) boundary: Vec<f32>,
    pub(crate) crystal: Vec<f32>,
}

impl VoxelField {
    /// Field of free cells holding `ambient` diffusive mass each.
    pub fn new(dims: Dimensions, ambient: f32) -> Self {
        let n = dims.cell_count();
        Self {
            dims,
            occupancy: vec![false; n],
            diffusive: vec![ambient; n],
            boundary: vec![0.0; n],
            crystal: vec![0.0; n],
        }
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    fn index_of(&self, x: usize, y: usize, z: usize) -> Result<usize> {
        let dims = self.dims;
        if x >= dims.x || y >= dims.y || z >= dims.z {
            return Err(SimError::Bounds {
                x: x as i64,
                y: y as i64,
                z: z as i64,
                nx: dims.x,
                ny: dims.y,
                nz: dims.z,
            });
        }
        Ok(dims.index(x, y, z))
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Result<CellSample> {
        let idx = self.index_of(x, y, z)?;
        Ok(self.sample(idx))
    }

    #[inline]
    pub fn sample(&self, idx: usize) -> CellSample {
        CellSample {
            occupancy: self.occupancy[idx],
            diffusive_mass: self.diffusive[idx],
            boundary_mass: self.boundary[idx],
            crystal_mass: self.crystal[idx],
        }
    }

    pub fn occupancy(&self) -> &[bool] {
        &self.occupancy
    }

    pub fn diffusive_mass(&self) -> &[f32] {
        &self.diffusive
    }

    pub fn boundary_mass(&self) -> &[f32] {
        &self.boundary
    }

    pub fn crystal_mass(&self) -> &[f32] {
        &self.crystal
    }

    /// Mark a cell as solid ice with full crystal mass. Used only by seeding.
    pub(crate) fn freeze_cell(&mut self, idx: usize) {
        self.occupancy[idx] = true;
        self.crystal[idx] = CELL_CAPACITY;
        self.diffusive[idx] = 0.0;
        self.boundary[idx] = 0.0;
    }

    #[cfg(test)]
    pub(crate) fn set_masses(&mut self, idx: usize, diffusive: f32, boundary: f32) {
        self.diffusive[idx] = diffusive;
        self.boundary[idx] = boundary;
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy
            .par_chunks(self.dims.layer_len())
            .map(|layer| layer.iter().filter(|&&o| o).count())
            .sum()
    }

    pub fn total_diffusive_mass(&self) -> f64 {
        layered_sum(&self.diffusive, self.dims.layer_len())
    }

    pub fn total_boundary_mass(&self) -> f64 {
        layered_sum(&self.boundary, self.dims.layer_len())
    }

    pub fn total_crystal_mass(&self) -> f64 {
        layered_sum(&self.crystal, self.dims.layer_len())
    }

    /// Diffusive + boundary + crystal mass over the whole field.
    pub fn total_mass(&self) -> f64 {
        self.total_diffusive_mass() + self.total_boundary_mass() + self.total_crystal_mass()
    }

    /// In-plane hex radius and vertical half-height of the ice region around the centre.
    pub fn crystal_extent(&self) -> Option<(u64, u64)> {
        let (cx, cy, cz) = self.dims.centre();
        let dims = self.dims;
        self.occupancy
            .par_iter()
            .enumerate()
            .filter(|(_, occupied)| **occupied)
            .map(|(idx, _)| {
                let (x, y, z) = dims.coords(idx);
                let di = x as i64 - cx as i64;
                let dj = y as i64 - cy as i64;
                let dk = z as i64 - cz as i64;
                (hex_distance(di, dj) as u64, dk.unsigned_abs())
            })
            .reduce_with(|a, b| (a.0.max(b.0), a.1.max(b.1)))
    }
}

/// Sum in f64 layer by layer, then in layer order, so the result does not
/// depend on how rayon splits the work.
pub(crate) fn layered_sum(values: &[f32], layer_len: usize) -> f64 {
    let partials: Vec<f64> = values
        .par_chunks(layer_len)
        .map(|layer| layer.iter().map(|&v| v as f64).sum::<f64>())
        .collect();
    partials.iter().sum()
}
