use crate::error::Result;
use crate::field::lattice::{cartesian_to_axial, Dimensions};
use crate::field::{CellSample, VoxelField};
use crate::mesh::{HexPrismMesher, Mesh, StlFormat};
use crate::params::SimulationParameters;
use glam::DVec3;
use std::path::Path;

/// Read-only view of a simulation between ticks.
///
/// Borrowed from the driver; it cannot outlive the callback that received it
/// because the next tick mutates the field.
#[derive(Debug, Clone, Copy)]
pub struct SimulationState<'a> {
    field: &'a VoxelField,
    params: &'a SimulationParameters,
    time: u64,
}

impl<'a> SimulationState<'a> {
    pub fn new(field: &'a VoxelField, params: &'a SimulationParameters, time: u64) -> Self {
        Self { field, params, time }
    }

    /// Ticks completed.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn dims(&self) -> Dimensions {
        self.field.dims()
    }

    pub fn params(&self) -> &'a SimulationParameters {
        self.params
    }

    pub fn field(&self) -> &'a VoxelField {
        self.field
    }

    pub fn cell(&self, x: usize, y: usize, z: usize) -> Result<CellSample> {
        self.field.get(x, y, z)
    }

    pub fn occupancy(&self, x: usize, y: usize, z: usize) -> Result<bool> {
        Ok(self.cell(x, y, z)?.occupancy)
    }

    pub fn diffusive_mass(&self, x: usize, y: usize, z: usize) -> Result<f32> {
        Ok(self.cell(x, y, z)?.diffusive_mass)
    }

    pub fn boundary_mass(&self, x: usize, y: usize, z: usize) -> Result<f32> {
        Ok(self.cell(x, y, z)?.boundary_mass)
    }

    pub fn crystal_mass(&self, x: usize, y: usize, z: usize) -> Result<f32> {
        Ok(self.cell(x, y, z)?.crystal_mass)
    }

    /// Cell containing a cartesian point given relative to the seed centre.
    /// Points outside the grid read as ambient vapor.
    pub fn sample_at(&self, point: DVec3) -> CellSample {
        let dims = self.dims();
        let (cx, cy, cz) = dims.centre();
        let (i, j, k) = cartesian_to_axial(point);
        match dims.checked_index(i + cx as i64, j + cy as i64, k + cz as i64) {
            Ok(idx) => self.field.sample(idx),
            Err(_) => CellSample::ambient(self.params.medium.rho as f32),
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.field.occupied_count()
    }

    pub fn total_mass(&self) -> f64 {
        self.field.total_mass()
    }

    /// In-plane radius and vertical half-height of the crystal, in cells.
    pub fn crystal_extent(&self) -> Option<(u64, u64)> {
        self.field.crystal_extent()
    }

    pub fn mesh(&self) -> Mesh {
        HexPrismMesher::mesh_field(self.field)
    }

    /// Write the crystal surface as binary STL.
    pub fn export_stl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.mesh().save_stl(path, StlFormat::Binary)
    }

    pub fn export_ascii_stl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.mesh().save_stl(path, StlFormat::Ascii)
    }
}
