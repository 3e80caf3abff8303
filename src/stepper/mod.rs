// src/stepper/mod.rs - one discrete growth tick: diffusion, attachment, freezing

pub mod attachment;
pub mod diffusion;
pub mod freezing;

pub use attachment::classify;
pub use diffusion::{FaceRates, Mobility};

use crate::error::{MassQuantity, Result, SimError};
use crate::field::{Dimensions, VoxelField};
use crate::medium::{Medium, ResolvedRates};
use crate::params::{EdgePolicy, SimulationParameters};
use rayon::prelude::*;

/// Mass bookkeeping for one committed tick.
///
/// Total field mass after the tick equals the mass before it minus
/// `edge_outflow` and `discarded_mass`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub tick: u64,
    pub attached_mass: f64,
    pub frozen_mass: f64,
    pub discarded_mass: f64,
    pub edge_outflow: f64,
    pub newly_frozen: usize,
    pub boundary_candidates: usize,
}

#[derive(Debug, Default)]
struct Scratch {
    occupancy: Vec<bool>,
    diffusive: Vec<f32>,
    boundary: Vec<f32>,
    crystal: Vec<f32>,
    shells: Vec<u8>,
}

impl Scratch {
    fn fit(&mut self, n: usize) {
        self.occupancy.resize(n, false);
        self.diffusive.resize(n, 0.0);
        self.boundary.resize(n, 0.0);
        self.crystal.resize(n, 0.0);
        self.shells.resize(n, attachment::NOT_CANDIDATE);
    }
}

/// Advances a [`VoxelField`] one tick at a time.
///
/// Every pass reads the committed field and writes scratch buffers, which are
/// swapped in only once all three passes are clean. A failed tick leaves the
/// field exactly as it was.
#[derive(Debug)]
pub struct GrowthStepper {
    mobility: Mobility,
    edge_policy: EdgePolicy,
    ambient: f32,
    attachment: ResolvedRates,
    freezing: ResolvedRates,
    ticks: u64,
    scratch: Scratch,
}

impl GrowthStepper {
    pub fn new(medium: &Medium, edge_policy: EdgePolicy) -> Result<Self> {
        medium.validate()?;
        Ok(Self {
            mobility: Mobility::from_medium(medium),
            edge_policy,
            ambient: medium.rho as f32,
            attachment: medium.resolved_attachment(),
            freezing: medium.resolved_freezing(),
            ticks: 0,
            scratch: Scratch::default(),
        })
    }

    pub fn from_params(params: &SimulationParameters) -> Result<Self> {
        Self::new(&params.medium, params.edge_policy)
    }

    /// Ticks committed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn mobility(&self) -> &Mobility {
        &self.mobility
    }

    pub fn step(&mut self, field: &mut VoxelField) -> Result<StepReport> {
        let dims = field.dims();
        let tick = self.ticks + 1;
        self.scratch.fit(dims.cell_count());
        let scratch = &mut self.scratch;

        let candidates = attachment::tag_shells(dims, &field.occupancy, &mut scratch.shells);
        let edge_outflow = diffusion::diffuse(
            dims,
            &field.occupancy,
            &scratch.shells,
            &field.diffusive,
            &mut scratch.diffusive,
            &self.mobility,
            self.edge_policy,
            self.ambient,
        );
        check_quantity(dims, tick, &scratch.diffusive, MassQuantity::Diffusive)?;

        scratch.boundary.copy_from_slice(&field.boundary);
        let attached_mass = attachment::attach(
            dims.x,
            &mut scratch.diffusive,
            &mut scratch.boundary,
            &scratch.shells,
            &self.attachment,
        );
        check_quantity(dims, tick, &scratch.diffusive, MassQuantity::Diffusive)?;
        check_quantity(dims, tick, &scratch.boundary, MassQuantity::Boundary)?;

        scratch.occupancy.copy_from_slice(&field.occupancy);
        scratch.crystal.copy_from_slice(&field.crystal);
        let frozen = freezing::freeze(
            dims.x,
            &mut scratch.occupancy,
            &mut scratch.crystal,
            &mut scratch.boundary,
            &mut scratch.diffusive,
            &scratch.shells,
            &self.freezing,
        );
        check_quantity(dims, tick, &scratch.boundary, MassQuantity::Boundary)?;
        check_quantity(dims, tick, &scratch.crystal, MassQuantity::Crystal)?;

        std::mem::swap(&mut field.occupancy, &mut scratch.occupancy);
        std::mem::swap(&mut field.diffusive, &mut scratch.diffusive);
        std::mem::swap(&mut field.boundary, &mut scratch.boundary);
        std::mem::swap(&mut field.crystal, &mut scratch.crystal);
        self.ticks = tick;

        let report = StepReport {
            tick,
            attached_mass,
            frozen_mass: frozen.frozen_mass,
            discarded_mass: frozen.discarded_mass,
            edge_outflow,
            newly_frozen: frozen.newly_frozen,
            boundary_candidates: candidates,
        };
        if report.newly_frozen > 0 {
            log::trace!("tick {}: {} cells froze", tick, report.newly_frozen);
        }
        Ok(report)
    }
}

/// Fail on the lowest-index negative or non-finite value.
fn check_quantity(dims: Dimensions, tick: u64, values: &[f32], quantity: MassQuantity) -> Result<()> {
    if let Some(idx) = values.par_iter().position_first(|v| !v.is_finite() || *v < 0.0) {
        let (x, y, z) = dims.coords(idx);
        return Err(SimError::NumericalInstability {
            tick,
            x,
            y,
            z,
            quantity,
            value: values[idx],
        });
    }
    Ok(())
}
