use super::attachment::NOT_CANDIDATE;
use crate::field::{Dimensions, Direction, DIRECTIONS};
use crate::medium::{Medium, ResolvedRates};
use crate::params::EdgePolicy;
use rayon::prelude::*;

/// Per-face exchange rates of a free cell; `phi` tilts the vertical pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRates {
    pub in_plane: f32,
    pub up: f32,
    pub down: f32,
}

impl FaceRates {
    pub fn new(kappa: f32, phi: f32) -> Self {
        Self {
            in_plane: kappa,
            up: kappa * (1.0 + phi),
            down: kappa * (1.0 - phi),
        }
    }

    pub fn from_medium(medium: &Medium) -> Self {
        Self::new(medium.kappa as f32, medium.phi as f32)
    }

    /// Fraction of its vapor a cell sends through the face in `dir` per tick.
    #[inline]
    pub fn toward(&self, dir: Direction) -> f32 {
        match dir {
            Direction::InPlane(_) => self.in_plane,
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

/// Face rates by cell class: boundary candidates move at their shell's
/// `kappa_ab`, every other free cell at the baseline `kappa`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mobility {
    baseline: FaceRates,
    phi: f32,
    by_shell: ResolvedRates,
}

impl Mobility {
    pub fn from_medium(medium: &Medium) -> Self {
        Self {
            baseline: FaceRates::from_medium(medium),
            phi: medium.phi as f32,
            by_shell: medium.resolved_mobility(),
        }
    }

    pub fn baseline(&self) -> FaceRates {
        self.baseline
    }

    /// Rates of a cell tagged with shell `code`.
    #[inline]
    pub(crate) fn rates_for(&self, code: u8) -> FaceRates {
        if code == NOT_CANDIDATE {
            self.baseline
        } else {
            FaceRates::new(self.by_shell.by_dense_index(code as usize), self.phi)
        }
    }
}

/// One explicit diffusion pass from `current` into `next`.
///
/// Only free cells exchange vapor; ice faces are closed. Each free cell keeps
/// `d * (1 - R)` where `R` is the sum of its open face rates, and receives
/// what its free neighbors send towards it at their own rates, so every flux
/// leaves one cell exactly as it enters the other. Faces on the lattice edge
/// follow `edge`, with the outside at baseline mobility. Returns the net mass
/// that crossed the edge (positive is outflow).
#[allow(clippy::too_many_arguments)]
pub(crate) fn diffuse(
    dims: Dimensions,
    occupancy: &[bool],
    shells: &[u8],
    current: &[f32],
    next: &mut [f32],
    mobility: &Mobility,
    edge: EdgePolicy,
    ambient: f32,
) -> f64 {
    let row_len = dims.x;
    let outside = mobility.baseline();
    let partials: Vec<f64> = next
        .par_chunks_mut(row_len)
        .enumerate()
        .map(|(row, out)| {
            let y = row % dims.y;
            let z = row / dims.y;
            let base = row * row_len;
            let mut edge_flux = 0.0f64;

            for (x, slot) in out.iter_mut().enumerate() {
                let idx = base + x;
                let d = current[idx];
                if occupancy[idx] {
                    *slot = d;
                    continue;
                }

                let own = mobility.rates_for(shells[idx]);
                let mut out_rate = 0.0f32;
                let mut inflow = 0.0f32;
                for dir in DIRECTIONS {
                    let rate_out = own.toward(dir);
                    match dims.neighbor(x, y, z, dir) {
                        Some(n) => {
                            if !occupancy[n] {
                                out_rate += rate_out;
                                inflow += mobility.rates_for(shells[n]).toward(dir.opposite()) * current[n];
                            }
                        }
                        None => match edge {
                            EdgePolicy::Reflective => {}
                            EdgePolicy::Absorbing => {
                                out_rate += rate_out;
                                edge_flux += (rate_out * d) as f64;
                            }
                            EdgePolicy::Reservoir => {
                                let rate_in = outside.toward(dir.opposite());
                                out_rate += rate_out;
                                inflow += rate_in * ambient;
                                edge_flux += (rate_out * d) as f64 - (rate_in * ambient) as f64;
                            }
                        },
                    }
                }
                *slot = d * (1.0 - out_rate) + inflow;
            }
            edge_flux
        })
        .collect();
    partials.iter().sum()
}
