use super::attachment::NOT_CANDIDATE;
use crate::constants::CELL_CAPACITY;
use crate::medium::ResolvedRates;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FreezingTally {
    pub frozen_mass: f64,
    pub discarded_mass: f64,
    pub newly_frozen: usize,
}

impl FreezingTally {
    fn merge(self, other: Self) -> Self {
        Self {
            frozen_mass: self.frozen_mass + other.frozen_mass,
            discarded_mass: self.discarded_mass + other.discarded_mass,
            newly_frozen: self.newly_frozen + other.newly_frozen,
        }
    }
}

/// Freeze boundary mass on the cells tagged by the attachment pass.
///
/// A cell whose crystal mass reaches capacity turns to ice; whatever it held
/// beyond capacity, together with its leftover boundary and diffusive mass,
/// is dropped and counted as discarded.
pub(crate) fn freeze(
    row_len: usize,
    occupancy: &mut [bool],
    crystal: &mut [f32],
    boundary: &mut [f32],
    diffusive: &mut [f32],
    shells: &[u8],
    rates: &ResolvedRates,
) -> FreezingTally {
    let partials: Vec<FreezingTally> = occupancy
        .par_chunks_mut(row_len)
        .zip(crystal.par_chunks_mut(row_len))
        .zip(boundary.par_chunks_mut(row_len))
        .zip(diffusive.par_chunks_mut(row_len))
        .zip(shells.par_chunks(row_len))
        .map(|((((o_row, c_row), b_row), d_row), s_row)| {
            let mut tally = FreezingTally::default();
            for x in 0..o_row.len() {
                let code = s_row[x];
                if code == NOT_CANDIDATE {
                    continue;
                }
                let mu = rates.by_dense_index(code as usize);
                let frozen = b_row[x] * mu;
                b_row[x] -= frozen;
                c_row[x] += frozen;
                tally.frozen_mass += frozen as f64;

                if c_row[x] >= CELL_CAPACITY {
                    let excess = (c_row[x] - CELL_CAPACITY) as f64;
                    tally.discarded_mass += excess + b_row[x] as f64 + d_row[x] as f64;
                    tally.newly_frozen += 1;
                    o_row[x] = true;
                    c_row[x] = CELL_CAPACITY;
                    b_row[x] = 0.0;
                    d_row[x] = 0.0;
                }
            }
            tally
        })
        .collect();
    partials.into_iter().fold(FreezingTally::default(), FreezingTally::merge)
}
