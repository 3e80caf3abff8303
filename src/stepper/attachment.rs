use crate::field::{Dimensions, DIRECTIONS};
use crate::medium::{NeighborShell, ResolvedRates};
use rayon::prelude::*;

/// Shell code for cells that are ice or touch no ice.
pub(crate) const NOT_CANDIDATE: u8 = u8::MAX;

/// Ice-neighbor shell of the cell at `(x, y, z)`, or `None` if it touches no ice.
pub fn classify(dims: Dimensions, occupancy: &[bool], x: usize, y: usize, z: usize) -> Option<NeighborShell> {
    let mut in_plane = 0u8;
    let mut vertical = 0u8;
    for dir in DIRECTIONS {
        if let Some(n) = dims.neighbor(x, y, z, dir) {
            if occupancy[n] {
                if dir.is_vertical() {
                    vertical += 1;
                } else {
                    in_plane += 1;
                }
            }
        }
    }
    if in_plane == 0 && vertical == 0 {
        None
    } else {
        Some(NeighborShell::new(in_plane, vertical))
    }
}

/// Record the shell code of every free cell that touches ice, or
/// [`NOT_CANDIDATE`]. Returns the number of boundary candidates.
///
/// Shells come from the committed occupancy, so every pass of a tick sees the
/// same classification and freezing never sees same-tick occupancy changes.
pub(crate) fn tag_shells(dims: Dimensions, occupancy: &[bool], shells: &mut [u8]) -> usize {
    let row_len = dims.x;
    shells
        .par_chunks_mut(row_len)
        .enumerate()
        .map(|(row, s_row)| {
            let y = row % dims.y;
            let z = row / dims.y;
            let base = row * row_len;
            let mut candidates = 0;
            for (x, code) in s_row.iter_mut().enumerate() {
                *code = NOT_CANDIDATE;
                if occupancy[base + x] {
                    continue;
                }
                if let Some(shell) = classify(dims, occupancy, x, y, z) {
                    *code = shell.dense_index() as u8;
                    candidates += 1;
                }
            }
            candidates
        })
        .sum()
}

/// Move vapor into boundary mass on every tagged cell, in place. Returns the attached mass.
pub(crate) fn attach(
    row_len: usize,
    diffusive: &mut [f32],
    boundary: &mut [f32],
    shells: &[u8],
    fractions: &ResolvedRates,
) -> f64 {
    let partials: Vec<f64> = diffusive
        .par_chunks_mut(row_len)
        .zip(boundary.par_chunks_mut(row_len))
        .zip(shells.par_chunks(row_len))
        .map(|((d_row, b_row), s_row)| {
            let mut attached = 0.0f64;
            for x in 0..d_row.len() {
                let code = s_row[x];
                if code == NOT_CANDIDATE {
                    continue;
                }
                let moved = d_row[x] * fractions.by_dense_index(code as usize);
                d_row[x] -= moved;
                b_row[x] += moved;
                attached += moved as f64;
            }
            attached
        })
        .collect();
    partials.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::Medium;

    #[test]
    fn counts_in_plane_and_vertical_ice() {
        let dims = Dimensions::new(5, 5, 5).unwrap();
        let mut occupancy = vec![false; dims.cell_count()];
        occupancy[dims.index(3, 2, 2)] = true;
        occupancy[dims.index(2, 3, 2)] = true;
        occupancy[dims.index(2, 2, 1)] = true;

        assert_eq!(classify(dims, &occupancy, 2, 2, 2), Some(NeighborShell::new(2, 1)));
        assert_eq!(classify(dims, &occupancy, 0, 0, 4), None);
        // (3, 2, 2) is ice; its own ring holds (2, 3, 2) through offset (-1, 1)
        assert_eq!(classify(dims, &occupancy, 3, 2, 2), Some(NeighborShell::new(1, 0)));
    }

    #[test]
    fn moves_threshold_fraction_and_tags_shells() {
        let dims = Dimensions::new(3, 3, 3).unwrap();
        let mut occupancy = vec![false; dims.cell_count()];
        occupancy[dims.index(1, 1, 0)] = true;
        let mut diffusive = vec![1.0f32; dims.cell_count()];
        diffusive[dims.index(1, 1, 0)] = 0.0;
        let mut boundary = vec![0.0f32; dims.cell_count()];
        let mut shells = vec![0u8; dims.cell_count()];

        // beta_01 = 2.5 attaches 40% per tick
        let fractions = Medium::default().resolved_attachment();
        let candidates = tag_shells(dims, &occupancy, &mut shells);
        let attached = attach(dims.x, &mut diffusive, &mut boundary, &shells, &fractions);

        let above = dims.index(1, 1, 1);
        assert!((boundary[above] - 0.4).abs() < 1e-6);
        assert!((diffusive[above] - 0.6).abs() < 1e-6);
        assert_eq!(shells[above], NeighborShell::new(0, 1).dense_index() as u8);
        assert_eq!(shells[dims.index(1, 1, 0)], NOT_CANDIDATE);
        assert_eq!(shells[dims.index(0, 0, 2)], NOT_CANDIDATE);
        // six in-plane neighbors in the bottom layer plus the cell above
        assert_eq!(candidates, 7);
        assert!(attached > 0.0);
    }
}
