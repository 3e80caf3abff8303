// src/mesh/mod.rs - triangle surface of the ice region and its file formats

pub mod hex_prism_mesher;
pub mod stl;

pub use hex_prism_mesher::HexPrismMesher;
pub use stl::{load_stl, read_stl, StlFormat};

use glam::{DVec3, Vec3};
use std::collections::HashMap;

/// Indexed triangle mesh. Triangles wind counter-clockwise seen from outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Corner positions of triangle `t`.
    pub fn corners(&self, t: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[t];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Unit normal of triangle `t` following its winding; zero for degenerate triangles.
    pub fn normal(&self, t: usize) -> Vec3 {
        let [a, b, c] = self.corners(t);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Enclosed volume by the divergence theorem; positive for outward winding.
    pub fn volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let a = self.vertices[a as usize].as_dvec3();
                let b = self.vertices[b as usize].as_dvec3();
                let c = self.vertices[c as usize].as_dvec3();
                a.dot(b.cross(c))
            })
            .sum::<f64>()
            / 6.0
    }

    pub fn surface_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let a: DVec3 = self.vertices[a as usize].as_dvec3();
                let b: DVec3 = self.vertices[b as usize].as_dvec3();
                let c: DVec3 = self.vertices[c as usize].as_dvec3();
                (b - a).cross(c - a).length() / 2.0
            })
            .sum()
    }

    /// True when every directed edge is matched by its reverse, i.e. the
    /// surface has no holes and consistent winding.
    ///
    /// Ice cells that touch only along an edge still pass: that edge is shared
    /// by four faces, two in each direction. Use [`is_manifold`](Self::is_manifold)
    /// to rule those out.
    pub fn is_closed(&self) -> bool {
        let mut balance: HashMap<(u32, u32), i64> = HashMap::new();
        for &[a, b, c] in &self.triangles {
            for (from, to) in [(a, b), (b, c), (c, a)] {
                if from < to {
                    *balance.entry((from, to)).or_insert(0) += 1;
                } else {
                    *balance.entry((to, from)).or_insert(0) -= 1;
                }
            }
        }
        balance.values().all(|&count| count == 0)
    }

    /// Closed, with every edge shared by exactly two triangles.
    pub fn is_manifold(&self) -> bool {
        let mut uses: HashMap<(u32, u32), u32> = HashMap::new();
        for &[a, b, c] in &self.triangles {
            for (from, to) in [(a, b), (b, c), (c, a)] {
                *uses.entry((from.min(to), from.max(to))).or_insert(0) += 1;
            }
        }
        uses.values().all(|&count| count == 2) && self.is_closed()
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tetrahedron() -> Mesh {
        Mesh {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            triangles: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        }
    }

    #[test]
    fn tetrahedron_metrics() {
        let mesh = tetrahedron();
        assert!(mesh.is_closed());
        assert!(mesh.is_manifold());
        assert_abs_diff_eq!(mesh.volume(), 1.0 / 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mesh.surface_area(), 1.5 + 3f64.sqrt() / 2.0, epsilon = 1e-6);
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::ZERO);
        assert_eq!(hi, Vec3::ONE);
        assert_eq!(mesh.normal(0), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn missing_face_is_an_open_surface() {
        let mut mesh = tetrahedron();
        mesh.triangles.pop();
        assert!(!mesh.is_closed());
        assert!(Mesh::new().bounds().is_none());
    }
}
