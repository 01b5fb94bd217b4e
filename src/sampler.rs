//! Weighted random sampling of points on a mesh surface.
//!
//! [`SamplingStructure::build`] walks the triangles once and records a prefix
//! table of `area * weight`. Every [`SamplingStructure::sample`] afterwards
//! costs one binary search plus two draws for the barycentric coordinates.

use cgmath::{InnerSpace, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{data_structures::surface::SurfaceMesh, error::InvalidMeshError};

/// How triangles are weighted when choosing where a sample lands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Probability proportional to triangle area.
    #[default]
    Uniform,
    /// Probability proportional to area times the mean of the named vertex scalar.
    Attribute(String),
}

/// A point on the surface and the blended vertex normal there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub position: Vector3<f32>,
    /// Barycentric blend of the vertex normals, not renormalised.
    pub normal: Vector3<f32>,
}

/// Read-only index over a mesh for weighted triangle selection.
#[derive(Debug)]
pub struct SamplingStructure<'m> {
    mesh: &'m SurfaceMesh,
    // mesh triangle index for every entry of `cumulative`
    triangles: Vec<usize>,
    cumulative: Vec<f64>,
    skipped: usize,
}

impl<'m> SamplingStructure<'m> {
    pub fn build(mesh: &'m SurfaceMesh, policy: &WeightPolicy) -> Result<Self, InvalidMeshError> {
        let indices = mesh.indices();
        if indices.len() % 3 != 0 {
            return Err(InvalidMeshError::MalformedIndices(format!(
                "{} indices do not form whole triangles",
                indices.len()
            )));
        }
        if mesh.triangle_count() == 0 {
            return Err(InvalidMeshError::Empty);
        }
        let vertex_count = mesh.vertices().len();
        if let Some(idx) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(InvalidMeshError::MalformedIndices(format!(
                "index {idx} out of range for {vertex_count} vertices"
            )));
        }
        if let WeightPolicy::Attribute(name) = policy {
            let len = mesh
                .attribute_len(name)
                .ok_or_else(|| InvalidMeshError::MissingAttribute(name.clone()))?;
            if len < vertex_count {
                return Err(InvalidMeshError::AttributeLength {
                    name: name.clone(),
                    len,
                    vertices: vertex_count,
                });
            }
        }

        let mut triangles = Vec::with_capacity(mesh.triangle_count());
        let mut cumulative = Vec::with_capacity(mesh.triangle_count());
        let mut total = 0.0f64;
        for t in 0..mesh.triangle_count() {
            let weight = triangle_weight(mesh, t, policy);
            if !(weight.is_finite() && weight > 0.0) {
                continue;
            }
            total += weight;
            triangles.push(t);
            cumulative.push(total);
        }

        let skipped = mesh.triangle_count() - triangles.len();
        if triangles.is_empty() {
            return Err(InvalidMeshError::Degenerate {
                triangles: mesh.triangle_count(),
            });
        }
        if skipped > 0 {
            log::warn!(
                "{}: skipped {} of {} triangles with zero weighted area",
                mesh.name,
                skipped,
                mesh.triangle_count()
            );
        }

        Ok(Self {
            mesh,
            triangles,
            cumulative,
            skipped,
        })
    }

    pub fn mesh(&self) -> &SurfaceMesh {
        self.mesh
    }

    /// Sum of `area * weight` over all selectable triangles.
    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Number of selectable triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Triangles dropped at build time for having no weighted area.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Mesh triangle hit by `draw` in `[0, total_weight]`.
    ///
    /// Picks the first entry whose cumulative weight exceeds `draw`; draws at
    /// or past the end of the table map to the last selectable triangle.
    pub fn select(&self, draw: f64) -> usize {
        let slot = self.cumulative.partition_point(|&c| c <= draw);
        self.triangles[slot.min(self.triangles.len() - 1)]
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Sample {
        let draw = rng.random::<f64>() * self.total_weight();
        let triangle = self.select(draw);
        self.sample_triangle(triangle, rng.random(), rng.random())
    }

    /// Point of `triangle` for two draws in `[0, 1)`, folded into the unit triangle.
    pub(crate) fn sample_triangle(&self, triangle: usize, mut u: f32, mut v: f32) -> Sample {
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        let w = 1.0 - u - v;
        let [a, b, c] = self.mesh.triangle_indices(triangle);
        let vs = self.mesh.vertices();
        Sample {
            position: vs[a].position * w + vs[b].position * u + vs[c].position * v,
            normal: vs[a].normal * w + vs[b].normal * u + vs[c].normal * v,
        }
    }
}

fn triangle_weight(mesh: &SurfaceMesh, t: usize, policy: &WeightPolicy) -> f64 {
    let [a, b, c] = mesh.triangle_indices(t);
    let vs = mesh.vertices();
    let area = 0.5
        * (vs[b].position - vs[a].position)
            .cross(vs[c].position - vs[a].position)
            .magnitude() as f64;
    match policy {
        WeightPolicy::Uniform => area,
        WeightPolicy::Attribute(name) => {
            let mean = [a, b, c]
                .iter()
                .map(|&i| mesh.scalar(name, i).unwrap_or(f32::NAN) as f64)
                .sum::<f64>()
                / 3.0;
            area * mean
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::data_structures::surface::SurfaceVertex;

    fn strip() -> SurfaceMesh {
        // three unit-area triangles side by side, the middle one collapsed
        let n = [0.0, 0.0, 1.0];
        SurfaceMesh::non_indexed(
            "strip",
            vec![
                SurfaceVertex::new([0.0, 0.0, 0.0], n, [0.0, 0.0]),
                SurfaceVertex::new([2.0, 0.0, 0.0], n, [0.0, 0.0]),
                SurfaceVertex::new([0.0, 1.0, 0.0], n, [0.0, 0.0]),
                SurfaceVertex::new([3.0, 0.0, 0.0], n, [0.0, 0.0]),
                SurfaceVertex::new([4.0, 0.0, 0.0], n, [0.0, 0.0]),
                SurfaceVertex::new([5.0, 0.0, 0.0], n, [0.0, 0.0]),
                SurfaceVertex::new([6.0, 0.0, 0.0], n, [0.0, 0.0]),
                SurfaceVertex::new([8.0, 0.0, 0.0], n, [0.0, 0.0]),
                SurfaceVertex::new([6.0, 1.0, 0.0], n, [0.0, 0.0]),
            ],
        )
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let mesh = strip();
        let structure = SamplingStructure::build(&mesh, &WeightPolicy::Uniform).unwrap();
        assert_eq!(structure.len(), 2);
        assert_eq!(structure.skipped(), 1);
        assert!((structure.total_weight() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn boundary_draws_stay_in_range() {
        let mesh = strip();
        let structure = SamplingStructure::build(&mesh, &WeightPolicy::Uniform).unwrap();
        assert_eq!(structure.select(0.0), 0);
        assert_eq!(structure.select(1.0), 2);
        assert_eq!(structure.select(2.0 - f64::EPSILON), 2);
        assert_eq!(structure.select(2.0), 2);
    }

    #[test]
    fn collapsed_triangle_is_never_hit() {
        let mesh = strip();
        let structure = SamplingStructure::build(&mesh, &WeightPolicy::Uniform).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let s = structure.sample(&mut rng);
            assert!(s.position.x <= 2.0 || s.position.x >= 6.0);
        }
    }

    #[test]
    fn folded_coordinates_stay_inside() {
        let mesh = strip();
        let structure = SamplingStructure::build(&mesh, &WeightPolicy::Uniform).unwrap();
        let s = structure.sample_triangle(0, 0.9, 0.8);
        assert!(s.position.x >= 0.0 && s.position.y >= 0.0);
        assert!(s.position.x / 2.0 + s.position.y <= 1.0 + 1e-6);
    }
}
