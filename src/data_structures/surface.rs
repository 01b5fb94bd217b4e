//! CPU-side triangle meshes used as sampling surfaces and instance shapes.
//!
//! A [`SurfaceMesh`] keeps positions, normals and texture coordinates in plain
//! memory so it can be sampled before (and independently of) any GPU upload.

use std::collections::HashMap;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Rad, SquareMatrix, Vector2, Vector3};

/// Attribute name resolving to the `u` texture coordinate.
pub const UV_ATTRIBUTE: &str = "uv";
/// Attribute name resolving to the `v` texture coordinate.
pub const UV_Y_ATTRIBUTE: &str = "uv.y";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceVertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub tex_coords: Vector2<f32>,
}

impl SurfaceVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            tex_coords: tex_coords.into(),
        }
    }
}

/// An indexed triangle list with optional named per-vertex scalars.
#[derive(Clone, Debug, Default)]
pub struct SurfaceMesh {
    pub name: String,
    vertices: Vec<SurfaceVertex>,
    indices: Vec<u32>,
    attributes: HashMap<String, Vec<f32>>,
}

impl SurfaceMesh {
    pub fn new(name: impl Into<String>, vertices: Vec<SurfaceVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            attributes: HashMap::new(),
        }
    }

    /// Every three consecutive vertices form one triangle.
    pub fn non_indexed(name: impl Into<String>, vertices: Vec<SurfaceVertex>) -> Self {
        let indices = (0..vertices.len() as u32).collect();
        Self::new(name, vertices, indices)
    }

    /// Attach a named scalar per vertex, e.g. a painted density map.
    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }

    /// Merges `other` into this mesh. Only attributes both meshes carry survive.
    pub fn append(&mut self, other: SurfaceMesh) {
        let offset = self.vertices.len() as u32;
        if self.vertices.is_empty() {
            self.attributes = other.attributes;
        } else {
            let mut theirs = other.attributes;
            self.attributes.retain(|name, values| match theirs.remove(name) {
                Some(more) => {
                    values.extend(more);
                    true
                }
                None => false,
            });
        }
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + offset));
    }

    /// A `width` x `height` rectangle in the XY plane facing +Z, split into two
    /// triangles. `u` runs left to right, `v` bottom to top.
    pub fn plane(name: impl Into<String>, width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            SurfaceVertex::new([-hw, hh, 0.0], normal, [0.0, 1.0]),
            SurfaceVertex::new([hw, hh, 0.0], normal, [1.0, 1.0]),
            SurfaceVertex::new([-hw, -hh, 0.0], normal, [0.0, 0.0]),
            SurfaceVertex::new([hw, -hh, 0.0], normal, [1.0, 0.0]),
        ];
        Self::new(name, vertices, vec![0, 2, 1, 2, 3, 1])
    }

    /// An axis-aligned box centred on the origin with flat-shaded faces.
    pub fn cuboid(name: impl Into<String>, width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
        // (normal, u axis, v axis) with u x v == normal so every face winds CCW
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let extent = |axis: Vector3<f32>| {
            axis.x.abs() * half.x + axis.y.abs() * half.y + axis.z.abs() * half.z
        };

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let (n, u, v): (Vector3<f32>, Vector3<f32>, Vector3<f32>) =
                (normal.into(), u.into(), v.into());
            let centre = n * extent(n);
            let (du, dv) = (u * extent(u), v * extent(v));
            let base = vertices.len() as u32;
            for (su, sv, uv) in [
                (-1.0, -1.0, [0.0, 1.0]),
                (1.0, -1.0, [1.0, 1.0]),
                (1.0, 1.0, [1.0, 0.0]),
                (-1.0, 1.0, [0.0, 0.0]),
            ] {
                vertices.push(SurfaceVertex {
                    position: centre + du * su + dv * sv,
                    normal: n,
                    tex_coords: uv.into(),
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(name, vertices, indices)
    }

    pub fn vertices(&self) -> &[SurfaceVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of triangle `i`. Panics if `i` is out of range.
    pub fn triangle_indices(&self, i: usize) -> [usize; 3] {
        let c = &self.indices[i * 3..i * 3 + 3];
        [c[0] as usize, c[1] as usize, c[2] as usize]
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        name == UV_ATTRIBUTE || name == UV_Y_ATTRIBUTE || self.attributes.contains_key(name)
    }

    /// Number of values attribute `name` carries; the uv attributes have one per vertex.
    pub fn attribute_len(&self, name: &str) -> Option<usize> {
        match name {
            UV_ATTRIBUTE | UV_Y_ATTRIBUTE => Some(self.vertices.len()),
            _ => self.attributes.get(name).map(Vec::len),
        }
    }

    /// Scalar value of attribute `name` at vertex `vertex`.
    pub fn scalar(&self, name: &str, vertex: usize) -> Option<f32> {
        match name {
            UV_ATTRIBUTE => self.vertices.get(vertex).map(|v| v.tex_coords.x),
            UV_Y_ATTRIBUTE => self.vertices.get(vertex).map(|v| v.tex_coords.y),
            _ => self.attributes.get(name)?.get(vertex).copied(),
        }
    }

    /// Transforms positions by `m` and normals by its inverse transpose.
    pub fn apply_matrix(&mut self, m: Matrix4<f32>) {
        let linear = Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate());
        let normal_matrix = linear.invert().map(|inv| inv.transpose());
        for v in self.vertices.iter_mut() {
            v.position = (m * v.position.extend(1.0)).truncate();
            if let Some(nm) = normal_matrix {
                let n = nm * v.normal;
                if n.magnitude2() > 0.0 {
                    v.normal = n.normalize();
                }
            }
        }
    }

    pub fn rotate_x(&mut self, angle: impl Into<Rad<f32>>) {
        self.apply_matrix(Matrix4::from_angle_x(angle));
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.apply_matrix(Matrix4::from_nonuniform_scale(x, y, z));
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.apply_matrix(Matrix4::from_translation(offset));
    }

    /// Axis-aligned bounds of all vertex positions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            let p = v.position;
            (
                Vector3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Vector3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Deg;

    use super::*;

    #[test]
    fn rotated_plane_lies_in_xz_and_faces_up() {
        let mut plane = SurfaceMesh::plane("ground", 50.0, 50.0);
        plane.rotate_x(Deg(-90.0));
        for v in plane.vertices() {
            assert!(v.position.y.abs() < 1e-4);
            assert!((v.normal - Vector3::unit_y()).magnitude() < 1e-5);
        }
        let (lo, hi) = plane.bounds().unwrap();
        assert!((lo.x + 25.0).abs() < 1e-4 && (hi.z - 25.0).abs() < 1e-4);
    }

    #[test]
    fn cuboid_faces_point_outwards() {
        let cube = SurfaceMesh::cuboid("box", 1.0, 3.0, 1.0);
        assert_eq!(cube.triangle_count(), 12);
        for t in 0..cube.triangle_count() {
            let [a, b, c] = cube.triangle_indices(t);
            let vs = cube.vertices();
            let face = (vs[b].position - vs[a].position).cross(vs[c].position - vs[a].position);
            assert!(face.dot(vs[a].normal) > 0.0, "triangle {t} winds inwards");
        }
        let (lo, hi) = cube.bounds().unwrap();
        assert_eq!((lo.y, hi.y), (-1.5, 1.5));
    }

    #[test]
    fn uv_attribute_resolves_to_texture_coordinates() {
        let plane = SurfaceMesh::plane("p", 2.0, 2.0).with_attribute("density", vec![0.5; 4]);
        assert_eq!(plane.scalar(UV_ATTRIBUTE, 1), Some(1.0));
        assert_eq!(plane.scalar(UV_Y_ATTRIBUTE, 2), Some(0.0));
        assert_eq!(plane.scalar("density", 3), Some(0.5));
        assert!(!plane.has_attribute("heat"));
    }

    #[test]
    fn append_offsets_indices_and_drops_partial_attributes() {
        let mut merged = SurfaceMesh::plane("a", 1.0, 1.0).with_attribute("density", vec![1.0; 4]);
        merged.append(SurfaceMesh::plane("b", 1.0, 1.0));
        assert_eq!(merged.triangle_count(), 4);
        assert_eq!(merged.triangle_indices(2), [4, 6, 5]);
        assert!(!merged.has_attribute("density"));
    }
}
