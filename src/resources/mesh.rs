//! glTF/GLB files as sampling surfaces.
//!
//! Every triangle primitive reachable from the default scene is flattened
//! into one [`SurfaceMesh`] with node transforms applied. Materials, images
//! and animations are ignored.

use anyhow::Context as _;
use cgmath::{Matrix4, SquareMatrix};
use gltf::buffer::Source;

use crate::{
    data_structures::surface::{SurfaceMesh, SurfaceVertex},
    error::ResourceLoadError,
    resources::load_binary,
};

pub async fn load_surface_gltf(file_name: &str) -> Result<SurfaceMesh, ResourceLoadError> {
    let load = async {
        let bytes = load_binary(file_name).await?;
        let gltf = gltf::Gltf::from_slice(&bytes)?;
        let buffers = load_buffers(&gltf).await?;
        surface_from_document(file_name, &gltf.document, &buffers)
    };
    load.await.map_err(|e| ResourceLoadError::new(file_name, e))
}

async fn load_buffers(gltf: &gltf::Gltf) -> anyhow::Result<Vec<Vec<u8>>> {
    let external = gltf
        .buffers()
        .any(|b| matches!(b.source(), Source::Uri(uri) if !uri.starts_with("data:")));
    if !external {
        // binary chunk and embedded base64 only
        let buffers = gltf::import_buffers(&gltf.document, None, gltf.blob.clone())?;
        return Ok(buffers.into_iter().map(|data| data.0).collect());
    }

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            Source::Bin => {
                let blob = gltf.blob.as_deref().context("GLB binary chunk is missing")?;
                buffer_data.push(blob.to_vec());
            }
            Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }
    Ok(buffer_data)
}

/// Flattens the default scene (or the first one) of `document` into one mesh.
pub fn surface_from_document(
    name: &str,
    document: &gltf::Document,
    buffers: &[Vec<u8>],
) -> anyhow::Result<SurfaceMesh> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("document has no scene")?;

    let mut surface = SurfaceMesh::new(name, Vec::new(), Vec::new());
    for node in scene.nodes() {
        collect_node(&node, Matrix4::identity(), buffers, &mut surface);
    }
    Ok(surface)
}

fn collect_node(node: &gltf::Node, parent: Matrix4<f32>, buffers: &[Vec<u8>], surface: &mut SurfaceMesh) {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("unknown_mesh");
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping {:?} primitive of {}", primitive.mode(), mesh_name);
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                continue;
            };

            let mut vertices = positions
                .map(|p| SurfaceVertex::new(p, [0.0, 1.0, 0.0], [0.0, 0.0]))
                .collect::<Vec<_>>();
            if let Some(normals) = reader.read_normals() {
                for (vertex, normal) in vertices.iter_mut().zip(normals) {
                    vertex.normal = normal.into();
                }
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                for (vertex, uv) in vertices.iter_mut().zip(tex_coords) {
                    vertex.tex_coords = uv.into();
                }
            }
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };

            let mut part = SurfaceMesh::new(mesh_name, vertices, indices);
            part.apply_matrix(world);
            surface.append(part);
        }
    }
    for child in node.children() {
        collect_node(&child, world, buffers, surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // one triangle (0,0,0) (2,0,0) (0,0,2), its node moved 10 along x
    const TRIANGLE: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "translation": [10.0, 0.0, 0.0] }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAQAAAAAAAAAAAAAAAAAAAAAAAAABA"
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [2.0, 0.0, 2.0]
        }]
    }"#;

    #[test]
    fn node_transforms_are_applied() {
        let gltf = gltf::Gltf::from_slice(TRIANGLE.as_bytes()).unwrap();
        let buffers = gltf::import_buffers(&gltf.document, None, None)
            .unwrap()
            .into_iter()
            .map(|data| data.0)
            .collect::<Vec<_>>();

        let surface = surface_from_document("triangle", &gltf.document, &buffers).unwrap();
        assert_eq!(surface.triangle_count(), 1);
        let (lo, hi) = surface.bounds().unwrap();
        assert_eq!((lo.x, hi.x), (10.0, 12.0));
        assert_eq!((lo.z, hi.z), (0.0, 2.0));
    }
}
