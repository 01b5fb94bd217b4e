use rand::{SeedableRng, rngs::StdRng};
use scatter_ngin::data_structures::surface::{SurfaceMesh, SurfaceVertex};

#[allow(dead_code)]
pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

/// Two triangles covering `[x0, x1] x [0, 1]` in the XZ plane, facing up.
#[allow(dead_code)]
pub fn quad(x0: f32, x1: f32) -> Vec<SurfaceVertex> {
    let v = |x: f32, z: f32| SurfaceVertex::new([x, 0.0, z], [0.0, 1.0, 0.0], [0.0, 0.0]);
    vec![
        v(x0, 0.0),
        v(x0, 1.0),
        v(x1, 0.0),
        v(x1, 0.0),
        v(x0, 1.0),
        v(x1, 1.0),
    ]
}

/// A 1x1 quad at `[0, 1]` next to a `width` x 1 quad starting at `x = 1`.
#[allow(dead_code)]
pub fn two_regions(width: f32) -> SurfaceMesh {
    let mut vertices = quad(0.0, 1.0);
    vertices.extend(quad(1.0, 1.0 + width));
    SurfaceMesh::non_indexed("regions", vertices)
}

/// Flat `size` x `size` square centred on the origin in the XZ plane.
#[allow(dead_code)]
pub fn flat_square(size: f32) -> SurfaceMesh {
    let mut plane = SurfaceMesh::plane("square", size, size);
    plane.rotate_x(cgmath::Deg(-90.0));
    plane
}
