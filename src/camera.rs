//! Look-at perspective camera and its uniform.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3, perspective};
use wgpu::util::DeviceExt;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Narrowest field of view the projection accepts; `fov: 0` from the bridge maps here.
pub const MIN_FOVY: f32 = 0.1;
/// Widest field of view the projection accepts.
pub const MAX_FOVY: f32 = 179.0;

/// Perspective camera looking at a fixed target.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    /// Vertical field of view.
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(position: [f32; 3], target: [f32; 3], fovy: f32, znear: f32, zfar: f32) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            fovy: Deg(fovy),
            aspect: 16.0 / 9.0,
            znear,
            zfar,
        }
    }

    /// Sets the pose. Returns whether anything changed.
    pub fn set_pose(&mut self, position: [f32; 3], fovy: f32) -> bool {
        let position = Point3::from(position);
        if self.position == position && self.fovy == Deg(fovy) {
            return false;
        }
        self.position = position;
        self.fovy = Deg(fovy);
        true
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Field of view actually projected with, kept inside `perspective`'s open interval.
    pub fn projection_fovy(&self) -> Deg<f32> {
        Deg(self.fovy.0.clamp(MIN_FOVY, MAX_FOVY))
    }

    /// World up, unless the camera looks straight up or down where +Z takes its place.
    fn up(&self) -> Vector3<f32> {
        let forward = self.target - self.position;
        if forward.magnitude2() > f32::EPSILON && forward.normalize().y.abs() > 1.0 - 1e-4 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        }
    }

    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        // a camera sitting on its target looks down -Z
        let target = if self.target == self.position {
            self.position - Vector3::unit_z()
        } else {
            self.target
        };
        let view = Matrix4::look_at_rh(self.position, target, self.up());
        let proj = perspective(self.projection_fovy(), self.aspect, self.znear, self.zfar);
        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = camera.build_view_projection_matrix().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of the camera: uniform, buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: &Camera) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_finite(m: Matrix4<f32>) -> bool {
        let cols: [[f32; 4]; 4] = m.into();
        cols.iter().flatten().all(|v| v.is_finite())
    }

    #[test]
    fn zero_fov_still_projects() {
        let camera = Camera::new([0.0, 50.0, 50.0], [0.0; 3], 0.0, 1.0, 2000.0);
        assert_eq!(camera.projection_fovy(), Deg(MIN_FOVY));
        assert!(is_finite(camera.build_view_projection_matrix()));
    }

    #[test]
    fn looking_straight_down_is_finite() {
        for position in [[0.0, 50.0, 0.0], [0.0, -50.0, 0.0], [0.0, 0.0, 0.0]] {
            let camera = Camera::new(position, [0.0; 3], 45.0, 1.0, 2000.0);
            assert!(is_finite(camera.build_view_projection_matrix()), "{position:?}");
        }
    }

    #[test]
    fn target_projects_to_the_centre_from_above() {
        let camera = Camera::new([0.0, 50.0, 0.0], [0.0; 3], 45.0, 1.0, 2000.0);
        let clip = camera.build_view_projection_matrix() * Vector3::new(0.0, 0.0, 0.0).extend(1.0);
        assert!(clip.w > 0.0);
        assert!((clip.x / clip.w).abs() < 1e-5 && (clip.y / clip.w).abs() < 1e-5);
    }
}
