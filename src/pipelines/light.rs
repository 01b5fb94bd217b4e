use wgpu::util::DeviceExt;

use crate::scene::Lighting;

/// Directional lights beyond this count are ignored by the shader.
pub const MAX_LIGHTS: usize = 4;

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    // xyz points from the surface towards the light
    direction: [f32; 4],
    // rgb premultiplied by intensity
    color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    lights: [DirectionalLightRaw; MAX_LIGHTS],
    count: u32,
    exposure: f32,
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: [u32; 2],
}

impl LightUniform {
    pub fn new(lighting: &Lighting, exposure: f32) -> Self {
        if lighting.directional.len() > MAX_LIGHTS {
            log::warn!(
                "{} directional lights configured, only the first {} are used",
                lighting.directional.len(),
                MAX_LIGHTS
            );
        }
        let mut lights = [DirectionalLightRaw::default(); MAX_LIGHTS];
        for (raw, light) in lights.iter_mut().zip(lighting.directional.iter()) {
            let [r, g, b] = light.color.map(|c| c * light.intensity);
            raw.direction = [light.position.x, light.position.y, light.position.z, 0.0];
            raw.color = [r, g, b, 1.0];
        }
        let [r, g, b] = lighting.ambient;
        Self {
            ambient: [r, g, b, 1.0],
            lights,
            count: lighting.directional.len().min(MAX_LIGHTS) as u32,
            exposure,
            _padding: [0; 2],
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::scene::DirectionalLight;

    #[test]
    fn uniform_matches_wgsl_layout() {
        // ambient + 4 * (direction, color) + (count, exposure, pad, pad)
        assert_eq!(std::mem::size_of::<LightUniform>(), 16 + MAX_LIGHTS * 32 + 16);
    }

    #[test]
    fn extra_lights_are_dropped() {
        let light = DirectionalLight {
            position: Vector3::new(1.0, 2.0, 3.0),
            color: [1.0, 0.5, 0.0],
            intensity: 2.0,
        };
        let lighting = Lighting {
            ambient: [0.1, 0.1, 0.1],
            directional: vec![light; MAX_LIGHTS + 2],
        };
        let uniform = LightUniform::new(&lighting, 1.0);
        assert_eq!(uniform.count(), MAX_LIGHTS as u32);
        assert_eq!(uniform.lights[0].color, [2.0, 1.0, 0.0, 1.0]);
        assert_eq!(uniform.lights[0].direction, [1.0, 2.0, 3.0, 0.0]);
    }
}
