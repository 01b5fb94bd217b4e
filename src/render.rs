//! GPU mirror of a [`SceneContext`].
//!
//! [`GpuScene`] owns one mesh, material and instance buffer per ground and per
//! instance group. [`GpuScene::sync`] pushes whatever changed on the CPU side
//! (placed instances, ground colours, the camera) and [`GpuScene::draw`]
//! records the draw calls. Grounds are single-instance draws. A hidden ground
//! hides the groups scattered on it as well.

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::{Instance, InstanceRaw},
        instance_group::GroupId,
        model::{DrawModel, Material, Mesh},
        texture::Texture,
    },
    scene::{GroundId, SceneContext},
};

/// One instanced draw: a mesh, its material and the instance buffer.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a Mesh,
    pub material: &'a Material,
    pub amount: usize,
}

#[derive(Debug)]
struct GpuGround {
    id: GroundId,
    mesh: Mesh,
    material: Material,
    instance: wgpu::Buffer,
}

#[derive(Debug)]
struct GpuGroup {
    id: GroupId,
    mesh: Mesh,
    material: Material,
    instance: wgpu::Buffer,
    uploaded: usize,
}

#[derive(Debug)]
pub struct GpuScene {
    grounds: Vec<GpuGround>,
    groups: Vec<GpuGroup>,
}

impl GpuScene {
    /// Uploads geometry and materials. Instance data follows on the first
    /// [`sync`](Self::sync).
    ///
    /// Grounds are shaded with their flat colour; groups get `matcap` if one
    /// was loaded.
    pub fn new(ctx: &Context, scene: &SceneContext, matcap: Option<&Texture>) -> Self {
        let device = &ctx.device;
        let white = Texture::create_solid(device, &ctx.queue, [255; 4], "white");
        let matcap = matcap.unwrap_or(&white);

        let grounds = scene
            .grounds()
            .iter()
            .map(|ground| {
                let raw = Instance::from(ground.origin).to_raw();
                GpuGround {
                    id: ground.id(),
                    mesh: Mesh::from_surface(device, &ground.mesh),
                    material: Material::new(device, &ground.name, ground.color(), &white, &ctx.material_layout),
                    instance: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{} Instance Buffer", ground.name)),
                        contents: bytemuck::cast_slice(&[raw]),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                }
            })
            .collect();

        let groups = scene
            .groups()
            .iter()
            .map(|group| {
                let size = (group.capacity().max(1) * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress;
                GpuGroup {
                    id: group.id(),
                    mesh: Mesh::from_surface(device, &group.mesh),
                    material: Material::new(device, &group.name, group.color, matcap, &ctx.material_layout),
                    instance: device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(&format!("{} Instance Buffer", group.name)),
                        size,
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }),
                    uploaded: 0,
                }
            })
            .collect();

        Self { grounds, groups }
    }

    /// Writes CPU-side changes to the GPU. Unchanged groups cost nothing.
    pub fn sync(&mut self, ctx: &mut Context, scene: &mut SceneContext) {
        for gpu in self.groups.iter_mut() {
            let Some(group) = scene.group_mut(gpu.id) else {
                continue;
            };
            if let Some(raw) = group.take_dirty() {
                ctx.queue.write_buffer(&gpu.instance, 0, bytemuck::cast_slice(&raw));
                gpu.uploaded = raw.len();
                log::debug!("Uploaded {} instances of {}", raw.len(), group.name);
            }
        }
        for gpu in self.grounds.iter() {
            if let Some(color) = scene.ground_mut(gpu.id).and_then(|g| g.take_color_change()) {
                gpu.material.set_color(&ctx.queue, color);
            }
        }
        ctx.camera.write(&ctx.queue, &scene.camera);
    }

    /// Visible draws in order: grounds first, then the groups on them.
    pub fn renders<'a>(&'a self, scene: &SceneContext) -> Vec<Instanced<'a>> {
        let grounds = self
            .grounds
            .iter()
            .filter(|gpu| scene.ground(gpu.id).is_some_and(|g| g.visible))
            .map(|gpu| Instanced {
                instance: &gpu.instance,
                mesh: &gpu.mesh,
                material: &gpu.material,
                amount: 1,
            });
        let groups = self
            .groups
            .iter()
            .filter(|gpu| gpu.uploaded > 0 && scene.is_group_visible(gpu.id))
            .map(|gpu| Instanced {
                instance: &gpu.instance,
                mesh: &gpu.mesh,
                material: &gpu.material,
                amount: gpu.uploaded,
            });
        grounds.chain(groups).collect()
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, ctx: &Context, scene: &SceneContext) {
        render_pass.set_pipeline(&ctx.pipeline);
        for instanced in self.renders(scene) {
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_mesh_instanced(
                instanced.mesh,
                instanced.material,
                0..instanced.amount as u32,
                &ctx.camera.bind_group,
                &ctx.light.bind_group,
            );
        }
    }
}
