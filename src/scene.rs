//! Scene composition: grounds, instance groups, lights and camera.
//!
//! [`SceneContext`] is the single owner of all CPU-side scene state. The flow
//! creates it once, runs [`SceneContext::populate`] before the first frame and
//! then only feeds it parameter updates and resizes. The GPU mirror lives in
//! [`crate::render::GpuScene`].

use std::collections::HashMap;

use cgmath::{Deg, Vector3};
use instant::Instant;
use rand::Rng;

use crate::{
    bridge::{BridgeMessage, CAMERA_OBJECT, ObjectValues},
    camera::Camera,
    config::{GroundShape, SceneConfig},
    data_structures::{
        instance::Instance,
        instance_group::{GroupId, InstanceGroup},
        surface::SurfaceMesh,
    },
    error::PlacementError,
    placer::place,
    sampler::{SamplingStructure, WeightPolicy},
};

/// Side length of the plane standing in for a ground asset that failed to load.
pub const FALLBACK_PLANE_SIZE: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroundId(pub(crate) usize);

impl GroundId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A sampling surface with a flat material colour.
#[derive(Clone, Debug)]
pub struct Ground {
    pub(crate) id: GroundId,
    pub name: String,
    /// Name the parameter bridge uses for this ground.
    pub bridge_name: String,
    /// Geometry in ground-local space.
    pub mesh: SurfaceMesh,
    pub origin: Vector3<f32>,
    pub weight: WeightPolicy,
    pub visible: bool,
    color: [f32; 3],
    color_dirty: bool,
}

impl Ground {
    pub fn new(name: impl Into<String>, mesh: SurfaceMesh, origin: Vector3<f32>, color: [f32; 3]) -> Self {
        let name = name.into();
        Self {
            id: GroundId(0),
            bridge_name: name.clone(),
            name,
            mesh,
            origin,
            weight: WeightPolicy::Uniform,
            visible: true,
            color,
            color_dirty: false,
        }
    }

    pub fn with_weight(mut self, weight: WeightPolicy) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_bridge_name(mut self, bridge_name: impl Into<String>) -> Self {
        self.bridge_name = bridge_name.into();
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn id(&self) -> GroundId {
        self.id
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    /// Returns whether the colour changed.
    pub fn set_color(&mut self, color: [f32; 3]) -> bool {
        if self.color == color {
            return false;
        }
        self.color = color;
        self.color_dirty = true;
        true
    }

    /// The new colour if it changed since the last call.
    pub fn take_color_change(&mut self) -> Option<[f32; 3]> {
        if !self.color_dirty {
            return None;
        }
        self.color_dirty = false;
        Some(self.color)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    /// The light shines from here towards the origin.
    pub position: Vector3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lighting {
    /// Ambient colour premultiplied by its intensity.
    pub ambient: [f32; 3],
    pub directional: Vec<DirectionalLight>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: [1.0, 1.0, 1.0],
            directional: Vec::new(),
        }
    }
}

/// Which ground a group is scattered on and how many instances it gets.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Placement {
    ground: String,
    count: usize,
}

/// Owner of every ground, group, light and the camera.
#[derive(Debug)]
pub struct SceneContext {
    pub camera: Camera,
    pub background: [f32; 3],
    pub lighting: Lighting,
    grounds: Vec<Ground>,
    groups: Vec<InstanceGroup>,
    placements: Vec<Placement>,
}

impl SceneContext {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            background: [1.0, 1.0, 1.0],
            lighting: Lighting::default(),
            grounds: Vec::new(),
            groups: Vec::new(),
            placements: Vec::new(),
        }
    }

    /// Builds the scene with procedural grounds only; asset grounds are skipped.
    pub fn from_config(config: &SceneConfig) -> Self {
        Self::from_config_with(config, &HashMap::new())
    }

    /// Builds the scene, taking asset ground meshes from `assets` by file name.
    ///
    /// A ground whose asset is missing falls back to a flat square so its
    /// groups still have a surface.
    pub fn from_config_with(config: &SceneConfig, assets: &HashMap<String, SurfaceMesh>) -> Self {
        let cam = &config.camera;
        let mut scene = Self::new(Camera::new(cam.position, cam.target, cam.fov, cam.near, cam.far));
        scene.background = config.background;
        let a = &config.ambient;
        scene.lighting = Lighting {
            ambient: a.color.map(|c| c * a.intensity),
            directional: config
                .lights
                .iter()
                .map(|l| DirectionalLight {
                    position: l.position.into(),
                    color: l.color,
                    intensity: l.intensity,
                })
                .collect(),
        };

        for (i, gc) in config.grounds.iter().enumerate() {
            let mut mesh = match &gc.shape {
                GroundShape::Plane { width, height } => SurfaceMesh::plane(&gc.name, *width, *height),
                GroundShape::Asset { file } => match assets.get(file) {
                    Some(mesh) => mesh.clone(),
                    None => {
                        log::warn!("{}: asset {} is not loaded, falling back to a plane", gc.name, file);
                        SurfaceMesh::plane(&gc.name, FALLBACK_PLANE_SIZE, FALLBACK_PLANE_SIZE)
                    }
                },
            };
            if gc.rotate_x_deg != 0.0 {
                mesh.rotate_x(Deg(gc.rotate_x_deg));
            }
            if gc.scale != [1.0; 3] {
                mesh.scale(gc.scale[0], gc.scale[1], gc.scale[2]);
            }
            let ground = Ground::new(&gc.name, mesh, gc.origin.into(), gc.color)
                .with_weight(gc.weight.clone())
                .with_bridge_name(format!("Ground{i}"))
                .with_visible(gc.visible);
            scene.add_ground(ground);
        }

        for gc in config.groups.iter() {
            let [w, h, d] = gc.size;
            let mut mesh = SurfaceMesh::cuboid(format!("{} box", gc.name), w, h, d);
            // rest the box on the surface instead of sinking it halfway
            mesh.translate(Vector3::new(0.0, h / 2.0, 0.0));
            let mut group = InstanceGroup::new(&gc.name, mesh, gc.capacity, gc.scale)
                .with_orientation(gc.orientation)
                .with_color(gc.color);
            if let Some(ground) = scene.ground_by_name(&gc.ground) {
                group = group.with_origin(Instance::from(ground.origin));
            }
            scene.add_group(group, &gc.ground, gc.count);
        }
        scene
    }

    pub fn add_ground(&mut self, mut ground: Ground) -> GroundId {
        let id = GroundId(self.grounds.len());
        ground.id = id;
        self.grounds.push(ground);
        id
    }

    /// Registers `group` to receive `count` samples from the ground named `ground`.
    pub fn add_group(&mut self, mut group: InstanceGroup, ground: &str, count: usize) -> GroupId {
        let id = GroupId(self.groups.len());
        group.id = id;
        self.groups.push(group);
        self.placements.push(Placement {
            ground: ground.to_string(),
            count,
        });
        id
    }

    pub fn grounds(&self) -> &[Ground] {
        &self.grounds
    }

    pub fn groups(&self) -> &[InstanceGroup] {
        &self.groups
    }

    pub fn ground(&self, id: GroundId) -> Option<&Ground> {
        self.grounds.get(id.0)
    }

    pub fn ground_mut(&mut self, id: GroundId) -> Option<&mut Ground> {
        self.grounds.get_mut(id.0)
    }

    pub fn group(&self, id: GroupId) -> Option<&InstanceGroup> {
        self.groups.get(id.0)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut InstanceGroup> {
        self.groups.get_mut(id.0)
    }

    pub fn ground_by_name(&self, name: &str) -> Option<&Ground> {
        self.grounds.iter().find(|g| g.name == name)
    }

    pub fn ground_by_bridge_name(&self, name: &str) -> Option<&Ground> {
        self.grounds.iter().find(|g| g.bridge_name == name)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&InstanceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Ground the group is scattered on, if it exists.
    pub fn ground_of(&self, id: GroupId) -> Option<&Ground> {
        let placement = self.placements.get(id.0)?;
        self.ground_by_name(&placement.ground)
    }

    /// Groups are drawn only together with their ground.
    pub fn is_group_visible(&self, id: GroupId) -> bool {
        self.ground_of(id).is_some_and(|g| g.visible)
    }

    /// Runs the one-shot placement pass for every group.
    ///
    /// Each group is sampled from its own ground. A failing group is logged
    /// and reported in the returned list; the remaining groups are still
    /// placed.
    pub fn populate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<(GroupId, PlacementError)> {
        let mut failures = Vec::new();
        for (group, placement) in self.groups.iter_mut().zip(self.placements.iter()) {
            let result = match self.grounds.iter().find(|g| g.name == placement.ground) {
                None => Err(PlacementError::UnknownGround(placement.ground.clone())),
                Some(ground) => {
                    let started = Instant::now();
                    SamplingStructure::build(&ground.mesh, &ground.weight)
                        .map_err(PlacementError::from)
                        .and_then(|structure| {
                            log::info!("{}: .build() took {:?}", ground.name, started.elapsed());
                            place(&structure, group, placement.count, rng).map_err(PlacementError::from)
                        })
                }
            };
            if let Err(e) = result {
                log::error!("Placement of {} failed: {}", group.name, e);
                failures.push((group.id, e));
            }
        }
        failures
    }

    /// Applies one parameter update. Returns whether scene state changed.
    ///
    /// Applying the same values twice changes nothing the second time.
    pub fn apply(&mut self, message: &BridgeMessage) -> bool {
        match &message.values {
            ObjectValues::Camera { position, fov } if message.target == CAMERA_OBJECT => {
                self.camera.set_pose(*position, *fov)
            }
            ObjectValues::Ground { color } => {
                match self.grounds.iter_mut().find(|g| g.bridge_name == message.target) {
                    Some(ground) => ground.set_color(*color),
                    None => {
                        log::warn!("No ground named {} for a colour update", message.target);
                        false
                    }
                }
            }
            ObjectValues::Camera { .. } => {
                log::warn!("Camera values sent to {}", message.target);
                false
            }
        }
    }

    /// New viewport size; only the camera aspect ratio depends on it.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }
}
