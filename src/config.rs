//! Scene description loaded from JSON.
//!
//! Every field has a default, so a config file only needs to list what it
//! changes. [`SceneConfig::default`] is the meadow scene: three grounds with
//! one box group each, only the far ground visible.

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::instance_group::{Orientation, ScalePolicy},
    sampler::WeightPolicy,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed for placement. Taken from the clock when absent.
    pub seed: Option<u64>,
    pub camera: CameraConfig,
    pub background: [f32; 3],
    pub ambient: LightConfig,
    pub lights: Vec<LightConfig>,
    pub grounds: Vec<GroundConfig>,
    pub groups: Vec<GroupConfig>,
    /// Image used as matcap on instanced materials.
    pub matcap: Option<String>,
    /// Editor project state restored through the parameter bridge.
    pub project_state: Option<String>,
    pub sheet: String,
    pub mailbox_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let ground = |name: &str,
                      origin: [f32; 3],
                      scale: [f32; 3],
                      color: [f32; 3],
                      visible: bool| GroundConfig {
            name: name.to_string(),
            shape: GroundShape::Plane {
                width: 50.0,
                height: 50.0,
            },
            origin,
            rotate_x_deg: -90.0,
            scale,
            color,
            weight: WeightPolicy::Attribute("uv".to_string()),
            visible,
        };
        let group = |name: &str, ground: &str, count: usize, scale: ScalePolicy| GroupConfig {
            name: name.to_string(),
            ground: ground.to_string(),
            capacity: 105_000,
            count,
            scale,
            orientation: Orientation::AxisAligned,
            size: [1.0, 3.0, 1.0],
            color: [0.267, 0.267, 0.267],
        };
        Self {
            seed: None,
            camera: CameraConfig::default(),
            background: [1.0, 1.0, 1.0],
            ambient: LightConfig {
                position: [0.0; 3],
                color: [1.0, 1.0, 1.0],
                intensity: 1.0,
            },
            lights: vec![
                LightConfig {
                    position: [50.0, 50.0, 100.0],
                    color: [1.0, 1.0, 1.0],
                    intensity: 8.0,
                },
                LightConfig {
                    position: [-50.0, 50.0, 100.0],
                    color: [1.0, 1.0, 1.0],
                    intensity: 8.0,
                },
            ],
            grounds: vec![
                ground("groundA", [-25.0, 0.0, -25.0], [1.0, 1.0, 1.0], [0.502, 0.502, 0.502], false),
                ground("groundB", [25.0, 0.0, -25.0], [1.0, 1.0, 1.0], [1.0, 0.271, 0.0], false),
                ground("groundC", [0.0, 0.0, -500.0], [8.0, 1.0, 20.0], [1.0, 0.078, 0.576], true),
            ],
            groups: vec![
                group("meshA", "groundA", 1000, ScalePolicy::SQUAT),
                group("meshB", "groundB", 500, ScalePolicy::TALL),
                group("meshC", "groundC", 105_000, ScalePolicy::EVEN),
            ],
            matcap: None,
            project_state: None,
            sheet: "Animated scene".to_string(),
            mailbox_capacity: 32,
        }
    }
}

impl SceneConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 50.0, 50.0],
            target: [0.0, 0.0, 0.0],
            fov: 45.0,
            near: 1.0,
            far: 2000.0,
        }
    }
}

/// A directional light shining from `position` towards the origin, or the
/// ambient term when used as [`SceneConfig::ambient`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 50.0, 0.0],
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GroundShape {
    Plane { width: f32, height: f32 },
    /// A glTF/GLB file under the asset root.
    Asset { file: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub name: String,
    pub shape: GroundShape,
    pub origin: [f32; 3],
    /// Rotation about X applied to the geometry before scaling.
    pub rotate_x_deg: f32,
    pub scale: [f32; 3],
    pub color: [f32; 3],
    pub weight: WeightPolicy,
    pub visible: bool,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            name: "ground".to_string(),
            shape: GroundShape::Plane {
                width: 50.0,
                height: 50.0,
            },
            origin: [0.0; 3],
            rotate_x_deg: -90.0,
            scale: [1.0; 3],
            color: [0.5, 0.5, 0.5],
            weight: WeightPolicy::Uniform,
            visible: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub name: String,
    /// Name of the ground the group is scattered on.
    pub ground: String,
    pub capacity: usize,
    pub count: usize,
    pub scale: ScalePolicy,
    pub orientation: Orientation,
    /// Box dimensions; the box is lifted to rest on the surface.
    pub size: [f32; 3],
    pub color: [f32; 3],
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            name: "group".to_string(),
            ground: "ground".to_string(),
            capacity: 1000,
            count: 1000,
            scale: ScalePolicy::EVEN,
            orientation: Orientation::AxisAligned,
            size: [1.0, 3.0, 1.0],
            color: [0.267, 0.267, 0.267],
        }
    }
}
