//! Fixed-capacity instance storage bound to one drawable mesh.
//!
//! An [`InstanceGroup`] carries everything placement needs to know about the
//! group: its capacity, the [`ScalePolicy`] to draw from and the
//! [`Orientation`] policy. The renderer only looks at the written prefix and
//! re-uploads it when the group is dirty.

use cgmath::{InnerSpace, Quaternion, Rotation, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        surface::SurfaceMesh,
    },
    error::CapacityExceededError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Half-open `[min, max)` range for one scale axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f32,
    pub max: f32,
}

impl AxisRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        if self.max > self.min {
            value >= self.min && value < self.max
        } else {
            value == self.min
        }
    }
}

/// Per-axis scale ranges of one group.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalePolicy {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

impl ScalePolicy {
    /// Wide and low: x/z in `[0.2, 1.2)`, y in `[0.2, 0.7)`.
    pub const SQUAT: Self = Self {
        x: AxisRange::new(0.2, 1.2),
        y: AxisRange::new(0.2, 0.7),
        z: AxisRange::new(0.2, 1.2),
    };
    /// Tall towers: x/z in `[0.2, 1.7)`, y in `[0.2, 2.2)`.
    pub const TALL: Self = Self {
        x: AxisRange::new(0.2, 1.7),
        y: AxisRange::new(0.2, 2.2),
        z: AxisRange::new(0.2, 1.7),
    };
    /// All axes in `[0.2, 1.2)`.
    pub const EVEN: Self = Self::uniform(0.2, 1.2);

    pub const fn uniform(min: f32, max: f32) -> Self {
        Self {
            x: AxisRange::new(min, max),
            y: AxisRange::new(min, max),
            z: AxisRange::new(min, max),
        }
    }

    /// Independent draw per axis.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f32> {
        Vector3::new(self.x.draw(rng), self.y.draw(rng), self.z.draw(rng))
    }

    pub fn contains(&self, scale: Vector3<f32>) -> bool {
        self.x.contains(scale.x) && self.y.contains(scale.y) && self.z.contains(scale.z)
    }
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self::EVEN
    }
}

/// Whether instances are turned to follow the sampled surface normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Instances keep the identity rotation.
    #[default]
    AxisAligned,
    /// The instance's +Y axis is turned onto the sampled normal.
    AlignToNormal,
}

impl Orientation {
    pub fn rotation(&self, normal: Vector3<f32>) -> Quaternion<f32> {
        match self {
            Orientation::AxisAligned => Quaternion::new(1.0, 0.0, 0.0, 0.0),
            Orientation::AlignToNormal if normal.magnitude2() > f32::EPSILON => {
                Quaternion::between_vectors(Vector3::unit_y(), normal.normalize())
            }
            Orientation::AlignToNormal => Quaternion::new(1.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Ordered, fixed-capacity array of instance transforms for one mesh and material.
#[derive(Clone, Debug)]
pub struct InstanceGroup {
    pub(crate) id: GroupId,
    pub name: String,
    /// Geometry drawn once per instance, in instance-local space.
    pub mesh: SurfaceMesh,
    pub color: [f32; 3],
    origin: Instance,
    slots: Vec<Instance>,
    written: usize,
    scale_policy: ScalePolicy,
    orientation: Orientation,
    dirty: bool,
}

impl InstanceGroup {
    pub fn new(
        name: impl Into<String>,
        mesh: SurfaceMesh,
        capacity: usize,
        scale_policy: ScalePolicy,
    ) -> Self {
        Self {
            id: GroupId(0),
            name: name.into(),
            mesh,
            color: [1.0, 1.0, 1.0],
            origin: Instance::new(),
            slots: vec![Instance::new(); capacity],
            written: 0,
            scale_policy,
            orientation: Orientation::default(),
            dirty: false,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    /// Places the whole group in the world; instance transforms stay local to it.
    pub fn with_origin(mut self, origin: Instance) -> Self {
        self.origin = origin;
        self
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots filled by the last placement.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// The written prefix, in placement order.
    pub fn instances(&self) -> &[Instance] {
        &self.slots[..self.written]
    }

    /// Every slot including those never written.
    pub fn slots(&self) -> &[Instance] {
        &self.slots
    }

    pub fn scale_policy(&self) -> &ScalePolicy {
        &self.scale_policy
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn origin(&self) -> &Instance {
        &self.origin
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces the leading slots with `staged` as one step.
    pub(crate) fn commit(&mut self, staged: Vec<Instance>) -> Result<(), CapacityExceededError> {
        if staged.len() > self.capacity() {
            return Err(CapacityExceededError {
                requested: staged.len(),
                capacity: self.capacity(),
            });
        }
        self.written = staged.len();
        self.slots[..self.written].copy_from_slice(&staged);
        self.dirty = true;
        Ok(())
    }

    /// World-space raw data of the written prefix.
    pub fn to_raw(&self) -> Vec<InstanceRaw> {
        self.instances()
            .iter()
            .map(|instance| (&self.origin * instance).to_raw())
            .collect()
    }

    /// Raw data to upload if the group changed since the last call.
    pub fn take_dirty(&mut self) -> Option<Vec<InstanceRaw>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.to_raw())
    }
}
