//! Scene data: sampling surfaces, instances and their GPU counterparts.
//!
//! - `surface` is the CPU triangle mesh that grounds are sampled from
//! - `instance` holds one placed transform and its raw GPU layout
//! - `instance_group` is a fixed-capacity batch of instances sharing a mesh
//! - `model` contains GPU meshes, materials and the draw helpers
//! - `texture` wraps GPU textures

pub mod instance;
pub mod instance_group;
pub mod model;
pub mod surface;
pub mod texture;
