//! scatter-ngin
//!
//! Scatters large numbers of instanced boxes over triangle-mesh grounds,
//! with placement density driven by triangle area and an optional per-vertex
//! weight, and renders the result with wgpu natively or on WebGL2. A small
//! parameter bridge lets an external editor move the camera and recolour the
//! grounds while the scene runs.
//!
//! High-level modules
//! - `sampler`: area-weighted random points on a triangle mesh
//! - `placer`: fills an instance group from a sampler in one all-or-nothing step
//! - `scene`: grounds, groups, lights and camera in one owned context
//! - `bridge`: ranged parameter schema, bounded mailbox and project-state restore
//! - `config`: serde scene description with the default meadow scene
//! - `camera`: look-at perspective camera and its uniform
//! - `context`: GPU device, surface and the scene pipeline
//! - `render`: GPU mirror of the scene and the draw calls
//! - `resources`: loaders for config, glTF grounds and textures
//! - `flow`: the winit event loop tying it all together
//!

pub mod bridge;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod placer;
pub mod render;
pub mod resources;
pub mod sampler;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use bridge::{BridgeHandle, ParameterBridge};
pub use config::SceneConfig;
pub use flow::{ConfigSource, run};
pub use scene::SceneContext;
