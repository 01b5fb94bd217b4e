//! Error taxonomy for scene setup.
//!
//! Setup errors are local: a failing ground or group is logged and skipped,
//! the rest of the scene and the render loop carry on.

use thiserror::Error;

/// A mesh that cannot be turned into a sampling structure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidMeshError {
    #[error("mesh has no triangles")]
    Empty,
    #[error("all {triangles} triangles have zero or negative weighted area")]
    Degenerate { triangles: usize },
    #[error("mesh has no per-vertex attribute named {0:?}")]
    MissingAttribute(String),
    #[error("attribute {name:?} has {len} values for {vertices} vertices")]
    AttributeLength {
        name: String,
        len: usize,
        vertices: usize,
    },
    #[error("index buffer is malformed: {0}")]
    MalformedIndices(String),
}

/// Raised when a placement asks for more instances than the group can hold.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot place {requested} instances into a group with capacity {capacity}")]
pub struct CapacityExceededError {
    pub requested: usize,
    pub capacity: usize,
}

/// Failure of one group's placement pass.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlacementError {
    #[error(transparent)]
    InvalidMesh(#[from] InvalidMeshError),
    #[error(transparent)]
    CapacityExceeded(#[from] CapacityExceededError),
    #[error("group is bound to unknown ground {0:?}")]
    UnknownGround(String),
}

/// An external asset that could not be fetched or decoded.
#[derive(Debug, Error)]
#[error("failed to load {path}")]
pub struct ResourceLoadError {
    pub path: String,
    #[source]
    pub source: anyhow::Error,
}

impl ResourceLoadError {
    pub fn new(path: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Rejected parameter updates.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no parameter object named {0:?}")]
    UnknownObject(String),
    #[error("object {object:?} has no field {prop}.{field}")]
    UnknownField {
        object: String,
        prop: String,
        field: String,
    },
    #[error("{object}.{path} is not a number")]
    NotANumber { object: String, path: String },
    #[error("mailbox is full ({capacity} pending targets), dropped update for {target:?}")]
    MailboxFull { target: String, capacity: usize },
    #[error("malformed parameter payload: {0}")]
    Json(#[from] serde_json::Error),
}
