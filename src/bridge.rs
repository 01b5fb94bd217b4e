//! Parameter bridge between an external editor and the scene.
//!
//! The editor sees a fixed schema of named objects, each with number or
//! compound-of-number properties bounded by a range. Updates arrive as JSON
//! (`{"position": {"x": 10, ...}, "fov": 45}`), are clamped to the declared
//! ranges, converted to a typed [`BridgeMessage`] and queued in a bounded
//! [`Mailbox`]. The flow drains the mailbox once per frame and hands the
//! messages to [`SceneContext::apply`].

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use serde_json::{Map, Value};

use crate::{error::BridgeError, scene::SceneContext};

pub const CAMERA_OBJECT: &str = "Camera";

/// Full value set of one object after an update.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectValues {
    Camera { position: [f32; 3], fov: f32 },
    Ground { color: [f32; 3] },
}

impl ObjectValues {
    /// The editor-side JSON shape of these values.
    pub fn to_json(&self) -> Value {
        match self {
            ObjectValues::Camera { position, fov } => serde_json::json!({
                "position": { "x": position[0], "y": position[1], "z": position[2] },
                "fov": fov,
            }),
            ObjectValues::Ground { color } => serde_json::json!({
                "color": { "r": color[0], "g": color[1], "b": color[2] },
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BridgeMessage {
    pub target: String,
    pub values: ObjectValues,
}

/// A ranged number. `value` holds the last accepted value.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberField {
    pub name: String,
    pub value: f64,
    pub range: [f64; 2],
}

impl NumberField {
    pub fn new(name: &str, value: f64, range: [f64; 2]) -> Self {
        let mut field = Self {
            name: name.to_string(),
            value,
            range,
        };
        field.value = field.clamp(value);
        field
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.range[0], self.range[1])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropSchema {
    Number(NumberField),
    Compound { name: String, fields: Vec<NumberField> },
}

impl PropSchema {
    pub fn name(&self) -> &str {
        match self {
            PropSchema::Number(field) => &field.name,
            PropSchema::Compound { name, .. } => name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ObjectKind {
    Camera,
    Ground,
}

/// One editable object as the editor sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSchema {
    pub name: String,
    kind: ObjectKind,
    pub props: Vec<PropSchema>,
}

impl ObjectSchema {
    pub fn camera(position: [f32; 3], fov: f32) -> Self {
        let axis = |name, v: f32| NumberField::new(name, v as f64, [-200.0, 200.0]);
        Self {
            name: CAMERA_OBJECT.to_string(),
            kind: ObjectKind::Camera,
            props: vec![
                PropSchema::Compound {
                    name: "position".to_string(),
                    fields: vec![
                        axis("x", position[0]),
                        axis("y", position[1]),
                        axis("z", position[2]),
                    ],
                },
                PropSchema::Number(NumberField::new("fov", fov as f64, [0.0, 100.0])),
            ],
        }
    }

    pub fn ground(name: &str, color: [f32; 3]) -> Self {
        let channel = |name, v: f32| NumberField::new(name, v as f64, [0.0, 1.0]);
        Self {
            name: name.to_string(),
            kind: ObjectKind::Ground,
            props: vec![PropSchema::Compound {
                name: "color".to_string(),
                fields: vec![
                    channel("r", color[0]),
                    channel("g", color[1]),
                    channel("b", color[2]),
                ],
            }],
        }
    }

    fn field(&self, prop: &str, field: &str) -> f64 {
        self.props
            .iter()
            .find_map(|p| match p {
                PropSchema::Number(f) if f.name == prop => Some(f.value),
                PropSchema::Compound { name, fields } if name == prop => {
                    fields.iter().find(|f| f.name == field).map(|f| f.value)
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Current values of every property.
    pub fn values(&self) -> ObjectValues {
        match self.kind {
            ObjectKind::Camera => ObjectValues::Camera {
                position: [
                    self.field("position", "x") as f32,
                    self.field("position", "y") as f32,
                    self.field("position", "z") as f32,
                ],
                fov: self.field("fov", "fov") as f32,
            },
            ObjectKind::Ground => ObjectValues::Ground {
                color: [
                    self.field("color", "r") as f32,
                    self.field("color", "g") as f32,
                    self.field("color", "b") as f32,
                ],
            },
        }
    }

    /// Merges `update` into the current values. Fields left out keep their
    /// value; nothing changes if any part of `update` is rejected.
    pub fn merge(&mut self, update: &Map<String, Value>) -> Result<ObjectValues, BridgeError> {
        let mut props = self.props.clone();
        for (key, value) in update {
            let prop = props
                .iter_mut()
                .find(|p| p.name() == key)
                .ok_or_else(|| self.unknown(key, ""))?;
            match prop {
                PropSchema::Number(field) => {
                    let v = value.as_f64().ok_or_else(|| self.not_a_number(key))?;
                    field.value = field.clamp(v);
                }
                PropSchema::Compound { fields, .. } => {
                    let inner = value.as_object().ok_or_else(|| self.not_a_number(key))?;
                    for (field_name, v) in inner {
                        let field = fields
                            .iter_mut()
                            .find(|f| &f.name == field_name)
                            .ok_or_else(|| self.unknown(key, field_name))?;
                        let v = v
                            .as_f64()
                            .ok_or_else(|| self.not_a_number(&format!("{key}.{field_name}")))?;
                        field.value = field.clamp(v);
                    }
                }
            }
        }
        self.props = props;
        Ok(self.values())
    }

    fn unknown(&self, prop: &str, field: &str) -> BridgeError {
        BridgeError::UnknownField {
            object: self.name.clone(),
            prop: prop.to_string(),
            field: field.to_string(),
        }
    }

    fn not_a_number(&self, path: &str) -> BridgeError {
        BridgeError::NotANumber {
            object: self.name.clone(),
            path: path.to_string(),
        }
    }
}

/// Bounded queue of pending updates, at most one per target.
#[derive(Debug)]
pub struct Mailbox {
    capacity: usize,
    pending: VecDeque<BridgeMessage>,
}

impl Mailbox {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            pending: VecDeque::with_capacity(capacity),
        }
    }

    /// Queues `message`. A pending message for the same target is replaced in
    /// place since every message carries the full value set.
    pub fn push(&mut self, message: BridgeMessage) -> Result<(), BridgeError> {
        if let Some(slot) = self.pending.iter_mut().find(|m| m.target == message.target) {
            *slot = message;
            return Ok(());
        }
        if self.pending.len() >= self.capacity {
            return Err(BridgeError::MailboxFull {
                target: message.target,
                capacity: self.capacity,
            });
        }
        self.pending.push_back(message);
        Ok(())
    }

    /// Pending messages in arrival order.
    pub fn drain(&mut self) -> Vec<BridgeMessage> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The schema plus the mailbox its updates go to.
#[derive(Debug)]
pub struct ParameterBridge {
    objects: Vec<ObjectSchema>,
    mailbox: Mailbox,
}

impl ParameterBridge {
    pub fn new(objects: Vec<ObjectSchema>, mailbox_capacity: usize) -> Self {
        Self {
            objects,
            mailbox: Mailbox::new(mailbox_capacity),
        }
    }

    /// Declares the camera and one object per ground, seeded with current values.
    pub fn for_scene(scene: &SceneContext, mailbox_capacity: usize) -> Self {
        let camera = &scene.camera;
        let mut objects = vec![ObjectSchema::camera(camera.position.into(), camera.fovy.0)];
        objects.extend(
            scene
                .grounds()
                .iter()
                .map(|g| ObjectSchema::ground(&g.bridge_name, g.color())),
        );
        Self::new(objects, mailbox_capacity)
    }

    pub fn objects(&self) -> &[ObjectSchema] {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&ObjectSchema> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Clamps and queues an update given in the editor's JSON shape.
    ///
    /// The object's values only change if the update is queued.
    pub fn push_json(&mut self, object: &str, values: &Value) -> Result<(), BridgeError> {
        let index = self
            .objects
            .iter()
            .position(|o| o.name == object)
            .ok_or_else(|| BridgeError::UnknownObject(object.to_string()))?;
        let update = values.as_object().ok_or_else(|| BridgeError::NotANumber {
            object: object.to_string(),
            path: String::new(),
        })?;
        let mut staged = self.objects[index].clone();
        let values = staged.merge(update)?;
        self.mailbox.push(BridgeMessage {
            target: object.to_string(),
            values,
        })?;
        self.objects[index] = staged;
        Ok(())
    }

    pub fn push_str(&mut self, object: &str, json: &str) -> Result<(), BridgeError> {
        let values: Value = serde_json::from_str(json)?;
        self.push_json(object, &values)
    }

    pub fn push_values(&mut self, object: &str, values: &ObjectValues) -> Result<(), BridgeError> {
        self.push_json(object, &values.to_json())
    }

    pub fn drain(&mut self) -> Vec<BridgeMessage> {
        self.mailbox.drain()
    }

    pub fn pending(&self) -> usize {
        self.mailbox.len()
    }

    /// Queues the static overrides stored in an editor project state.
    ///
    /// Reads `sheetsById.<sheet>.staticOverrides.byObject`; objects missing
    /// from the schema are skipped. Returns the number of queued updates.
    pub fn restore_project_state(&mut self, state: &Value, sheet: &str) -> usize {
        let Some(by_object) = state
            .pointer(&format!("/sheetsById/{}/staticOverrides/byObject", escape_pointer(sheet)))
            .and_then(Value::as_object)
        else {
            log::warn!("Project state has no overrides for sheet {:?}", sheet);
            return 0;
        };
        let mut restored = 0;
        for (object, values) in by_object {
            match self.push_json(object, values) {
                Ok(()) => restored += 1,
                Err(e) => log::warn!("Skipping stored values of {}: {}", object, e),
            }
        }
        restored
    }
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Shared handle to a [`ParameterBridge`] for producers on the render thread.
#[derive(Clone, Debug)]
pub struct BridgeHandle(Rc<RefCell<ParameterBridge>>);

impl BridgeHandle {
    pub fn new(bridge: ParameterBridge) -> Self {
        Self(Rc::new(RefCell::new(bridge)))
    }

    pub fn push_json(&self, object: &str, values: &Value) -> Result<(), BridgeError> {
        self.0.borrow_mut().push_json(object, values)
    }

    pub fn push_str(&self, object: &str, json: &str) -> Result<(), BridgeError> {
        self.0.borrow_mut().push_str(object, json)
    }

    pub fn push_values(&self, object: &str, values: &ObjectValues) -> Result<(), BridgeError> {
        self.0.borrow_mut().push_values(object, values)
    }

    pub fn restore_project_state(&self, state: &Value, sheet: &str) -> usize {
        self.0.borrow_mut().restore_project_state(state, sheet)
    }

    /// Current values of `object`.
    pub fn values(&self, object: &str) -> Option<ObjectValues> {
        self.0.borrow().object(object).map(ObjectSchema::values)
    }

    /// `{object: values}` for every object, the shape an editor builds its sheet from.
    pub fn snapshot(&self) -> Value {
        let bridge = self.0.borrow();
        Value::Object(
            bridge
                .objects()
                .iter()
                .map(|o| (o.name.clone(), o.values().to_json()))
                .collect(),
        )
    }

    /// Applies every pending message to `scene`. Returns how many changed it.
    pub fn deliver(&self, scene: &mut SceneContext) -> usize {
        let messages = self.0.borrow_mut().drain();
        messages.iter().filter(|m| scene.apply(m)).count()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rejected_updates_leave_values_untouched() {
        let mut schema = ObjectSchema::ground("Ground0", [0.5, 0.5, 0.5]);
        let update = json!({ "color": { "r": 0.1, "a": 1.0 } });
        assert!(schema.merge(update.as_object().unwrap()).is_err());
        assert_eq!(schema.values(), ObjectValues::Ground { color: [0.5, 0.5, 0.5] });
    }

    #[test]
    fn fov_is_a_plain_number() {
        let mut schema = ObjectSchema::camera([0.0, 50.0, 50.0], 45.0);
        let values = schema.merge(json!({ "fov": 60 }).as_object().unwrap()).unwrap();
        assert_eq!(
            values,
            ObjectValues::Camera {
                position: [0.0, 50.0, 50.0],
                fov: 60.0
            }
        );
    }
}
