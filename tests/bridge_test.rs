use scatter_ngin::{
    BridgeHandle, ParameterBridge,
    bridge::{Mailbox, ObjectSchema, ObjectValues},
    error::BridgeError,
};
use serde_json::json;

fn bridge(capacity: usize) -> ParameterBridge {
    ParameterBridge::new(
        vec![
            ObjectSchema::camera([0.0, 50.0, 50.0], 45.0),
            ObjectSchema::ground("Ground0", [0.5, 0.5, 0.5]),
            ObjectSchema::ground("Ground1", [1.0, 0.271, 0.0]),
        ],
        capacity,
    )
}

#[test]
fn values_are_clamped_to_their_range() {
    let mut bridge = bridge(4);
    bridge
        .push_json("Camera", &json!({ "position": { "x": -1000.0 }, "fov": 500 }))
        .unwrap();

    let messages = bridge.drain();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0].values,
        ObjectValues::Camera {
            position: [-200.0, 50.0, 50.0],
            fov: 100.0
        }
    );
    assert_eq!(bridge.object("Camera").unwrap().values(), messages[0].values);
}

#[test]
fn updates_to_one_target_coalesce() {
    let mut bridge = bridge(4);
    bridge.push_str("Ground0", r#"{"color": {"r": 0.1}}"#).unwrap();
    bridge.push_str("Camera", r#"{"fov": 30}"#).unwrap();
    bridge.push_str("Ground0", r#"{"color": {"g": 0.2}}"#).unwrap();

    let messages = bridge.drain();
    let targets = messages.iter().map(|m| m.target.as_str()).collect::<Vec<_>>();
    assert_eq!(targets, vec!["Ground0", "Camera"]);
    // the merged message keeps the earlier channel
    assert_eq!(messages[0].values, ObjectValues::Ground { color: [0.1, 0.2, 0.5] });
    assert_eq!(bridge.pending(), 0);
}

#[test]
fn full_mailbox_rejects_new_targets() {
    let mut bridge = bridge(2);
    bridge.push_str("Camera", r#"{"fov": 30}"#).unwrap();
    bridge.push_str("Ground0", r#"{"color": {"r": 0.0}}"#).unwrap();

    let err = bridge.push_str("Ground1", r#"{"color": {"r": 0.0}}"#).unwrap_err();
    assert!(matches!(err, BridgeError::MailboxFull { capacity: 2, .. }), "{err}");
    assert_eq!(
        bridge.object("Ground1").unwrap().values(),
        ObjectValues::Ground { color: [1.0, 0.271, 0.0] }
    );

    // a target already queued still takes updates
    bridge.push_str("Camera", r#"{"fov": 60}"#).unwrap();
    assert_eq!(bridge.pending(), 2);
}

#[test]
fn mailbox_keeps_arrival_order() {
    let mut bridge = bridge(4);
    for object in ["Ground1", "Camera", "Ground0"] {
        let current = bridge.object(object).unwrap().values();
        bridge.push_values(object, &current).unwrap();
    }
    let targets = bridge.drain().into_iter().map(|m| m.target).collect::<Vec<_>>();
    assert_eq!(targets, vec!["Ground1", "Camera", "Ground0"]);
}

#[test]
fn mailbox_capacity_is_at_least_one() {
    assert_eq!(Mailbox::new(0).capacity(), 1);
}

#[test]
fn bad_updates_are_rejected() {
    let mut bridge = bridge(4);

    assert!(matches!(
        bridge.push_str("Ground7", r#"{"color": {"r": 0.0}}"#),
        Err(BridgeError::UnknownObject(name)) if name == "Ground7"
    ));
    assert!(matches!(
        bridge.push_str("Camera", r#"{"zoom": 2}"#),
        Err(BridgeError::UnknownField { prop, .. }) if prop == "zoom"
    ));
    assert!(matches!(
        bridge.push_str("Camera", r#"{"position": {"w": 2}}"#),
        Err(BridgeError::UnknownField { field, .. }) if field == "w"
    ));
    assert!(matches!(
        bridge.push_str("Camera", r#"{"fov": "wide"}"#),
        Err(BridgeError::NotANumber { .. })
    ));
    assert!(matches!(
        bridge.push_str("Camera", r#"{"fov": "#),
        Err(BridgeError::Json(_))
    ));
    assert_eq!(bridge.pending(), 0);
}

#[test]
fn project_state_restores_known_objects() {
    let mut bridge = bridge(8);
    let state = json!({
        "sheetsById": {
            "Animated scene": {
                "staticOverrides": {
                    "byObject": {
                        "Camera": { "position": { "x": 20, "y": 80 } },
                        "Ground1": { "color": { "r": 0.0, "g": 0.0, "b": 1.0 } },
                        "Ground9": { "color": { "r": 0.0 } }
                    }
                }
            }
        }
    });

    assert_eq!(bridge.restore_project_state(&state, "Animated scene"), 2);
    assert_eq!(
        bridge.object("Camera").unwrap().values(),
        ObjectValues::Camera {
            position: [20.0, 80.0, 50.0],
            fov: 45.0
        }
    );
    assert_eq!(bridge.restore_project_state(&state, "Other sheet"), 0);
}

#[test]
fn snapshot_lists_every_object() {
    let handle = BridgeHandle::new(bridge(4));
    handle.push_str("Ground0", r#"{"color": {"b": 1.0}}"#).unwrap();

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.as_object().unwrap().len(), 3);
    assert_eq!(snapshot["Camera"]["fov"], json!(45.0));
    assert_eq!(snapshot["Ground0"]["color"]["b"], json!(1.0));
    assert_eq!(
        handle.values("Ground0"),
        Some(ObjectValues::Ground { color: [0.5, 0.5, 1.0] })
    );
}
