use cgmath::Vector3;
use scatter_ngin::{
    BridgeHandle, ParameterBridge, SceneConfig, SceneContext,
    bridge::{BridgeMessage, ObjectValues},
    camera::Camera,
    data_structures::{
        instance_group::{InstanceGroup, ScalePolicy},
        surface::SurfaceMesh,
    },
    error::{InvalidMeshError, PlacementError},
    scene::Ground,
};

mod common;
use common::{flat_square, rng};

fn box_group(name: &str, capacity: usize) -> InstanceGroup {
    InstanceGroup::new(name, SurfaceMesh::cuboid("box", 1.0, 3.0, 1.0), capacity, ScalePolicy::EVEN)
}

#[test]
fn default_scene_populates_every_group() {
    let mut scene = SceneContext::from_config(&SceneConfig::default());
    let failures = scene.populate(&mut rng());
    assert!(failures.is_empty(), "{failures:?}");

    let written = scene.groups().iter().map(|g| g.written()).collect::<Vec<_>>();
    assert_eq!(written, vec![1000, 500, 105_000]);

    let mesh_c = scene.group_by_name("meshC").unwrap();
    for raw in mesh_c.to_raw() {
        let [x, y, z] = raw.translation();
        assert!((-200.0..=200.0).contains(&x), "x = {x}");
        assert!((-1000.0..=0.0).contains(&z), "z = {z}");
        assert!(y.abs() < 1e-3, "y = {y}");
    }
}

#[test]
fn a_failing_group_does_not_stop_the_others() {
    let mut scene = SceneContext::new(Camera::new([0.0, 50.0, 50.0], [0.0; 3], 45.0, 1.0, 2000.0));
    scene.add_ground(Ground::new("flat", flat_square(10.0), Vector3::new(0.0, 0.0, 0.0), [0.5; 3]));
    scene.add_ground(Ground::new(
        "collapsed",
        SurfaceMesh::plane("collapsed", 0.0, 0.0),
        Vector3::new(0.0, 0.0, 0.0),
        [0.5; 3],
    ));
    let on_collapsed = scene.add_group(box_group("a", 10), "collapsed", 10);
    let on_missing = scene.add_group(box_group("b", 10), "nowhere", 10);
    let fine = scene.add_group(box_group("c", 10), "flat", 10);

    let failures = scene.populate(&mut rng());

    assert_eq!(
        failures,
        vec![
            (
                on_collapsed,
                PlacementError::InvalidMesh(InvalidMeshError::Degenerate { triangles: 2 })
            ),
            (on_missing, PlacementError::UnknownGround("nowhere".into())),
        ]
    );
    assert_eq!(scene.group(fine).unwrap().written(), 10);
    assert!(scene.group(on_collapsed).unwrap().is_empty());
}

#[test]
fn applying_the_same_camera_twice_changes_nothing() {
    let mut scene = SceneContext::from_config(&SceneConfig::default());
    let message = BridgeMessage {
        target: "Camera".into(),
        values: ObjectValues::Camera {
            position: [10.0, 50.0, 50.0],
            fov: 45.0,
        },
    };

    assert!(scene.apply(&message));
    assert!(!scene.apply(&message));
    assert_eq!(scene.camera.position, [10.0, 50.0, 50.0].into());
}

#[test]
fn camera_range_endpoints_give_a_finite_projection() {
    let mut scene = SceneContext::from_config(&SceneConfig::default());
    let bridge = BridgeHandle::new(ParameterBridge::for_scene(&scene, 8));
    let poses = [
        r#"{"fov": 0}"#,
        r#"{"fov": 100}"#,
        r#"{"position": {"x": 0, "y": 200, "z": 0}, "fov": 0}"#,
        r#"{"position": {"x": 0, "y": -200, "z": 0}}"#,
        r#"{"position": {"x": -200, "y": -200, "z": -200}}"#,
        r#"{"position": {"x": 200, "y": 200, "z": 200}, "fov": 100}"#,
        r#"{"position": {"x": 0, "y": 0, "z": 0}}"#,
        r#"{"position": {"x": 0, "y": 0, "z": -1000}, "fov": -5}"#,
    ];

    for pose in poses {
        bridge.push_str("Camera", pose).unwrap();
        bridge.deliver(&mut scene);
        let matrix: [[f32; 4]; 4] = scene.camera.build_view_projection_matrix().into();
        assert!(matrix.iter().flatten().all(|v| v.is_finite()), "{pose}: {matrix:?}");
    }
    assert_eq!(scene.camera.position, [0.0, 0.0, -200.0].into());
    assert_eq!(scene.camera.fovy.0, 0.0);
}

#[test]
fn ground_colour_change_is_reported_once() {
    let mut scene = SceneContext::from_config(&SceneConfig::default());
    let message = BridgeMessage {
        target: "Ground2".into(),
        values: ObjectValues::Ground { color: [0.0, 1.0, 0.0] },
    };
    assert!(scene.apply(&message));

    let id = scene.ground_by_bridge_name("Ground2").unwrap().id();
    let ground = scene.ground_mut(id).unwrap();
    assert_eq!(ground.take_color_change(), Some([0.0, 1.0, 0.0]));
    assert_eq!(ground.take_color_change(), None);
}

#[test]
fn unknown_ground_updates_are_ignored() {
    let mut scene = SceneContext::from_config(&SceneConfig::default());
    let message = BridgeMessage {
        target: "Ground9".into(),
        values: ObjectValues::Ground { color: [0.0, 1.0, 0.0] },
    };
    assert!(!scene.apply(&message));
}

#[test]
fn groups_on_hidden_grounds_are_hidden() {
    let scene = SceneContext::from_config(&SceneConfig::default());
    let visible = |name: &str| scene.is_group_visible(scene.group_by_name(name).unwrap().id());

    assert!(!visible("meshA"));
    assert!(!visible("meshB"));
    assert!(visible("meshC"));
}

#[test]
fn bridge_updates_reach_the_scene_once() {
    let mut scene = SceneContext::from_config(&SceneConfig::default());
    let bridge = BridgeHandle::new(ParameterBridge::for_scene(&scene, 8));

    bridge.push_str("Camera", r#"{"position": {"x": 10}}"#).unwrap();
    bridge.push_str("Ground0", r#"{"color": {"r": 0.0}}"#).unwrap();
    assert_eq!(bridge.deliver(&mut scene), 2);
    assert_eq!(bridge.deliver(&mut scene), 0);
    assert_eq!(scene.camera.position, [10.0, 50.0, 50.0].into());

    // an update carrying the current values is delivered but changes nothing
    bridge.push_str("Camera", r#"{"fov": 45}"#).unwrap();
    assert_eq!(bridge.deliver(&mut scene), 0);
}
