use scatter_ngin::{
    SceneConfig,
    config::GroundShape,
    data_structures::instance_group::{Orientation, ScalePolicy},
    sampler::WeightPolicy,
};
use serde_json::json;

#[test]
fn default_is_the_meadow_scene() {
    let config = SceneConfig::default();

    let grounds = config.grounds.iter().map(|g| (g.name.as_str(), g.visible)).collect::<Vec<_>>();
    assert_eq!(grounds, vec![("groundA", false), ("groundB", false), ("groundC", true)]);
    assert_eq!(config.grounds[2].scale, [8.0, 1.0, 20.0]);
    assert_eq!(config.grounds[2].origin, [0.0, 0.0, -500.0]);
    assert!(config.grounds.iter().all(|g| g.weight == WeightPolicy::Attribute("uv".into())));

    let groups = config
        .groups
        .iter()
        .map(|g| (g.name.as_str(), g.ground.as_str(), g.count, g.scale))
        .collect::<Vec<_>>();
    assert_eq!(
        groups,
        vec![
            ("meshA", "groundA", 1000, ScalePolicy::SQUAT),
            ("meshB", "groundB", 500, ScalePolicy::TALL),
            ("meshC", "groundC", 105_000, ScalePolicy::EVEN),
        ]
    );
    assert!(config.groups.iter().all(|g| g.capacity == 105_000));
    assert_eq!(config.lights.len(), 2);
    assert_eq!(config.camera.position, [0.0, 50.0, 50.0]);
    assert_eq!(config.camera.fov, 45.0);
}

#[test]
fn partial_config_fills_in_defaults() {
    let config = SceneConfig::from_json(
        r#"{
            "seed": 3,
            "grounds": [{ "name": "hill", "shape": { "kind": "asset", "file": "hill.glb" } }],
            "groups": [{ "name": "rocks", "ground": "hill", "count": 10, "orientation": "align_to_normal" }]
        }"#,
    )
    .unwrap();

    assert_eq!(config.seed, Some(3));
    assert_eq!(config.camera, SceneConfig::default().camera);
    assert_eq!(config.grounds[0].shape, GroundShape::Asset { file: "hill.glb".into() });
    assert_eq!(config.grounds[0].weight, WeightPolicy::Uniform);
    assert_eq!(config.groups[0].capacity, 1000);
    assert_eq!(config.groups[0].orientation, Orientation::AlignToNormal);
}

#[test]
fn malformed_config_is_an_error() {
    assert!(SceneConfig::from_json(r#"{"grounds": 3}"#).is_err());
}

#[test]
fn default_survives_serialization() {
    let config = SceneConfig::default();
    let text = serde_json::to_string(&config).unwrap();
    assert_eq!(SceneConfig::from_json(&text).unwrap(), config);
}

#[test]
fn shipped_scene_matches_the_default() {
    let shipped = SceneConfig::from_json(include_str!("../assets/scene.json")).unwrap();
    let default = SceneConfig::default();

    assert_eq!(shipped.grounds, default.grounds);
    assert_eq!(shipped.groups, default.groups);
    assert_eq!(shipped.seed, Some(42));
    assert_eq!(shipped.project_state.as_deref(), Some("state.json"));
}

#[test]
fn weight_policy_json_shape() {
    assert_eq!(serde_json::to_value(WeightPolicy::Uniform).unwrap(), json!("uniform"));
    assert_eq!(
        serde_json::to_value(WeightPolicy::Attribute("uv".into())).unwrap(),
        json!({ "attribute": "uv" })
    );
}
