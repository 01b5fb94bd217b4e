use cgmath::{Deg, InnerSpace, Rotation, Vector3};
use rand::{SeedableRng, rngs::StdRng};
use scatter_ngin::{
    data_structures::{
        instance::Instance,
        instance_group::{InstanceGroup, Orientation, ScalePolicy},
        surface::SurfaceMesh,
    },
    error::CapacityExceededError,
    placer::place,
    sampler::{SamplingStructure, WeightPolicy},
};

mod common;
use common::{flat_square, rng};

fn boxes(capacity: usize, scale: ScalePolicy) -> InstanceGroup {
    InstanceGroup::new("boxes", SurfaceMesh::cuboid("box", 1.0, 3.0, 1.0), capacity, scale)
}

#[test]
fn count_equal_to_capacity_fills_every_slot() {
    let ground = flat_square(50.0);
    let structure = SamplingStructure::build(&ground, &WeightPolicy::Uniform).unwrap();
    let mut group = boxes(200, ScalePolicy::EVEN);

    place(&structure, &mut group, 200, &mut rng()).unwrap();

    assert_eq!(group.written(), group.capacity());
    assert!(group.slots().iter().all(|slot| *slot != Instance::new()));
}

#[test]
fn over_capacity_leaves_the_group_untouched() {
    let ground = flat_square(50.0);
    let structure = SamplingStructure::build(&ground, &WeightPolicy::Uniform).unwrap();
    let mut group = boxes(200, ScalePolicy::EVEN);
    let mut rng = rng();
    place(&structure, &mut group, 10, &mut rng).unwrap();
    group.take_dirty();
    let before = group.slots().to_vec();

    let err = place(&structure, &mut group, 201, &mut rng).unwrap_err();

    assert_eq!(
        err,
        CapacityExceededError {
            requested: 201,
            capacity: 200
        }
    );
    assert_eq!(group.slots(), before.as_slice());
    assert_eq!(group.written(), 10);
    assert!(!group.is_dirty());
}

#[test]
fn scales_stay_inside_the_policy_bounds() {
    let ground = flat_square(50.0);
    let structure = SamplingStructure::build(&ground, &WeightPolicy::Uniform).unwrap();
    for policy in [ScalePolicy::SQUAT, ScalePolicy::TALL, ScalePolicy::EVEN] {
        let mut group = boxes(1000, policy);
        place(&structure, &mut group, 1000, &mut rng()).unwrap();
        for instance in group.instances() {
            let s = instance.scale;
            for (value, range) in [(s.x, policy.x), (s.y, policy.y), (s.z, policy.z)] {
                assert!(range.contains(value), "{value} outside {range:?}");
            }
        }
    }
}

#[test]
fn translations_lie_on_the_ground() {
    let ground = flat_square(50.0);
    let structure = SamplingStructure::build(&ground, &WeightPolicy::Uniform).unwrap();
    let mut group = boxes(2000, ScalePolicy::EVEN);
    place(&structure, &mut group, 2000, &mut rng()).unwrap();

    let (lo, hi) = ground.bounds().unwrap();
    for instance in group.instances() {
        let p = instance.position;
        assert!(p.x >= lo.x && p.x <= hi.x && p.z >= lo.z && p.z <= hi.z, "{p:?}");
        assert!(p.y.abs() < 1e-4);
    }
}

#[test]
fn placement_is_uploaded_once() {
    let ground = flat_square(50.0);
    let structure = SamplingStructure::build(&ground, &WeightPolicy::Uniform).unwrap();
    let mut group = boxes(100, ScalePolicy::EVEN);
    place(&structure, &mut group, 64, &mut rng()).unwrap();

    assert_eq!(group.take_dirty().map(|raw| raw.len()), Some(64));
    assert!(group.take_dirty().is_none());
}

#[test]
fn instances_are_axis_aligned_by_default() {
    let mut slope = flat_square(10.0);
    slope.rotate_x(Deg(30.0));
    let structure = SamplingStructure::build(&slope, &WeightPolicy::Uniform).unwrap();
    let mut group = boxes(50, ScalePolicy::EVEN);
    place(&structure, &mut group, 50, &mut rng()).unwrap();

    assert!(group.instances().iter().all(|i| i.rotation == Instance::new().rotation));
}

#[test]
fn align_to_normal_turns_up_onto_the_surface_normal() {
    let mut slope = flat_square(10.0);
    slope.rotate_x(Deg(30.0));
    let normal = slope.vertices()[0].normal;
    let structure = SamplingStructure::build(&slope, &WeightPolicy::Uniform).unwrap();
    let mut group = boxes(50, ScalePolicy::EVEN).with_orientation(Orientation::AlignToNormal);
    place(&structure, &mut group, 50, &mut rng()).unwrap();

    for instance in group.instances() {
        let up = instance.rotation.rotate_vector(Vector3::unit_y());
        assert!((up - normal).magnitude() < 1e-4, "{up:?} vs {normal:?}");
    }
}

#[test]
fn same_seed_same_placement() {
    let ground = flat_square(50.0);
    let structure = SamplingStructure::build(&ground, &WeightPolicy::Uniform).unwrap();
    let mut a = boxes(300, ScalePolicy::TALL);
    let mut b = boxes(300, ScalePolicy::TALL);
    place(&structure, &mut a, 300, &mut StdRng::seed_from_u64(7)).unwrap();
    place(&structure, &mut b, 300, &mut StdRng::seed_from_u64(7)).unwrap();

    assert_eq!(a.instances(), b.instances());
}
