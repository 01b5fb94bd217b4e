//! Writes sampled transforms into an [`InstanceGroup`].

use instant::Instant;
use rand::Rng;

use crate::{
    data_structures::{instance::Instance, instance_group::InstanceGroup},
    error::CapacityExceededError,
    sampler::SamplingStructure,
};

/// Draws `count` samples from `structure` and writes one transform per sample
/// into the first `count` slots of `group`.
///
/// Scale comes from the group's [`ScalePolicy`](crate::data_structures::instance_group::ScalePolicy),
/// rotation from its [`Orientation`](crate::data_structures::instance_group::Orientation).
/// Asking for more than the group's capacity fails before anything is written.
pub fn place<R: Rng + ?Sized>(
    structure: &SamplingStructure<'_>,
    group: &mut InstanceGroup,
    count: usize,
    rng: &mut R,
) -> Result<(), CapacityExceededError> {
    if count > group.capacity() {
        return Err(CapacityExceededError {
            requested: count,
            capacity: group.capacity(),
        });
    }
    log::info!(
        "Sampling {} points from {} ({} vertices) into {}",
        count,
        structure.mesh().name,
        structure.mesh().vertices().len(),
        group.name
    );
    let started = Instant::now();

    let scale_policy = *group.scale_policy();
    let orientation = group.orientation();
    let staged = (0..count)
        .map(|_| {
            let sample = structure.sample(rng);
            Instance {
                position: sample.position,
                rotation: orientation.rotation(sample.normal),
                scale: scale_policy.draw(rng),
            }
        })
        .collect::<Vec<_>>();
    group.commit(staged)?;

    log::info!("{}: .sample() took {:?}", group.name, started.elapsed());
    Ok(())
}
