// Trajectory augmentation: scene-coherent random rotation
//
// A sample is de-normalized, every agent's full trajectory is rotated by the
// same angle about the origin, the result is shifted so the minimum x and y
// are zero again, and mean/extent are recomputed before re-normalizing.
//
// The angle is drawn uniformly from {0, step, 2*step, ...} below 360 degrees;
// with the default 15 degree step there are 24 choices. Randomness comes from
// the caller's RNG so a seeded run is reproducible.
//
// A rotated sample with any non-finite value (e.g. all agents collapsed onto
// one line so an extent is zero) is dropped: `apply` returns `Ok(None)`.

use rand::Rng;
use strider_core::Tensor;

use crate::error::Result;
use crate::normalize::{denormalize, normalize};
use crate::sample::Sample;
use crate::scene::coordinate_stats;

/// Rotate a whole sample by a random multiple of `step_degrees`.
#[derive(Debug, Clone)]
pub struct RandomRotation {
    pub step_degrees: u32,
}

impl Default for RandomRotation {
    fn default() -> Self {
        Self { step_degrees: 15 }
    }
}

impl RandomRotation {
    pub fn new(step_degrees: u32) -> Self {
        Self { step_degrees }
    }

    /// Number of distinct angles in [0, 360).
    pub fn num_angles(&self) -> u32 {
        360u32.div_ceil(self.step_degrees.max(1))
    }

    /// Draw an angle in degrees.
    pub fn sample_angle<R: Rng>(&self, rng: &mut R) -> f64 {
        let k = rng.gen_range(0..self.num_angles());
        (k * self.step_degrees.max(1)) as f64
    }

    /// Rotate `sample` by a random angle. `None` means the result was
    /// non-finite and must be discarded.
    pub fn apply<R: Rng>(&self, sample: &Sample, rng: &mut R) -> Result<Option<Sample>> {
        let angle = self.sample_angle(rng);
        rotate(sample, angle)
    }
}

/// Rotate every agent of `sample` by `degrees` and re-normalize.
pub fn rotate(sample: &Sample, degrees: f64) -> Result<Option<Sample>> {
    let physical = denormalize(&sample.sequence, &sample.mask, sample.extent)?;
    let valid = sample.mask.as_slice();
    let (sin, cos) = degrees.to_radians().sin_cos();

    let mut points: Vec<[f64; 2]> = physical
        .as_slice()
        .chunks_exact(2)
        .map(|p| {
            let (x, y) = (p[0] as f64, p[1] as f64);
            [cos * x - sin * y, sin * x + cos * y]
        })
        .collect();

    let valid_points = || {
        points
            .iter()
            .zip(valid)
            .filter(|(_, &v)| v)
            .map(|(p, _)| *p)
    };
    let shift = valid_points().fold([f64::INFINITY, f64::INFINITY], |m, p| {
        [m[0].min(p[0]), m[1].min(p[1])]
    });
    let shifted: Vec<[f64; 2]> = valid_points()
        .map(|p| [p[0] - shift[0], p[1] - shift[1]])
        .collect();
    let (mean, extent) = coordinate_stats(shifted.into_iter());

    for (p, &v) in points.iter_mut().zip(valid) {
        *p = if v {
            [p[0] - shift[0], p[1] - shift[1]]
        } else {
            [0.0, 0.0]
        };
    }
    let data: Vec<f32> = points.iter().flat_map(|p| [p[0] as f32, p[1] as f32]).collect();
    let rotated = Tensor::from_vec(data, sample.sequence.shape().clone())?;
    let sequence = normalize(&rotated, &sample.mask, extent)?;

    let finite = sequence.is_finite()
        && mean.iter().chain(extent.iter()).all(|v| v.is_finite());
    if !finite {
        return Ok(None);
    }

    Ok(Some(Sample {
        sequence,
        mask: sample.mask.clone(),
        num_agents: sample.num_agents,
        agent_ids: sample.agent_ids.clone(),
        mean,
        extent,
        source_name: sample.source_name.clone(),
    }))
}
