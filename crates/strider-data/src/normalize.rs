// Normalizer: window → Sample
//
// Coordinates arrive in the scene's shifted frame (minimum x and y of the
// scene are zero). Two strategies turn them into a bounded range:
//
//   Scene:  x' = x / scene_extent_x, y' = y / scene_extent_y.
//           The sample stores the scene mean and extent.
//   Window: the window's records (all of them, not only the kept agents) are
//           re-shifted so their minimum is zero, mean and extent are taken
//           from that re-shifted set, and x' = x / extent_x.
//
// Either way the inverse is `x = x' * extent_x` in the frame the sample was
// normalized in; the scene shift (and for Window mode the window shift) is a
// one-way translation that downstream geometry never needs.

use strider_core::Tensor;

use crate::config::NormalizationMode;
use crate::error::Result;
use crate::sample::Sample;
use crate::scene::{coordinate_stats, Scene};
use crate::window::Window;

/// Normalizes the windows of one scene.
#[derive(Debug, Clone)]
pub enum Normalizer {
    Scene { mean: [f64; 2], extent: [f64; 2] },
    Window,
}

impl Normalizer {
    /// Resolve a mode against the scene it will be applied to.
    pub fn for_scene(mode: NormalizationMode, scene: &Scene) -> Self {
        match mode {
            NormalizationMode::Scene => Normalizer::Scene {
                mean: scene.mean(),
                extent: scene.extent(),
            },
            NormalizationMode::Window => Normalizer::Window,
        }
    }

    /// Pack a window's complete agent tracks into a sample.
    ///
    /// A window with no complete track produces a zero-filled sample with
    /// `num_agents == 0` and one placeholder slot per observation-phase
    /// candidate; callers must reject it.
    pub fn normalize(&self, window: &Window<'_>, source_name: &str) -> Result<Sample> {
        let seq_len = window.timestamps().len();

        let (shift, mean, extent) = match self {
            Normalizer::Scene { mean, extent } => ([0.0, 0.0], *mean, *extent),
            Normalizer::Window => {
                let shift = window
                    .records()
                    .iter()
                    .fold([f64::INFINITY, f64::INFINITY], |m, r| {
                        [m[0].min(r.x), m[1].min(r.y)]
                    });
                let (mean, extent) = coordinate_stats(
                    window
                        .records()
                        .iter()
                        .map(|r| [r.x - shift[0], r.y - shift[1]]),
                );
                (shift, mean, extent)
            }
        };

        let tracks = window.complete_tracks();
        if tracks.is_empty() {
            let placeholders = window.candidate_agents().len();
            return Ok(Sample {
                sequence: Tensor::zeros((placeholders, seq_len, 2)),
                mask: Tensor::zeros((placeholders, seq_len)),
                num_agents: 0,
                agent_ids: Vec::new(),
                mean,
                extent,
                source_name: source_name.to_string(),
            });
        }

        let num_agents = tracks.len();
        let mut data = Vec::with_capacity(num_agents * seq_len * 2);
        for track in &tracks {
            for p in &track.points {
                data.push(((p[0] - shift[0]) / extent[0]) as f32);
                data.push(((p[1] - shift[1]) / extent[1]) as f32);
            }
        }

        Ok(Sample {
            sequence: Tensor::from_vec(data, (num_agents, seq_len, 2))?,
            mask: Tensor::full((num_agents, seq_len), true),
            num_agents,
            agent_ids: tracks.iter().map(|t| t.agent_id).collect(),
            mean,
            extent,
            source_name: source_name.to_string(),
        })
    }
}

/// Map normalized `[agents, T, 2]` coordinates back to the frame they were
/// normalized in. Masked-out entries stay zero.
pub fn denormalize(
    sequence: &Tensor<f32>,
    mask: &Tensor<bool>,
    extent: [f64; 2],
) -> Result<Tensor<f32>> {
    scale_masked(sequence, mask, |v, axis| v * extent[axis])
}

/// Inverse of [`denormalize`].
pub fn normalize(
    sequence: &Tensor<f32>,
    mask: &Tensor<bool>,
    extent: [f64; 2],
) -> Result<Tensor<f32>> {
    scale_masked(sequence, mask, |v, axis| v / extent[axis])
}

fn scale_masked(
    sequence: &Tensor<f32>,
    mask: &Tensor<bool>,
    f: impl Fn(f64, usize) -> f64,
) -> Result<Tensor<f32>> {
    let dims = sequence.dims();
    if dims.len() != 3 || dims[2] != 2 || mask.dims() != &dims[..2] {
        return Err(strider_core::Error::ShapeMismatch {
            expected: sequence.shape().clone(),
            got: mask.shape().clone(),
        }
        .into());
    }
    let valid = mask.as_slice();
    let mut out = Tensor::zeros(sequence.shape().clone());
    for (i, (o, &v)) in out
        .as_mut_slice()
        .iter_mut()
        .zip(sequence.as_slice())
        .enumerate()
    {
        if valid[i / 2] {
            *o = f(v as f64, i % 2) as f32;
        }
    }
    Ok(out)
}
