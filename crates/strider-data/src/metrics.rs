// Displacement metrics for predicted futures.
//
// Predictions come in the normalized frame of the batch, `[B, N, pred_len, 2]`.
// Both prediction and ground truth are scaled back by each sample's extent
// before Euclidean errors are taken, so the metrics are in scene units.
//
//   ADE: mean error over every valid (agent, step) of a sample
//   FDE: mean error at the final step over the agents valid there
//
// Per-sample values are averaged over the samples that have any valid entry.

use strider_core::{Error, Tensor};

use crate::collate::Batch;
use crate::error::Result;

/// Average and final displacement errors of `pred` against `batch.output`.
///
/// Returns `(ade, fde)`; both are 0 when no agent in the batch is valid.
pub fn displacement_errors(pred: &Tensor<f32>, batch: &Batch) -> Result<(f64, f64)> {
    if pred.shape() != batch.output.shape() {
        return Err(Error::ShapeMismatch {
            expected: batch.output.shape().clone(),
            got: pred.shape().clone(),
        }
        .into());
    }
    let dims = pred.dims();
    let (b, n, steps) = (dims[0], dims[1], dims[2]);
    let pred = pred.as_slice();
    let truth = batch.output.as_slice();
    let mask = batch.op_mask.as_slice();
    let extent = batch.extent.as_slice();

    let (mut ade_sum, mut fde_sum, mut counted) = (0.0, 0.0, 0usize);
    for s in 0..b {
        let agents = (batch.num_agents.as_slice()[s] as usize).min(n);
        let scale = [extent[s * 2] as f64, extent[s * 2 + 1] as f64];
        let error = |a: usize, t: usize| -> f64 {
            let o = ((s * n + a) * steps + t) * 2;
            let dx = (pred[o] as f64 - truth[o] as f64) * scale[0];
            let dy = (pred[o + 1] as f64 - truth[o + 1] as f64) * scale[1];
            dx.hypot(dy)
        };
        let valid = |a: usize, t: usize| mask[(s * n + a) * steps + t];

        let (mut total, mut points) = (0.0, 0usize);
        let (mut last, mut finals) = (0.0, 0usize);
        for a in 0..agents {
            for t in 0..steps {
                if valid(a, t) {
                    total += error(a, t);
                    points += 1;
                }
            }
            if steps > 0 && valid(a, steps - 1) {
                last += error(a, steps - 1);
                finals += 1;
            }
        }
        if points == 0 {
            continue;
        }
        ade_sum += total / points as f64;
        fde_sum += if finals > 0 { last / finals as f64 } else { 0.0 };
        counted += 1;
    }

    if counted == 0 {
        return Ok((0.0, 0.0));
    }
    Ok((ade_sum / counted as f64, fde_sum / counted as f64))
}
