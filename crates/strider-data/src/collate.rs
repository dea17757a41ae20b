// Batch collation: equal-sized batches from variable agent counts
//
// Every per-agent field is zero-padded along its agent axis to the largest
// agent count in the batch and then stacked:
//
//   input, output           [n, T, 2]  -> [B, N, T, 2]
//   ip_mask, op_mask        [n, T]     -> [B, N, T]      (padding is false)
//   dist/bearing/heading    [n, T, n]  -> [B, N, T, N]   (both agent axes)
//   num_agents, mean, extent           -> [B], [B, 2], [B, 2] (no padding)
//
// Slots at or beyond a sample's `num_agents` are exactly zero. Batch order
// follows input order.

use strider_core::{Tensor, WithDType};

use crate::error::{DataError, Result};

/// Model-ready view of one sample, produced by
/// [`Dataset::get`](crate::dataset::Dataset::get).
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryItem {
    /// `[n, obs_len, 2]` normalized observed positions.
    pub input: Tensor<f32>,
    /// `[n, pred_len, 2]` normalized future positions.
    pub output: Tensor<f32>,
    /// `[n, obs_len, n]` pairwise distances in physical units.
    pub dist_matrix: Tensor<f32>,
    /// `[n, obs_len, n]` bearing from agent i to agent j (radians).
    pub bearing_matrix: Tensor<f32>,
    /// `[n, obs_len, n]` own heading of i minus bearing to j (radians).
    pub heading_matrix: Tensor<f32>,
    /// `[n, obs_len]`
    pub ip_mask: Tensor<bool>,
    /// `[n, pred_len]`
    pub op_mask: Tensor<bool>,
    pub num_agents: usize,
    pub mean: [f64; 2],
    pub extent: [f64; 2],
}

impl TrajectoryItem {
    pub fn obs_len(&self) -> usize {
        self.input.dims()[1]
    }

    pub fn pred_len(&self) -> usize {
        self.output.dims()[1]
    }
}

/// A collated batch. See the module docs for shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub input: Tensor<f32>,
    pub output: Tensor<f32>,
    pub dist_matrix: Tensor<f32>,
    pub bearing_matrix: Tensor<f32>,
    pub heading_matrix: Tensor<f32>,
    pub ip_mask: Tensor<bool>,
    pub op_mask: Tensor<bool>,
    pub num_agents: Tensor<u32>,
    pub mean: Tensor<f32>,
    pub extent: Tensor<f32>,
}

impl Batch {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.num_agents.elem_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Padded agent capacity shared by every sample.
    pub fn max_agents(&self) -> usize {
        self.input.dims()[1]
    }
}

/// Collate items into one padded batch.
///
/// Items must agree on observation and prediction lengths; a disagreement is
/// a pipeline bug and is reported rather than repaired.
pub fn collate(items: &[TrajectoryItem]) -> Result<Batch> {
    let first = items
        .first()
        .ok_or_else(|| DataError::Collate("empty batch".to_string()))?;
    let (obs_len, pred_len) = (first.obs_len(), first.pred_len());
    for (i, item) in items.iter().enumerate() {
        if item.obs_len() != obs_len || item.pred_len() != pred_len {
            return Err(DataError::Collate(format!(
                "item {} has obs/pred lengths {}/{}, expected {}/{}",
                i,
                item.obs_len(),
                item.pred_len(),
                obs_len,
                pred_len
            )));
        }
    }

    let target = items
        .iter()
        .map(|item| item.input.dims()[0])
        .max()
        .unwrap_or(0);

    let per_agent = |field: fn(&TrajectoryItem) -> &Tensor<f32>| -> Result<Tensor<f32>> {
        pad_and_stack(items, field, |dims| {
            let mut d = dims.to_vec();
            d[0] = target;
            d
        })
    };
    let relational = |field: fn(&TrajectoryItem) -> &Tensor<f32>| -> Result<Tensor<f32>> {
        pad_and_stack(items, field, |dims| vec![target, dims[1], target])
    };
    let mask = |field: fn(&TrajectoryItem) -> &Tensor<bool>| -> Result<Tensor<bool>> {
        pad_and_stack(items, field, |dims| vec![target, dims[1]])
    };

    let num_agents: Vec<u32> = items.iter().map(|item| item.num_agents as u32).collect();
    let stats = |f: fn(&TrajectoryItem) -> [f64; 2]| -> Result<Tensor<f32>> {
        let data: Vec<f32> = items
            .iter()
            .flat_map(|item| f(item).map(|v| v as f32))
            .collect();
        Ok(Tensor::from_vec(data, (items.len(), 2))?)
    };

    Ok(Batch {
        input: per_agent(|item| &item.input)?,
        output: per_agent(|item| &item.output)?,
        dist_matrix: relational(|item| &item.dist_matrix)?,
        bearing_matrix: relational(|item| &item.bearing_matrix)?,
        heading_matrix: relational(|item| &item.heading_matrix)?,
        ip_mask: mask(|item| &item.ip_mask)?,
        op_mask: mask(|item| &item.op_mask)?,
        num_agents: Tensor::from_vec(num_agents, items.len())?,
        mean: stats(|item| item.mean)?,
        extent: stats(|item| item.extent)?,
    })
}

fn pad_and_stack<T: WithDType>(
    items: &[TrajectoryItem],
    field: fn(&TrajectoryItem) -> &Tensor<T>,
    target_dims: impl Fn(&[usize]) -> Vec<usize>,
) -> Result<Tensor<T>> {
    tracing::trace!(dtype = %T::DTYPE, items = items.len(), "padding field");
    let padded = items
        .iter()
        .map(|item| {
            let t = field(item);
            t.pad_to(target_dims(t.dims()))
        })
        .collect::<strider_core::Result<Vec<_>>>()?;
    Ok(Tensor::stack(&padded)?)
}
