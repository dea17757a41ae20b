// Sample: the unit of training data cached by a dataset

use strider_core::Tensor;

/// One window's agents packed into fixed-shape tensors.
///
/// `sequence` is always in normalized space; see
/// [`denormalize`](crate::normalize::denormalize) for the inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// `[num_agents, obs_len + pred_len, 2]` normalized (x, y).
    pub sequence: Tensor<f32>,
    /// `[num_agents, obs_len + pred_len]`; all true for retained samples.
    pub mask: Tensor<bool>,
    pub num_agents: usize,
    /// Ids of the agents in slot order.
    pub agent_ids: Vec<i32>,
    pub mean: [f64; 2],
    pub extent: [f64; 2],
    pub source_name: String,
}

impl Sample {
    /// Timesteps per agent.
    pub fn seq_len(&self) -> usize {
        self.sequence.dims()[1]
    }

    /// Zero-agent samples never enter a dataset.
    pub fn is_empty(&self) -> bool {
        self.num_agents == 0
    }

    /// Whether this sample may receive a rotated copy: files from the test
    /// or validation partitions are never augmented.
    pub fn is_augmentable(&self) -> bool {
        is_augmentable_source(&self.source_name)
    }
}

pub(crate) fn is_augmentable_source(source_name: &str) -> bool {
    !source_name.contains("test") && !source_name.contains("val")
}
