//! # Strider
//!
//! Multi-agent trajectory data pipeline: pedestrian tracks in, padded
//! feature-rich batches out.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use strider::prelude::*;
//!
//! # fn main() -> strider::data::Result<()> {
//! strider::logging::init(1);
//! let splits = DatasetSplits::discover("datasets", "eth")?;
//! let config = DatasetConfig::default().augment(true);
//! let (train, _val, _test) = splits.build(&config)?;
//! let mut loader = DataLoader::new(&train, DataLoaderConfig::default().batch_size(16))?;
//! for batch in loader.iter_batches() {
//!     let batch = batch?;
//!     println!("{} samples, up to {} agents", batch.len(), batch.max_agents());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `strider-core` | Tensor, Shape, DType, shared error type |
//! | `strider-data` | Scenes, windows, normalization, augmentation, features, collation, loaders |

/// Re-export core types.
pub use strider_core::{DType, Error, Result, Shape, Tensor, WithDType};

/// Re-export the data pipeline.
pub mod data {
    pub use strider_data::*;
}

/// Logging: tracing subscriber setup.
pub mod logging;

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::data::{
        collate, displacement_errors, extract, Batch, DataError, DataLoader, DataLoaderConfig,
        Dataset, DatasetConfig, DatasetSplits, FailurePolicy, NormalizationMode, RandomRotation,
        Sample, Scene, TrajectoryDataset, TrajectoryItem, Windower,
    };
    pub use crate::{DType, Shape, Tensor};
}
