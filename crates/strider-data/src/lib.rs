//! # strider-data
//!
//! Trajectory data pipeline for multi-agent forecasting.
//!
//! This crate provides:
//! - [`Scene`]: one recording, parsed and shifted to a non-negative frame
//! - [`Windower`]: fixed-length windows and the agents complete in each
//! - [`Normalizer`]: per-scene or per-window scaling into [`Sample`]s
//! - [`RandomRotation`]: scene-coherent rotation augmentation
//! - [`extract`]: pairwise distance, bearing and heading matrices
//! - [`collate`]: zero-padded [`Batch`]es from variable agent counts
//! - [`Dataset`] / [`TrajectoryDataset`]: cached samples, items on demand
//! - [`DataLoader`]: batching, shuffling, parallel item fetching
//!   - Train/val/test split discovery
//!   - ADE/FDE displacement metrics

pub mod augment;
pub mod collate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod sample;
pub mod scene;
pub mod splits;
pub mod window;

pub use augment::{rotate, RandomRotation};
pub use collate::{collate, Batch, TrajectoryItem};
pub use config::{DatasetConfig, FailurePolicy, NormalizationMode};
pub use dataset::{fetch_item, Dataset, FileReport, TrajectoryDataset};
pub use error::{DataError, Result};
pub use features::{extract, is_non_linear, wrap_angle, RelationalFeatures};
pub use loader::{BatchIterator, DataLoader, DataLoaderConfig};
pub use metrics::displacement_errors;
pub use normalize::{denormalize, normalize, Normalizer};
pub use sample::Sample;
pub use scene::{RawRecord, Scene};
pub use splits::DatasetSplits;
pub use window::{AgentTrack, Window, WindowIter, Windower};
