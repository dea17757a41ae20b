// Dataset: scene files to a cache of samples, samples to model-ready items
//
// Construction runs once per file:
//
//   Scene::load -> Windower -> Normalizer -> (RandomRotation) -> cache
//
// Each file is processed into a local buffer that is appended only when the
// whole file succeeded, so a failing file never leaves partial samples
// behind. Fetching an item (`get`) splits the sample into observation and
// prediction windows and computes relational features on the fly; nothing
// derived is cached between epochs.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strider_core::Tensor;

use crate::augment::RandomRotation;
use crate::collate::TrajectoryItem;
use crate::config::{DatasetConfig, FailurePolicy};
use crate::error::{DataError, Result};
use crate::features::extract;
use crate::normalize::{denormalize, Normalizer};
use crate::sample::Sample;
use crate::scene::Scene;
use crate::window::Windower;

/// An indexed collection of trajectory items.
///
/// Implementations must be `Send + Sync` so the loader can fetch items from
/// several threads.
pub trait Dataset: Send + Sync {
    /// Total number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Model-ready item at `index`.
    fn get(&self, index: usize) -> Result<TrajectoryItem>;

    fn obs_len(&self) -> usize;

    fn pred_len(&self) -> usize;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "trajectories"
    }
}

/// Per-file outcome of dataset construction.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    /// Windows examined.
    pub windows: usize,
    /// Samples added, augmented copies included.
    pub samples: usize,
    /// Augmented copies added.
    pub augmented: usize,
    /// `Some` when the file failed and was skipped.
    pub error: Option<DataError>,
}

/// In-memory dataset of normalized samples built from scene files.
#[derive(Debug)]
pub struct TrajectoryDataset {
    name: String,
    config: DatasetConfig,
    samples: Vec<Sample>,
    reports: Vec<FileReport>,
}

impl TrajectoryDataset {
    /// Build from scene files, seeding augmentation from `config.seed`.
    pub fn from_files<P: AsRef<Path>>(files: &[P], config: DatasetConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::from_files_with_rng(files, config, &mut rng)
    }

    /// Build from scene files with an injected augmentation RNG.
    pub fn from_files_with_rng<P: AsRef<Path>, R: Rng>(
        files: &[P],
        config: DatasetConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let mut dataset = Self::empty(config);

        for path in files {
            let path = path.as_ref();
            let outcome = Scene::load(path, dataset.config.delimiter)
                .and_then(|scene| dataset.process_scene(&scene, rng));
            match outcome {
                Ok((mut samples, report)) => {
                    dataset.samples.append(&mut samples);
                    tracing::info!(
                        file = %path.display(),
                        windows = report.windows,
                        samples = report.samples,
                        total = dataset.samples.len(),
                        "processed scene"
                    );
                    dataset.reports.push(FileReport {
                        path: path.to_path_buf(),
                        ..report
                    });
                }
                Err(e) => match dataset.config.failure_policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Skip => {
                        tracing::warn!(file = %path.display(), error = %e, "skipping scene");
                        dataset.reports.push(FileReport {
                            path: path.to_path_buf(),
                            windows: 0,
                            samples: 0,
                            augmented: 0,
                            error: Some(e),
                        });
                    }
                },
            }
        }
        Ok(dataset)
    }

    /// Build from already-loaded scenes (no file I/O, never fails per scene).
    pub fn from_scenes<R: Rng>(
        scenes: &[Scene],
        config: DatasetConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let mut dataset = Self::empty(config);
        for scene in scenes {
            let (mut samples, report) = dataset.process_scene(scene, rng)?;
            dataset.samples.append(&mut samples);
            dataset.reports.push(FileReport {
                path: PathBuf::from(scene.source_name()),
                ..report
            });
        }
        Ok(dataset)
    }

    fn empty(config: DatasetConfig) -> Self {
        Self {
            name: "trajectories".to_string(),
            config,
            samples: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Rename the dataset (e.g. after its split).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Window, normalize and optionally augment one scene.
    fn process_scene<R: Rng>(
        &self,
        scene: &Scene,
        rng: &mut R,
    ) -> Result<(Vec<Sample>, FileReport)> {
        let config = &self.config;
        let windower = Windower::new(scene, config.obs_len, config.pred_len);
        let normalizer = Normalizer::for_scene(config.normalization, scene);
        let rotation = RandomRotation::default();

        let mut samples = Vec::new();
        let mut augmented = 0;
        for window in &windower {
            let sample = normalizer.normalize(&window, scene.source_name())?;
            if sample.is_empty() {
                tracing::debug!(
                    source = scene.source_name(),
                    window = window.index(),
                    "no complete agent trajectories in window"
                );
                continue;
            }
            if !sample.sequence.is_finite() {
                tracing::debug!(
                    source = scene.source_name(),
                    window = window.index(),
                    extent = ?sample.extent,
                    "non-finite normalized coordinates"
                );
                continue;
            }

            let augment = config.augment && sample.is_augmentable();
            let rotated = if augment {
                rotation.apply(&sample, rng)?
            } else {
                None
            };
            if augment && rotated.is_none() {
                tracing::debug!(
                    source = scene.source_name(),
                    window = window.index(),
                    "discarded non-finite augmentation"
                );
            }

            samples.push(sample);
            if let Some(r) = rotated {
                samples.push(r);
                augmented += 1;
            }
        }

        let windows = windower.num_windows();
        if windows == 0 {
            tracing::info!(
                source = scene.source_name(),
                timestamps = scene.timestamps().len(),
                needed = config.seq_len(),
                "scene too short for a single window"
            );
        }
        let report = FileReport {
            path: PathBuf::from(scene.source_name()),
            windows,
            samples: samples.len(),
            augmented,
            error: None,
        };
        Ok((samples, report))
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Cached samples in construction order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// One report per input file, in input order.
    pub fn reports(&self) -> &[FileReport] {
        &self.reports
    }
}

/// Split a sample into a model-ready item and derive relational features from
/// its de-normalized observation window.
pub fn fetch_item(
    sample: &Sample,
    obs_len: usize,
    pred_len: usize,
    epsilon: f64,
) -> Result<TrajectoryItem> {
    if sample.seq_len() != obs_len + pred_len {
        return Err(DataError::Config(format!(
            "sample has {} timesteps, expected {} + {}",
            sample.seq_len(),
            obs_len,
            pred_len
        )));
    }
    let n = sample.sequence.dims()[0];
    let input = sample.sequence.narrow(1, 0, obs_len)?;
    let output = sample.sequence.narrow(1, obs_len, pred_len)?;
    let ip_mask = sample.mask.narrow(1, 0, obs_len)?;

    // Visibility at the first predicted step, held across the horizon.
    let first_pred = sample.mask.narrow(1, obs_len, 1)?;
    let op_mask = Tensor::from_vec(
        first_pred
            .as_slice()
            .iter()
            .flat_map(|&v| std::iter::repeat(v).take(pred_len))
            .collect(),
        (n, pred_len),
    )?;

    let observed = denormalize(&input, &ip_mask, sample.extent)?;
    let features = extract(&observed, &ip_mask, epsilon)?;

    Ok(TrajectoryItem {
        input,
        output,
        dist_matrix: features.distance,
        bearing_matrix: features.bearing,
        heading_matrix: features.heading,
        ip_mask,
        op_mask,
        num_agents: sample.num_agents,
        mean: sample.mean,
        extent: sample.extent,
    })
}

impl Dataset for TrajectoryDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Result<TrajectoryItem> {
        let sample = self.samples.get(index).ok_or(DataError::IndexOutOfRange {
            index,
            len: self.samples.len(),
        })?;
        fetch_item(
            sample,
            self.config.obs_len,
            self.config.pred_len,
            self.config.epsilon,
        )
    }

    fn obs_len(&self) -> usize {
        self.config.obs_len
    }

    fn pred_len(&self) -> usize {
        self.config.pred_len
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizationMode;
    use crate::scene::RawRecord;

    fn walking_scene(name: &str, steps: usize, agents: i32) -> Scene {
        let mut records = Vec::new();
        for t in 0..steps {
            for a in 0..agents {
                records.push(RawRecord {
                    time: t as f64,
                    agent_id: a,
                    x: t as f64 * 0.5 + a as f64,
                    y: a as f64 * 2.0 + (t as f64 * 0.3).sin(),
                });
            }
        }
        Scene::from_records(name, records).unwrap()
    }

    fn config() -> DatasetConfig {
        DatasetConfig::default().obs_len(3).pred_len(2)
    }

    #[test]
    fn one_sample_per_window() {
        let scene = walking_scene("train/a.txt", 7, 2);
        let mut rng = StdRng::seed_from_u64(0);
        let ds = TrajectoryDataset::from_scenes(&[scene], config(), &mut rng).unwrap();
        assert_eq!(ds.len(), 3);
        assert!(ds.samples().iter().all(|s| s.num_agents == 2));
        assert_eq!(ds.reports()[0].windows, 3);
    }

    #[test]
    fn augmentation_doubles_training_samples_only() {
        let cfg = config().augment(true);
        let mut rng = StdRng::seed_from_u64(0);
        let train = TrajectoryDataset::from_scenes(
            &[walking_scene("train/a.txt", 7, 2)],
            cfg.clone(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(train.len(), 6);
        assert_eq!(train.reports()[0].augmented, 3);

        let test = TrajectoryDataset::from_scenes(
            &[walking_scene("test/a.txt", 7, 2)],
            cfg,
            &mut rng,
        )
        .unwrap();
        assert_eq!(test.len(), 3);
    }

    #[test]
    fn item_shapes_and_masks() {
        let scene = walking_scene("s", 5, 3);
        let mut rng = StdRng::seed_from_u64(0);
        let ds = TrajectoryDataset::from_scenes(
            &[scene],
            config().normalization(NormalizationMode::Scene),
            &mut rng,
        )
        .unwrap();
        let item = ds.get(0).unwrap();
        assert_eq!(item.input.dims(), &[3, 3, 2]);
        assert_eq!(item.output.dims(), &[3, 2, 2]);
        assert_eq!(item.dist_matrix.dims(), &[3, 3, 3]);
        assert_eq!(item.op_mask.dims(), &[3, 2]);
        assert!(item.ip_mask.all(|v| v) && item.op_mask.all(|v| v));
        assert_eq!(item.num_agents, 3);
        assert!(matches!(
            ds.get(1),
            Err(DataError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn distances_are_physical() {
        // Agents 0 and 1 are always exactly (1, 2) apart.
        let scene = walking_scene("s", 5, 2);
        let mut rng = StdRng::seed_from_u64(0);
        let ds = TrajectoryDataset::from_scenes(&[scene], config(), &mut rng).unwrap();
        let item = ds.get(0).unwrap();
        let expected = 5.0f32.sqrt();
        for t in 0..3 {
            assert!((item.dist_matrix.get(&[0, t, 1]).unwrap() - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn zero_extent_windows_are_dropped() {
        // A single agent standing still: zero extent on both axes.
        let records = (0..5)
            .map(|t| RawRecord {
                time: t as f64,
                agent_id: 1,
                x: 3.0,
                y: 3.0,
            })
            .collect();
        let scene = Scene::from_records("still.txt", records).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let ds = TrajectoryDataset::from_scenes(&[scene], config(), &mut rng).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn fetch_rejects_wrong_lengths() {
        let scene = walking_scene("s", 5, 2);
        let mut rng = StdRng::seed_from_u64(0);
        let ds = TrajectoryDataset::from_scenes(&[scene], config(), &mut rng).unwrap();
        assert!(fetch_item(&ds.samples()[0], 4, 2, 0.0).is_err());
    }
}
