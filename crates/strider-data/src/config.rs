// DatasetConfig: how scene files become samples
//
// Builder-style setters mirror DataLoaderConfig. The struct is also serde
// (de)serializable so a run can be described by a JSON file:
//
//   { "obs_len": 8, "pred_len": 12, "normalization": "scene", "augment": true }
//
// Missing fields fall back to `Default`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Which statistics a window is normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Divide by the scene-wide extent computed once by the loader; the
    /// sample carries the scene mean and extent.
    Scene,
    /// Re-shift the window to a zero minimum and derive mean and extent from
    /// the window's own records.
    #[default]
    Window,
}

impl NormalizationMode {
    /// Scene-conditioned model variants (any name containing "scene")
    /// normalize against scene statistics; everything else is window-local.
    pub fn for_model_type(model_type: &str) -> Self {
        if model_type.contains("scene") {
            NormalizationMode::Scene
        } else {
            NormalizationMode::Window
        }
    }
}

/// What happens to the rest of a dataset when one scene file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop and return the first error.
    #[default]
    Abort,
    /// Log the failure and continue with the remaining files.
    Skip,
}

/// Configuration for building a [`TrajectoryDataset`](crate::TrajectoryDataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Observed timesteps per window.
    pub obs_len: usize,
    /// Predicted timesteps per window.
    pub pred_len: usize,
    /// Field delimiter of scene files.
    pub delimiter: char,
    pub normalization: NormalizationMode,
    /// Add one randomly rotated copy of every eligible training sample.
    pub augment: bool,
    /// Seed for the augmentation RNG when none is injected.
    pub seed: u64,
    pub failure_policy: FailurePolicy,
    /// Guard for coincident agents in bearing/heading computation.
    pub epsilon: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            obs_len: 8,
            pred_len: 12,
            delimiter: '\t',
            normalization: NormalizationMode::Window,
            augment: false,
            seed: 10,
            failure_policy: FailurePolicy::Abort,
            epsilon: 0.0,
        }
    }
}

impl DatasetConfig {
    pub fn obs_len(mut self, n: usize) -> Self {
        self.obs_len = n;
        self
    }

    pub fn pred_len(mut self, n: usize) -> Self {
        self.pred_len = n;
        self
    }

    pub fn delimiter(mut self, d: char) -> Self {
        self.delimiter = d;
        self
    }

    pub fn normalization(mut self, mode: NormalizationMode) -> Self {
        self.normalization = mode;
        self
    }

    pub fn augment(mut self, a: bool) -> Self {
        self.augment = a;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = s;
        self
    }

    pub fn failure_policy(mut self, p: FailurePolicy) -> Self {
        self.failure_policy = p;
        self
    }

    pub fn epsilon(mut self, eps: f64) -> Self {
        self.epsilon = eps;
        self
    }

    /// Timesteps covered by one window.
    pub fn seq_len(&self) -> usize {
        self.obs_len + self.pred_len
    }

    /// Check the window lengths are usable.
    pub fn validate(&self) -> Result<()> {
        if self.obs_len < 2 {
            return Err(DataError::Config(format!(
                "obs_len must be at least 2 to derive headings, got {}",
                self.obs_len
            )));
        }
        if self.pred_len == 0 {
            return Err(DataError::Config("pred_len must be positive".to_string()));
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(DataError::Config(format!(
                "epsilon must be a non-negative number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DataError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
