// DataLoader: batching, shuffling, iteration

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use rayon::prelude::*;

use crate::collate::{collate, Batch, TrajectoryItem};
use crate::dataset::Dataset;
use crate::error::{DataError, Result};

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of parallel workers for item fetching (0 = sequential).
    pub num_workers: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

/// A DataLoader wraps a Dataset and produces collated [`Batch`]es.
///
/// Items are fetched (split, de-normalized, feature-extracted) and collated
/// when a batch is requested; nothing is cached across epochs.
pub struct DataLoader<'a> {
    dataset: &'a dyn Dataset,
    config: DataLoaderConfig,
    indices: Vec<usize>,
    rng: Option<StdRng>,
}

impl<'a> DataLoader<'a> {
    /// Create a new DataLoader over a dataset.
    pub fn new(dataset: &'a dyn Dataset, config: DataLoaderConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(DataError::Config("batch_size must be positive".to_string()));
        }
        let indices: Vec<usize> = (0..dataset.len()).collect();
        let rng = config.seed.map(StdRng::seed_from_u64);
        Ok(Self {
            dataset,
            config,
            indices,
            rng,
        })
    }

    /// The number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.dataset.len() / self.config.batch_size
        } else {
            self.dataset.len().div_ceil(self.config.batch_size)
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Reshuffle indices (called at the start of each epoch).
    ///
    /// A seeded loader draws every epoch's order from one RNG stream, so
    /// epochs differ from each other but a rerun repeats them.
    pub fn reshuffle(&mut self) {
        if self.config.shuffle {
            match self.rng.as_mut() {
                Some(rng) => self.indices.shuffle(rng),
                None => self.indices.shuffle(&mut thread_rng()),
            }
        }
    }

    /// Fetch items, optionally in parallel via rayon.
    fn fetch_items(&self, indices: &[usize]) -> Result<Vec<TrajectoryItem>> {
        if self.config.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(|&i| self.dataset.get(i)).collect()
        } else {
            indices.iter().map(|&i| self.dataset.get(i)).collect()
        }
    }

    fn batch_at(&self, batch_idx: usize) -> Option<Result<Batch>> {
        let bs = self.config.batch_size;
        let n = self.dataset.len();
        let start = batch_idx * bs;
        if start >= n || (self.config.drop_last && start + bs > n) {
            return None;
        }
        let end = (start + bs).min(n);
        Some(self.fetch_items(&self.indices[start..end]).and_then(|items| collate(&items)))
    }

    /// Produce all batches for one epoch.
    pub fn epoch_batches(&mut self) -> Result<Vec<Batch>> {
        self.iter_batches().collect()
    }

    /// Iterate over batches one at a time (lower memory than `epoch_batches`).
    pub fn iter_batches(&mut self) -> BatchIterator<'_, 'a> {
        self.reshuffle();
        BatchIterator {
            loader: self,
            batch_idx: 0,
        }
    }
}

/// Iterator that yields one batch at a time.
pub struct BatchIterator<'l, 'a> {
    loader: &'l DataLoader<'a>,
    batch_idx: usize,
}

impl Iterator for BatchIterator<'_, '_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.loader.batch_at(self.batch_idx)?;
        self.batch_idx += 1;
        Some(batch)
    }
}
