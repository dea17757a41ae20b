// Dataset splits: train/val/test file discovery
//
// A named dataset lives under `<root>/<name>/` with one directory per split.
// Every `*.txt` file in a split directory is one scene. A missing split
// directory is an empty split, not an error.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DatasetConfig;
use crate::dataset::TrajectoryDataset;
use crate::error::{DataError, Result};

/// Scene files of one named dataset, grouped by split. Each list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSplits {
    pub train: Vec<PathBuf>,
    pub val: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

impl DatasetSplits {
    /// Find the scene files of `<root>/<name>/{train,val,test}`.
    pub fn discover(root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let base = root.as_ref().join(name);
        Ok(Self {
            train: scene_files(&base.join("train"))?,
            val: scene_files(&base.join("val"))?,
            test: scene_files(&base.join("test"))?,
        })
    }

    /// Build the three datasets, named `train`, `val` and `test`.
    ///
    /// Augmentation is applied according to `config`, but files of the
    /// validation and test splits are never augmented.
    pub fn build(
        &self,
        config: &DatasetConfig,
    ) -> Result<(TrajectoryDataset, TrajectoryDataset, TrajectoryDataset)> {
        let build = |files: &[PathBuf], name: &str| {
            tracing::debug!(split = name, files = files.len(), "building split");
            TrajectoryDataset::from_files(files, config.clone()).map(|ds| ds.with_name(name))
        };
        Ok((
            build(&self.train, "train")?,
            build(&self.val, "val")?,
            build(&self.test, "test")?,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.val.is_empty() && self.test.is_empty()
    }
}

fn scene_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source: std::io::Error| DataError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn write_scene(path: &Path, steps: usize) {
        let mut text = String::new();
        for t in 0..steps {
            for a in 0..2 {
                let x = t as f64 * 0.4 + a as f64;
                let y = a as f64 * 1.5 + (t as f64 * 0.7).sin();
                text.push_str(&format!("{}\t{}\t{}\t{}\n", t * 10, a, x, y));
            }
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn discovers_sorted_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        let train = dir.path().join("eth").join("train");
        fs::create_dir_all(&train).unwrap();
        fs::create_dir_all(dir.path().join("eth").join("test")).unwrap();
        write_scene(&train.join("b.txt"), 6);
        write_scene(&train.join("a.txt"), 6);
        fs::write(train.join("notes.md"), "ignore me").unwrap();

        let splits = DatasetSplits::discover(dir.path(), "eth").unwrap();
        let names: Vec<_> = splits
            .train
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
        assert!(splits.val.is_empty());
        assert!(splits.test.is_empty());
        assert!(!splits.is_empty());
    }

    #[test]
    fn missing_dataset_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let splits = DatasetSplits::discover(dir.path(), "nowhere").unwrap();
        assert!(splits.is_empty());
    }

    #[test]
    fn builds_named_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("zara");
        for split in ["train", "val", "test"] {
            fs::create_dir_all(base.join(split)).unwrap();
            write_scene(&base.join(split).join("scene.txt"), 6);
        }
        let splits = DatasetSplits::discover(dir.path(), "zara").unwrap();
        let config = DatasetConfig::default().obs_len(3).pred_len(2);
        let (train, val, test) = splits.build(&config).unwrap();
        assert_eq!(train.name(), "train");
        assert_eq!(val.name(), "val");
        assert_eq!(test.name(), "test");
        // 6 steps, window of 5: two windows per scene, no augmentation.
        assert_eq!(train.len(), 2);
        assert_eq!(val.len(), 2);
        assert_eq!(test.len(), 2);
    }
}
