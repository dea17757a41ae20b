// Scene: one position log, loaded and translation-normalized
//
// A scene file is headerless delimited text with exactly four columns:
//
//   time  agent_id  x  y
//
// Loading sorts records by time (stable, so equal timestamps keep file
// order), shifts x and y so each minimum is zero, and computes the scene mean
// and extent (per-axis maximum) on the shifted coordinates. Every downstream
// consumer works in the shifted frame: de-normalization recovers shifted
// coordinates, not file coordinates.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};

/// One observation of one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    pub time: f64,
    pub agent_id: i32,
    pub x: f64,
    pub y: f64,
}

/// All records of one input file, sorted by time, shifted to a zero minimum.
#[derive(Debug, Clone)]
pub struct Scene {
    source_name: String,
    records: Vec<RawRecord>,
    /// Unique timestamps in ascending order.
    timestamps: Vec<f64>,
    /// `records[offsets[k]..offsets[k + 1]]` are the records at `timestamps[k]`.
    offsets: Vec<usize>,
    mean: [f64; 2],
    extent: [f64; 2],
}

impl Scene {
    /// Load a scene file from disk.
    pub fn load(path: impl AsRef<Path>, delimiter: char) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, delimiter, path)
    }

    /// Parse scene text. `path` names the source in errors and becomes the
    /// scene's `source_name`.
    pub fn parse(content: &str, delimiter: char, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(parse_row(line, delimiter, path, line_no + 1)?);
        }
        Self::from_records(path.to_string_lossy().into_owned(), records)
    }

    /// Build a scene from in-memory records (any order, any offset).
    ///
    /// Fails with [`DataError::Parse`] when a time or coordinate is not
    /// finite; `line` is then the 1-based position in `records`.
    pub fn from_records(
        source_name: impl Into<String>,
        mut records: Vec<RawRecord>,
    ) -> Result<Self> {
        let source_name = source_name.into();
        if let Some((i, r)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| !(r.time.is_finite() && r.x.is_finite() && r.y.is_finite()))
        {
            return Err(DataError::Parse {
                path: PathBuf::from(&source_name),
                line: i + 1,
                reason: format!(
                    "non-finite record (time {}, x {}, y {}) for agent {}",
                    r.time, r.x, r.y, r.agent_id
                ),
            });
        }

        records.sort_by(|a, b| a.time.total_cmp(&b.time));

        let origin = if records.is_empty() {
            [0.0, 0.0]
        } else {
            records.iter().fold([f64::INFINITY, f64::INFINITY], |m, r| {
                [m[0].min(r.x), m[1].min(r.y)]
            })
        };
        for r in &mut records {
            r.x -= origin[0];
            r.y -= origin[1];
        }
        let (mean, extent) = coordinate_stats(records.iter().map(|r| [r.x, r.y]));

        let mut timestamps = Vec::new();
        let mut offsets = Vec::new();
        for (i, r) in records.iter().enumerate() {
            if timestamps.last() != Some(&r.time) {
                timestamps.push(r.time);
                offsets.push(i);
            }
        }
        offsets.push(records.len());

        Ok(Scene {
            source_name,
            records,
            timestamps,
            offsets,
            mean,
            extent,
        })
    }

    /// Identifier of the originating file.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Shifted records in time order.
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Records whose timestamp index lies in `start..end`.
    pub fn records_between(&self, start: usize, end: usize) -> &[RawRecord] {
        &self.records[self.offsets[start]..self.offsets[end]]
    }

    /// Per-axis arithmetic mean of the shifted coordinates.
    pub fn mean(&self) -> [f64; 2] {
        self.mean
    }

    /// Per-axis maximum of the shifted coordinates.
    pub fn extent(&self) -> [f64; 2] {
        self.extent
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-axis (mean, max) of a point set; zeros when empty.
pub(crate) fn coordinate_stats(points: impl Iterator<Item = [f64; 2]>) -> ([f64; 2], [f64; 2]) {
    let mut sum = [0.0; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    let mut n = 0usize;
    for p in points {
        sum[0] += p[0];
        sum[1] += p[1];
        max[0] = max[0].max(p[0]);
        max[1] = max[1].max(p[1]);
        n += 1;
    }
    if n == 0 {
        return ([0.0; 2], [0.0; 2]);
    }
    ([sum[0] / n as f64, sum[1] / n as f64], max)
}

fn parse_row(line: &str, delimiter: char, path: &Path, line_no: usize) -> Result<RawRecord> {
    let parse_err = |reason: String| DataError::Parse {
        path: PathBuf::from(path),
        line: line_no,
        reason,
    };

    let cols: Vec<&str> = line.trim().split(delimiter).map(str::trim).collect();
    if cols.len() != 4 {
        return Err(parse_err(format!(
            "expected 4 columns (time, agent id, x, y), got {}",
            cols.len()
        )));
    }

    let float = |col: usize, name: &str| -> Result<f64> {
        let v: f64 = cols[col].parse().map_err(|e| {
            parse_err(format!("column {} ({}): {:?}: {}", col + 1, name, cols[col], e))
        })?;
        if !v.is_finite() {
            return Err(parse_err(format!(
                "column {} ({}): non-finite value {:?}",
                col + 1,
                name,
                cols[col]
            )));
        }
        Ok(v)
    };

    let time = float(0, "time")?;
    // Ids are often written as floats ("3.0"); accept them when integral.
    let agent_id = match cols[1].parse::<i32>() {
        Ok(id) => id,
        Err(_) => {
            let v = float(1, "agent id")?;
            if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
                return Err(parse_err(format!(
                    "column 2 (agent id): {:?} is not an integer id",
                    cols[1]
                )));
            }
            v as i32
        }
    };
    let x = float(2, "x")?;
    let y = float(3, "y")?;

    Ok(RawRecord { time, agent_id, x, y })
}
