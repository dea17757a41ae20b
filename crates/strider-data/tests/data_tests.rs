// Tests for strider-data: scene files through datasets, loaders and metrics

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use strider_data::{
    denormalize, displacement_errors, normalize, rotate, DataError, DataLoader, DataLoaderConfig,
    Dataset, DatasetConfig, FailurePolicy, NormalizationMode, Scene, TrajectoryDataset, Windower,
};

// Scene file helpers

/// `agents` pedestrians over `steps` frames (10 frames apart), each walking
/// a slightly curved path offset from the others.
fn scene_text(steps: usize, agents: usize) -> String {
    let mut text = String::new();
    for t in 0..steps {
        for a in 0..agents {
            let x = 2.0 + t as f64 * 0.45 + a as f64 * 1.1;
            let y = -3.0 + a as f64 * 0.8 + (t as f64 * 0.35 + a as f64).sin();
            text.push_str(&format!("{}\t{}.0\t{:.4}\t{:.4}\n", t * 10, a + 1, x, y));
        }
    }
    text
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn config() -> DatasetConfig {
    DatasetConfig::default().obs_len(4).pred_len(3)
}

fn pairwise_distances(points: &[f32], agents: usize, steps: usize) -> Vec<f64> {
    let at = |a: usize, t: usize| {
        let o = (a * steps + t) * 2;
        (points[o] as f64, points[o + 1] as f64)
    };
    let mut out = Vec::new();
    for t in 0..steps {
        for i in 0..agents {
            for j in i + 1..agents {
                let (p, q) = (at(i, t), at(j, t));
                out.push((q.0 - p.0).hypot(q.1 - p.1));
            }
        }
    }
    out
}

// Loading and failure policies

#[test]
fn test_parse_error_names_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(dir.path(), "bad.txt", "0\t1\t1.0\t1.0\n10\t1\t1.0\n");
    let err = TrajectoryDataset::from_files(&[&bad], config()).unwrap_err();
    match &err {
        DataError::Parse { path, line, .. } => {
            assert_eq!(path, &bad);
            assert_eq!(*line, 2);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("bad.txt:2"), "{msg}");
}

#[test]
fn test_abort_policy_stops_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let good = write(dir.path(), "good.txt", &scene_text(8, 2));
    let missing = dir.path().join("missing.txt");
    let err = TrajectoryDataset::from_files(&[good, missing], config()).unwrap_err();
    assert!(matches!(err, DataError::Io { .. }));
}

#[test]
fn test_skip_policy_keeps_other_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = write(dir.path(), "first.txt", &scene_text(8, 2));
    let bad = write(dir.path(), "broken.txt", "0\t1\tnope\t0\n");
    let last = write(dir.path(), "last.txt", &scene_text(9, 3));

    let cfg = config().failure_policy(FailurePolicy::Skip);
    let ds = TrajectoryDataset::from_files(&[first, bad, last], cfg).unwrap();

    // 8 frames, window of 7: 2 windows; 9 frames: 3 windows.
    assert_eq!(ds.len(), 5);
    let reports = ds.reports();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].samples, 2);
    assert!(reports[1].error.is_some());
    assert_eq!(reports[1].samples, 0);
    assert_eq!(reports[2].samples, 3);
    assert!(ds.samples().iter().all(|s| !s.source_name.contains("broken")));
}

#[test]
fn test_short_file_yields_no_samples() {
    let dir = tempfile::tempdir().unwrap();
    let short = write(dir.path(), "short.txt", &scene_text(6, 2));
    let empty = write(dir.path(), "empty.txt", "");
    let ds = TrajectoryDataset::from_files(&[short, empty], config()).unwrap();
    assert!(ds.is_empty());
    assert_eq!(ds.reports().len(), 2);
}

#[test]
fn test_config_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "run.json",
        r#"{ "obs_len": 4, "pred_len": 3, "normalization": "scene", "failure_policy": "skip" }"#,
    );
    let cfg = DatasetConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.obs_len, 4);
    assert_eq!(cfg.normalization, NormalizationMode::Scene);
    assert_eq!(cfg.failure_policy, FailurePolicy::Skip);
    assert_eq!(cfg.delimiter, '\t');

    let bad = write(dir.path(), "bad.json", r#"{ "obs_len": 1 }"#);
    assert!(matches!(
        DatasetConfig::from_json_file(&bad),
        Err(DataError::Config(_))
    ));
}

// Pipeline properties

#[test]
fn test_every_sample_has_agents() {
    // Agent 9 appears only in the middle; windows where nobody is complete
    // must not become samples.
    let mut text = String::new();
    for t in 0..7 {
        text.push_str(&format!("{}\t1\t{}\t{}\n", t, t as f64 * 0.3, (t as f64).cos()));
    }
    for t in 7..12 {
        text.push_str(&format!("{}\t9\t{}\t{}\n", t, 1.0 + t as f64, (t as f64).sin()));
    }
    let scene = Scene::parse(&text, '\t', "gappy.txt").unwrap();
    let ds = TrajectoryDataset::from_scenes(&[scene], config(), &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(ds.len(), 1);
    assert!(ds.samples().iter().all(|s| s.num_agents >= 1));
}

#[test]
fn test_window_count_boundary() {
    let cfg = config();
    let exact = Scene::parse(&scene_text(cfg.seq_len(), 2), '\t', "a.txt").unwrap();
    assert_eq!(Windower::new(&exact, cfg.obs_len, cfg.pred_len).num_windows(), 1);
    let short = Scene::parse(&scene_text(cfg.seq_len() - 1, 2), '\t', "b.txt").unwrap();
    assert_eq!(Windower::new(&short, cfg.obs_len, cfg.pred_len).num_windows(), 0);
}

#[test]
fn test_normalize_roundtrip() {
    for mode in [NormalizationMode::Scene, NormalizationMode::Window] {
        let scene = Scene::parse(&scene_text(9, 3), '\t', "train/r.txt").unwrap();
        let ds = TrajectoryDataset::from_scenes(
            &[scene],
            config().normalization(mode),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        for s in ds.samples() {
            let phys = denormalize(&s.sequence, &s.mask, s.extent).unwrap();
            let back = normalize(&phys, &s.mask, s.extent).unwrap();
            for (a, b) in back.as_slice().iter().zip(s.sequence.as_slice()) {
                assert!((a - b).abs() < 1e-5);
            }
        }
    }
}

#[test]
fn test_augmentation_preserves_distances() {
    let scene = Scene::parse(&scene_text(7, 3), '\t', "train/aug.txt").unwrap();
    let ds = TrajectoryDataset::from_scenes(&[scene], config(), &mut StdRng::seed_from_u64(0))
        .unwrap();
    let s = &ds.samples()[0];
    let before = denormalize(&s.sequence, &s.mask, s.extent).unwrap();
    let before = pairwise_distances(before.as_slice(), 3, 7);

    for degrees in [15.0, 90.0, 135.0, 270.0, 345.0] {
        let r = rotate(s, degrees).unwrap().unwrap();
        let after = denormalize(&r.sequence, &r.mask, r.extent).unwrap();
        let after = pairwise_distances(after.as_slice(), 3, 7);
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-4, "{degrees}: {a} vs {b}");
        }
    }
}

#[test]
fn test_augmentation_skips_validation_files() {
    let parse = |name: &str| Scene::parse(&scene_text(7, 2), '\t', name).unwrap();
    let cfg = config().augment(true);
    let mut rng = StdRng::seed_from_u64(11);

    let train_ds =
        TrajectoryDataset::from_scenes(&[parse("train/s.txt")], cfg.clone(), &mut rng).unwrap();
    assert_eq!(train_ds.len(), 2);
    assert_eq!(train_ds.reports()[0].augmented, 1);

    for name in ["val/s.txt", "test/s.txt"] {
        let held_out =
            TrajectoryDataset::from_scenes(&[parse(name)], cfg.clone(), &mut rng).unwrap();
        assert_eq!(held_out.len(), 1, "{name}");
        assert_eq!(held_out.reports()[0].augmented, 0, "{name}");
    }
}

// Loader over a real dataset

#[test]
fn test_loader_batches_cover_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.txt", &scene_text(10, 2));
    let b = write(dir.path(), "b.txt", &scene_text(9, 4));
    let ds = TrajectoryDataset::from_files(&[a, b], config()).unwrap();
    assert_eq!(ds.len(), 7);

    let mut loader =
        DataLoader::new(&ds, DataLoaderConfig::default().batch_size(3).seed(1)).unwrap();
    let batches = loader.epoch_batches().unwrap();
    assert_eq!(batches.len(), 3);
    let total: usize = batches.iter().map(|b| b.len()).sum();
    assert_eq!(total, 7);
    for batch in &batches {
        assert_eq!(batch.input.dims()[2], 4);
        assert_eq!(batch.output.dims()[2], 3);
        assert!(batch.num_agents.as_slice().iter().all(|&n| n >= 2));
        assert!(batch.dist_matrix.is_finite());
        assert!(batch.heading_matrix.is_finite());
    }
}

#[test]
fn test_ground_truth_scores_zero() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.txt", &scene_text(8, 3));
    let ds = TrajectoryDataset::from_files(&[a], config()).unwrap();
    let mut loader =
        DataLoader::new(&ds, DataLoaderConfig::default().batch_size(8).shuffle(false)).unwrap();
    for batch in loader.iter_batches() {
        let batch = batch.unwrap();
        let (ade, fde) = displacement_errors(&batch.output, &batch).unwrap();
        assert_eq!((ade, fde), (0.0, 0.0));
    }
}
