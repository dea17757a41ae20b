// Windower: fixed-length slices over a scene's unique timestamps
//
// Window i covers unique timestamps [i, i + obs_len + pred_len). Windows
// advance one timestamp at a time and stop as soon as a full window no longer
// fits, so a scene with exactly obs_len + pred_len timestamps yields one
// window and a shorter scene yields none.
//
// Agent selection per window:
//   1. Candidates are the agents with a record in the first obs_len
//      timestamps. An agent that only shows up during prediction is ignored.
//   2. A candidate is kept only if it has at least obs_len + pred_len records
//      in the window and a record at every window timestamp.
//
// Agents with any gap are dropped entirely; no partial trajectory is ever
// produced even though samples carry a per-timestep mask.

use std::collections::BTreeMap;

use crate::scene::{RawRecord, Scene};

/// Produces the windows of one scene. Iterating twice restarts from the
/// first window.
#[derive(Debug, Clone, Copy)]
pub struct Windower<'a> {
    scene: &'a Scene,
    obs_len: usize,
    pred_len: usize,
}

impl<'a> Windower<'a> {
    pub fn new(scene: &'a Scene, obs_len: usize, pred_len: usize) -> Self {
        Self {
            scene,
            obs_len,
            pred_len,
        }
    }

    /// Timestamps per window.
    pub fn seq_len(&self) -> usize {
        self.obs_len + self.pred_len
    }

    /// Number of windows the scene yields.
    pub fn num_windows(&self) -> usize {
        let seq_len = self.seq_len();
        let n = self.scene.timestamps().len();
        if seq_len == 0 || n < seq_len {
            0
        } else {
            n - seq_len + 1
        }
    }

    /// Lazily iterate over all windows.
    pub fn iter(&self) -> WindowIter<'a> {
        WindowIter {
            windower: *self,
            next: 0,
        }
    }

    /// Build window `index`, if it exists.
    pub fn window(&self, index: usize) -> Option<Window<'a>> {
        if index >= self.num_windows() {
            return None;
        }
        let end = index + self.seq_len();
        Some(Window {
            index,
            obs_len: self.obs_len,
            timestamps: &self.scene.timestamps()[index..end],
            records: self.scene.records_between(index, end),
            observed: self.scene.records_between(index, index + self.obs_len),
        })
    }
}

impl<'a> IntoIterator for &Windower<'a> {
    type Item = Window<'a>;
    type IntoIter = WindowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the windows of a scene.
#[derive(Debug, Clone)]
pub struct WindowIter<'a> {
    windower: Windower<'a>,
    next: usize,
}

impl<'a> Iterator for WindowIter<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let w = self.windower.window(self.next)?;
        self.next += 1;
        Some(w)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.windower.num_windows().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowIter<'_> {}

/// One agent's positions at every window timestamp, in the scene's shifted
/// coordinate frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTrack {
    pub agent_id: i32,
    pub points: Vec<[f64; 2]>,
}

/// A contiguous run of unique timestamps borrowed from a scene.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    index: usize,
    obs_len: usize,
    timestamps: &'a [f64],
    records: &'a [RawRecord],
    observed: &'a [RawRecord],
}

impl<'a> Window<'a> {
    /// Position of this window in its scene's window sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timestamps(&self) -> &'a [f64] {
        self.timestamps
    }

    /// Every record whose timestamp falls in the window.
    pub fn records(&self) -> &'a [RawRecord] {
        self.records
    }

    pub fn obs_len(&self) -> usize {
        self.obs_len
    }

    /// Agents present during the observation phase, ascending by id.
    pub fn candidate_agents(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.observed.iter().map(|r| r.agent_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Candidates with a complete trajectory across the window, ascending by
    /// id. When an agent has several records at one timestamp, the first in
    /// file order is used.
    pub fn complete_tracks(&self) -> Vec<AgentTrack> {
        let seq_len = self.timestamps.len();
        let mut per_agent: BTreeMap<i32, (usize, Vec<Option<[f64; 2]>>)> = self
            .candidate_agents()
            .into_iter()
            .map(|id| (id, (0, vec![None; seq_len])))
            .collect();

        let mut step = 0;
        for r in self.records {
            while step < seq_len && self.timestamps[step] != r.time {
                step += 1;
            }
            if step == seq_len {
                break;
            }
            if let Some((count, slots)) = per_agent.get_mut(&r.agent_id) {
                *count += 1;
                slots[step].get_or_insert([r.x, r.y]);
            }
        }

        per_agent
            .into_iter()
            .filter(|(_, (count, _))| *count >= seq_len)
            .filter_map(|(agent_id, (_, slots))| {
                let points: Option<Vec<[f64; 2]>> = slots.into_iter().collect();
                points.map(|points| AgentTrack { agent_id, points })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(time: f64, agent_id: i32, x: f64, y: f64) -> RawRecord {
        RawRecord { time, agent_id, x, y }
    }

    fn scene_with_steps(n: usize, agents: &[i32]) -> Scene {
        let mut records = Vec::new();
        for t in 0..n {
            for &a in agents {
                records.push(rec(t as f64 * 10.0, a, t as f64 + a as f64, a as f64));
            }
        }
        Scene::from_records("toy", records).unwrap()
    }

    #[test]
    fn exact_length_yields_one_window() {
        let scene = scene_with_steps(8, &[1]);
        let w = Windower::new(&scene, 4, 4);
        assert_eq!(w.num_windows(), 1);
        assert_eq!(w.iter().count(), 1);
    }

    #[test]
    fn one_short_yields_none() {
        let scene = scene_with_steps(7, &[1]);
        let w = Windower::new(&scene, 4, 4);
        assert_eq!(w.num_windows(), 0);
        assert!(w.iter().next().is_none());
    }

    #[test]
    fn stride_one_and_restartable() {
        let scene = scene_with_steps(10, &[1, 2]);
        let w = Windower::new(&scene, 3, 2);
        let starts: Vec<f64> = w.iter().map(|win| win.timestamps()[0]).collect();
        assert_eq!(starts, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(w.iter().len(), 6);
        // Second pass starts over.
        assert_eq!((&w).into_iter().count(), 6);
        let last = w.window(5).unwrap();
        assert_eq!(last.timestamps(), &[50.0, 60.0, 70.0, 80.0, 90.0]);
        assert_eq!(last.records().len(), 10);
    }

    #[test]
    fn prediction_only_agent_excluded() {
        let mut records = Vec::new();
        for t in 0..4 {
            records.push(rec(t as f64, 1, t as f64, 0.0));
        }
        for t in 2..4 {
            records.push(rec(t as f64, 2, 0.0, t as f64));
        }
        let scene = Scene::from_records("s", records).unwrap();
        let win = Windower::new(&scene, 2, 2).window(0).unwrap();
        assert_eq!(win.candidate_agents(), vec![1]);
        let tracks = win.complete_tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].agent_id, 1);
        assert_eq!(tracks[0].points.len(), 4);
    }

    #[test]
    fn agent_with_gap_dropped() {
        let mut records = Vec::new();
        for t in 0..6 {
            records.push(rec(t as f64, 1, t as f64, 0.0));
            if t != 4 {
                records.push(rec(t as f64, 2, 0.0, t as f64));
            }
        }
        let scene = Scene::from_records("s", records).unwrap();
        let w = Windower::new(&scene, 3, 3);
        let tracks = w.window(0).unwrap().complete_tracks();
        let ids: Vec<i32> = tracks.iter().map(|t| t.agent_id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn duplicate_record_does_not_fill_gap() {
        // Agent 2 has enough records but two at t=0 and none at t=3.
        let mut records = Vec::new();
        for t in 0..4 {
            records.push(rec(t as f64, 1, 0.0, 0.0));
        }
        records.push(rec(0.0, 2, 1.0, 1.0));
        records.push(rec(0.0, 2, 9.0, 9.0));
        records.push(rec(1.0, 2, 1.0, 1.0));
        records.push(rec(2.0, 2, 1.0, 1.0));
        let scene = Scene::from_records("s", records).unwrap();
        let tracks = Windower::new(&scene, 2, 2).window(0).unwrap().complete_tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].agent_id, 1);
    }

    #[test]
    fn tracks_sorted_by_agent_id() {
        let scene = scene_with_steps(4, &[9, 3, 5]);
        let tracks = Windower::new(&scene, 2, 2).window(0).unwrap().complete_tracks();
        let ids: Vec<i32> = tracks.iter().map(|t| t.agent_id).collect();
        assert_eq!(ids, vec![3, 5, 9]);
        // Shifted frame: agent 3 starts at x = 3 - min_x (min_x = 3).
        assert_eq!(tracks[0].points[0], [0.0, 0.0]);
    }
}
