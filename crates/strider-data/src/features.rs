// Relational features: pairwise geometry between agents
//
// For observed positions p[i, t] (de-normalized, observation window only):
//
//   distance[i, t, j] = |p[j, t] - p[i, t]|
//   bearing[i, t, j]  = atan2(dy, dx) of the line of sight from i to j
//   heading[i, t, j]  = wrap(theta[i, t] - bearing[i, t, j])
//
// theta[i, t] is agent i's direction of travel, taken from p[i, t] - p[i, t-1]
// (the first step reuses the displacement from step 0 to step 1). Angles are
// radians, wrapped to (-pi, pi].
//
// Degenerate cases all produce 0:
//   - i == j and any pair closer than epsilon (no line of sight)
//   - an agent that did not move more than epsilon (no heading)
//   - either agent invalid at t per the mask

use std::f64::consts::PI;

use strider_core::{Error, Tensor};

use crate::error::Result;

/// Dense pairwise matrices, each `[agents, obs_len, agents]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalFeatures {
    pub distance: Tensor<f32>,
    pub bearing: Tensor<f32>,
    pub heading: Tensor<f32>,
}

/// Compute distance, bearing and heading matrices from observed positions.
///
/// `observed` is `[agents, obs_len, 2]` in physical (de-normalized) units and
/// `mask` is `[agents, obs_len]`.
pub fn extract(
    observed: &Tensor<f32>,
    mask: &Tensor<bool>,
    epsilon: f64,
) -> Result<RelationalFeatures> {
    let dims = observed.dims();
    if dims.len() != 3 || dims[2] != 2 {
        return Err(Error::RankMismatch {
            expected: 3,
            got: dims.len(),
        }
        .into());
    }
    let (n, obs_len) = (dims[0], dims[1]);
    if mask.dims() != &[n, obs_len][..] {
        return Err(Error::ShapeMismatch {
            expected: (n, obs_len).into(),
            got: mask.shape().clone(),
        }
        .into());
    }

    let pos = |i: usize, t: usize| -> [f64; 2] {
        let o = (i * obs_len + t) * 2;
        let s = observed.as_slice();
        [s[o] as f64, s[o + 1] as f64]
    };
    let valid = |i: usize, t: usize| mask.as_slice()[i * obs_len + t];

    let theta = |i: usize, t: usize| -> Option<f64> {
        if obs_len < 2 {
            return None;
        }
        let (a, b) = if t == 0 { (0, 1) } else { (t - 1, t) };
        if !valid(i, a) || !valid(i, b) {
            return None;
        }
        let (p, q) = (pos(i, a), pos(i, b));
        let (vx, vy) = (q[0] - p[0], q[1] - p[1]);
        if vx.hypot(vy) <= epsilon {
            return None;
        }
        Some(vy.atan2(vx))
    };

    let shape = (n, obs_len, n);
    let mut distance = Tensor::<f32>::zeros(shape);
    let mut bearing = Tensor::<f32>::zeros(shape);
    let mut heading = Tensor::<f32>::zeros(shape);

    for i in 0..n {
        for t in 0..obs_len {
            if !valid(i, t) {
                continue;
            }
            let own = theta(i, t);
            let p_i = pos(i, t);
            for j in 0..n {
                if i == j || !valid(j, t) {
                    continue;
                }
                let p_j = pos(j, t);
                let (dx, dy) = (p_j[0] - p_i[0], p_j[1] - p_i[1]);
                let d = dx.hypot(dy);
                let o = (i * obs_len + t) * n + j;
                distance.as_mut_slice()[o] = d as f32;
                if d <= epsilon {
                    continue;
                }
                let b = dy.atan2(dx);
                bearing.as_mut_slice()[o] = b as f32;
                if let Some(h) = own {
                    heading.as_mut_slice()[o] = wrap_angle(h - b) as f32;
                }
            }
        }
    }

    Ok(RelationalFeatures {
        distance,
        bearing,
        heading,
    })
}

/// Wrap an angle in radians to (-pi, pi].
pub fn wrap_angle(a: f64) -> f64 {
    let w = (a + PI).rem_euclid(2.0 * PI) - PI;
    if w <= -PI {
        w + 2.0 * PI
    } else {
        w
    }
}

/// Whether the last `traj_len` points of a trajectory deviate from a
/// quadratic fit in time by more than `threshold` (sum of squared residuals
/// over both axes).
pub fn is_non_linear(points: &[[f64; 2]], traj_len: usize, threshold: f64) -> bool {
    let traj_len = traj_len.min(points.len());
    if traj_len <= 3 {
        // Three points or fewer are fitted exactly.
        return false;
    }
    let tail = &points[points.len() - traj_len..];
    let residual: f64 = (0..2)
        .map(|axis| quadratic_residual(tail.iter().map(|p| p[axis])))
        .sum();
    residual > threshold
}

/// Sum of squared residuals of a least-squares fit `a + b t + c t^2` with
/// t = 0, 1, 2, ...
fn quadratic_residual(values: impl Iterator<Item = f64> + Clone) -> f64 {
    // Normal equations: (X^T X) w = X^T y with rows [1, t, t^2].
    let mut xtx = [[0.0f64; 3]; 3];
    let mut xty = [0.0f64; 3];
    for (t, y) in values.clone().enumerate() {
        let row = [1.0, t as f64, (t * t) as f64];
        for r in 0..3 {
            xty[r] += row[r] * y;
            for c in 0..3 {
                xtx[r][c] += row[r] * row[c];
            }
        }
    }
    let w = match solve3(xtx, xty) {
        Some(w) => w,
        None => return 0.0,
    };
    values
        .enumerate()
        .map(|(t, y)| {
            let t = t as f64;
            let e = y - (w[0] + w[1] * t + w[2] * t * t);
            e * e
        })
        .sum()
}

/// Gaussian elimination with partial pivoting on a 3x3 system.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&r, &s| a[r][col].abs().total_cmp(&a[s][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for r in col + 1..3 {
            let f = a[r][col] / a[col][col];
            for c in col..3 {
                a[r][c] -= f * a[col][c];
            }
            b[r] -= f * b[col];
        }
    }
    let mut x = [0.0; 3];
    for r in (0..3).rev() {
        let s: f64 = (r + 1..3).map(|c| a[r][c] * x[c]).sum();
        x[r] = (b[r] - s) / a[r][r];
    }
    Some(x)
}
