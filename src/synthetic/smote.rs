//! SMOTE (Synthetic Minority Over-sampling Technique)

use crate::error::{ChurnError, Result};
use crate::synthetic::{class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Ordered float for BinaryHeap-based partial sort
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

/// Interpolating oversampler for the minority class.
///
/// Each synthetic row lies on the segment between a minority row and one of
/// its `k` nearest minority neighbours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SMOTE {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Random seed
    seed: u64,
    /// Minority label and rows to generate, set by `fit`
    plan: Option<(i64, usize)>,
}

impl SMOTE {
    /// Create new SMOTE sampler that balances the classes
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
            plan: None,
        }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
    }

    /// k nearest rows of `rows` to `rows[pos]`, excluding itself
    fn find_neighbors(x: &Array2<f64>, rows: &[usize], pos: usize, k: usize) -> Vec<usize> {
        let point = x.row(rows[pos]);
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (other, &row) in rows.iter().enumerate() {
            if other == pos {
                continue;
            }
            let candidate = DistIdx(Self::squared_distance(point, x.row(row)), other);
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        heap.into_sorted_vec().into_iter().map(|DistIdx(_, i)| i).collect()
    }
}

impl Default for SMOTE {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SMOTE {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let indices = class_indices(y);
        if indices.len() != 2 {
            return Err(ChurnError::ValidationError(format!(
                "SMOTE needs exactly 2 classes, found {}",
                indices.len()
            )));
        }

        let (minority, minority_count) = indices
            .iter()
            .map(|(&class, rows)| (class, rows.len()))
            .min_by_key(|&(_, n)| n)
            .ok_or_else(|| ChurnError::ValidationError("empty label vector".to_string()))?;
        let majority_count = y.len() - minority_count;

        if minority_count < 2 {
            return Err(ChurnError::ValidationError(
                "SMOTE needs at least 2 minority samples".to_string(),
            ));
        }

        self.plan = Some((minority, majority_count.saturating_sub(minority_count)));
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<ResampleResult> {
        let (minority, n_to_generate) = self
            .plan
            .ok_or_else(|| ChurnError::ValidationError("SMOTE not fitted".to_string()))?;

        if n_to_generate == 0 {
            return Ok(ResampleResult {
                x: x.clone(),
                y: y.clone(),
                n_synthetic: 0,
            });
        }

        let rows = class_indices(y).remove(&minority).unwrap_or_default();
        if rows.len() < 2 {
            return Err(ChurnError::ValidationError(
                "SMOTE needs at least 2 minority samples".to_string(),
            ));
        }
        let k = self.k_neighbors.min(rows.len() - 1);

        let neighbors: Vec<Vec<usize>> = (0..rows.len())
            .into_par_iter()
            .map(|pos| Self::find_neighbors(x, &rows, pos, k))
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let n_original = x.nrows();
        let n_features = x.ncols();
        let mut result_x = Array2::zeros((n_original + n_to_generate, n_features));
        result_x.slice_mut(ndarray::s![..n_original, ..]).assign(x);

        for out in n_original..n_original + n_to_generate {
            let pos = rng.gen_range(0..rows.len());
            let neighbor_pos = neighbors[pos][rng.gen_range(0..neighbors[pos].len())];
            let gap: f64 = rng.gen();

            let point = x.row(rows[pos]);
            let neighbor = x.row(rows[neighbor_pos]);
            let mut target = result_x.row_mut(out);
            for j in 0..n_features {
                target[j] = point[j] + gap * (neighbor[j] - point[j]);
            }
        }

        let mut all_y: Vec<f64> = y.to_vec();
        all_y.extend(std::iter::repeat(minority as f64).take(n_to_generate));

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic: n_to_generate,
        })
    }
}
