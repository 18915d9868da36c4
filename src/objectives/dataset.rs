//! Dataset provider seam
//!
//! Objectives receive a dataset provider rather than raw arrays, so real
//! training-backed objectives and analytic proxies share one signature.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Supplies train and validation splits to objective evaluation
pub trait DatasetProvider {
    /// Training features and targets
    fn train(&self) -> (ArrayView2<'_, f64>, ArrayView1<'_, f64>);

    /// Validation features and targets
    fn validation(&self) -> (ArrayView2<'_, f64>, ArrayView1<'_, f64>);
}

/// Seeded synthetic regression dataset for proxy evaluation and tests
pub struct SyntheticDataset {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_val: Array2<f64>,
    y_val: Array1<f64>,
}

impl SyntheticDataset {
    /// Generate a dataset with a nonlinear target plus noise
    pub fn new(n_train: usize, n_val: usize, n_features: usize, seed: u64) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let (x_train, y_train) = Self::split(n_train, n_features, &mut rng);
        let (x_val, y_val) = Self::split(n_val, n_features, &mut rng);
        Self {
            x_train,
            y_train,
            x_val,
            y_val,
        }
    }

    fn split(n: usize, d: usize, rng: &mut Xoshiro256PlusPlus) -> (Array2<f64>, Array1<f64>) {
        let x: Array2<f64> = Array2::from_shape_fn((n, d), |_| rng.gen_range(-1.0..1.0));
        let y = Array1::from_shape_fn(n, |i| {
            let row = x.row(i);
            let signal: f64 = row.iter().enumerate().map(|(j, v)| v.sin() * (j + 1) as f64).sum();
            signal / d as f64 + rng.gen_range(-0.05..0.05)
        });
        (x, y)
    }

    /// Number of training rows
    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }
}

impl Default for SyntheticDataset {
    fn default() -> Self {
        Self::new(512, 128, 16, 42)
    }
}

impl DatasetProvider for SyntheticDataset {
    fn train(&self) -> (ArrayView2<'_, f64>, ArrayView1<'_, f64>) {
        (self.x_train.view(), self.y_train.view())
    }

    fn validation(&self) -> (ArrayView2<'_, f64>, ArrayView1<'_, f64>) {
        (self.x_val.view(), self.y_val.view())
    }
}
