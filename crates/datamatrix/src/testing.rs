//! Test and benchmark helpers.
//!
//! Deterministic generators for arrays and draw statistics. Not part of the
//! stable API.

use ndarray::Array2;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::element::Element;
use crate::matrix::DataMatrix;

/// Seeded generator used throughout tests and benches.
pub fn seeded_rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Random `[rows, cols]` matrix with values uniform in `[min, max)`.
pub fn random_matrix_f32(rows: usize, cols: usize, seed: u64, min: f32, max: f32) -> Array2<f32> {
    assert!(max >= min);
    let mut rng = seeded_rng(seed);
    let width = max - min;
    Array2::from_shape_simple_fn((rows, cols), || min + rng.r#gen::<f32>() * width)
}

/// `[weights.len(), cols + 1]` matrix whose last column holds `weights`.
///
/// The other columns hold the exemplar index, so draws can be checked
/// against extracted features.
pub fn weighted_matrix(weights: &[f32], cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((weights.len(), cols + 1), |(r, c)| {
        if c == cols { weights[r] } else { r as f32 }
    })
}

/// Empirical frequency of each exemplar over `draws` draws.
///
/// # Panics
///
/// Panics if the view cannot draw (unbound, or weighted without cache).
pub fn draw_frequencies<T: Element, R: Rng + ?Sized>(
    dm: &DataMatrix<'_, T>,
    draws: usize,
    rng: &mut R,
) -> Vec<f64> {
    let mut counts = vec![0usize; dm.exemplars()];
    for _ in 0..draws {
        let i = dm.draw(rng).expect("view must be ready to draw");
        counts[i] += 1;
    }
    counts.into_iter().map(|c| c as f64 / draws as f64).collect()
}
