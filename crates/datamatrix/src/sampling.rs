//! Exemplar sampling.
//!
//! Weighted draws go through [`CumulativeWeights`]: an inclusive running sum
//! over per-exemplar weights, searched with a single uniform draw scaled to
//! the total. Unweighted draws take an index straight from the generator.
//!
//! Any [`rand::Rng`] works as the generator; each draw consumes exactly one
//! value from it.

use rand::Rng;

/// Inclusive cumulative sum of exemplar weights.
///
/// `cum[k] = w[0] + ... + w[k]`, so the last entry is the total weight.
/// Weights must be non-negative, making the array non-decreasing.
///
/// Sums are kept in `f64`. Large views (a full image of 8-bit weights
/// already totals near 2^24) would otherwise stop registering small
/// weights, leaving their exemplars undrawable.
///
/// # Example
///
/// ```
/// use datamatrix::CumulativeWeights;
///
/// let cum = CumulativeWeights::from_weights([2.0, 3.0, 4.0, 1.0]);
/// assert_eq!(cum.as_slice(), &[2.0, 5.0, 9.0, 10.0]);
/// assert_eq!(cum.search(4.9), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CumulativeWeights {
    cum: Vec<f64>,
}

impl CumulativeWeights {
    /// Build from per-exemplar weights.
    pub fn from_weights<I: IntoIterator<Item = f32>>(weights: I) -> Self {
        let mut total = 0.0f64;
        let cum = weights
            .into_iter()
            .map(|w| {
                debug_assert!(w >= 0.0, "negative exemplar weight {}", w);
                total += f64::from(w);
                total
            })
            .collect();
        Self { cum }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cum.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cum.is_empty()
    }

    /// Sum of all weights.
    #[inline]
    pub fn total(&self) -> f64 {
        self.cum.last().copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.cum
    }

    /// Smallest index whose cumulative weight is `>= target`.
    ///
    /// Targets beyond the total clamp to the last index.
    #[inline]
    pub fn search(&self, target: f64) -> usize {
        debug_assert!(!self.cum.is_empty(), "search on empty cumulative weights");
        let idx = self.cum.partition_point(|&c| c < target);
        idx.min(self.cum.len() - 1)
    }

    /// Draw an index with probability proportional to its weight.
    ///
    /// The total weight must be positive; with a zero total the result is an
    /// unspecified valid index.
    #[inline]
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total = self.total();
        debug_assert!(total > 0.0, "weighted draw with total weight {}", total);
        let u: f64 = rng.r#gen();
        self.search(u * total)
    }

    /// Bytes held by the cumulative array.
    pub fn byte_size(&self) -> usize {
        self.cum.capacity() * std::mem::size_of::<f64>()
    }
}

/// Draw an index uniformly from `[0, n)`.
#[inline]
pub fn draw_uniform<R: Rng + ?Sized>(n: usize, rng: &mut R) -> usize {
    debug_assert!(n > 0, "uniform draw over zero exemplars");
    rng.gen_range(0..n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use rstest::rstest;

    fn example() -> CumulativeWeights {
        CumulativeWeights::from_weights([2.0, 3.0, 4.0, 1.0])
    }

    #[test]
    fn cumulative_is_inclusive() {
        let cum = example();
        assert_eq!(cum.as_slice(), &[2.0, 5.0, 9.0, 10.0]);
        assert_eq!(cum.total(), 10.0);
        assert_eq!(cum.len(), 4);
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(2.0, 0)]
    #[case(2.01, 1)]
    #[case(4.9, 1)]
    #[case(5.0, 1)]
    #[case(8.99, 2)]
    #[case(9.5, 3)]
    #[case(10.0 - 1e-4, 3)]
    #[case(10.0, 3)]
    #[case(11.0, 3)]
    fn search_finds_first_at_or_above(#[case] target: f64, #[case] expected: usize) {
        assert_eq!(example().search(target), expected);
    }

    #[test]
    fn zero_weight_exemplars_are_skipped() {
        let cum = CumulativeWeights::from_weights([0.0, 1.0, 0.0, 1.0]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for _ in 0..1000 {
            let i = cum.draw(&mut rng);
            assert!(i == 1 || i == 3 || i == 0, "drew zero-weight index {}", i);
        }
        // Index 0 only for an exact zero draw; index 2 never.
        assert_eq!(cum.search(1.5), 3);
    }

    #[test]
    fn draws_stay_in_range() {
        let cum = example();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        for _ in 0..10_000 {
            assert!(cum.draw(&mut rng) < 4);
            assert!(draw_uniform(4, &mut rng) < 4);
        }
    }

    #[test]
    fn small_weights_survive_large_totals() {
        // 2^24 is where consecutive f32 integers stop being representable.
        let cum = CumulativeWeights::from_weights([16_777_216.0, 1.0, 1.0]);
        assert_eq!(cum.as_slice(), &[16_777_216.0, 16_777_217.0, 16_777_218.0]);
        assert_eq!(cum.search(16_777_216.5), 1);
        assert_eq!(cum.search(16_777_217.5), 2);
    }

    #[test]
    fn empty_total_is_zero() {
        assert_eq!(CumulativeWeights::default().total(), 0.0);
        assert!(CumulativeWeights::default().is_empty());
    }
}
