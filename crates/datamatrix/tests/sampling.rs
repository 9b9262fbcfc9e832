//! Statistical tests for exemplar draws.

use approx::assert_abs_diff_eq;
use datamatrix::testing::{draw_frequencies, seeded_rng, weighted_matrix};
use datamatrix::{CumulativeWeights, DataMatrix, DimType};
use rstest::rstest;

const DF: [DimType; 2] = [DimType::Data, DimType::Feature];
const DRAWS: usize = 200_000;

#[rstest]
#[case(&[2.0, 3.0, 4.0, 1.0])]
#[case(&[1.0, 1.0, 1.0, 1.0, 1.0])]
#[case(&[0.1, 10.0, 0.5])]
#[case(&[5.0, 0.0, 5.0])]
fn weighted_draws_follow_weights(#[case] weights: &[f32]) {
    let data = weighted_matrix(weights, 2);
    let mut dm = DataMatrix::new(data.view(), &DF, Some(2), None).unwrap();
    dm.set_scale(&[1.0, 1.0], 1.0).unwrap();

    let total: f32 = weights.iter().sum();
    let freq = draw_frequencies(&dm, DRAWS, &mut seeded_rng(1234));
    for (k, (&f, &w)) in freq.iter().zip(weights).enumerate() {
        let expected = (w / total) as f64;
        assert_abs_diff_eq!(f, expected, epsilon = 0.01);
        if w == 0.0 {
            assert_eq!(f, 0.0, "zero-weight exemplar {} was drawn", k);
        }
    }
}

#[test]
fn weight_scale_does_not_change_distribution() {
    let weights = [1.0, 2.0, 7.0];
    let data = weighted_matrix(&weights, 1);
    let mut dm = DataMatrix::new(data.view(), &DF, Some(1), None).unwrap();

    dm.set_scale(&[1.0], 1.0).unwrap();
    let a = draw_frequencies(&dm, DRAWS, &mut seeded_rng(9));
    dm.set_scale(&[1.0], 1000.0).unwrap();
    let b = draw_frequencies(&dm, DRAWS, &mut seeded_rng(9));

    for (x, y) in a.iter().zip(&b) {
        assert_abs_diff_eq!(*x, *y, epsilon = 0.01);
    }
    assert_abs_diff_eq!(b[2], 0.7, epsilon = 0.01);
}

#[test]
fn drawn_exemplar_matches_features() {
    let weights = [1.0, 0.0, 3.0, 0.0];
    let data = weighted_matrix(&weights, 2);
    let mut dm = DataMatrix::new(data.view(), &DF, Some(2), None).unwrap();
    dm.set_scale(&[1.0, 1.0], 1.0).unwrap();

    let mut rng = seeded_rng(77);
    for _ in 0..100 {
        let i = dm.draw(&mut rng).unwrap();
        let (fv, w) = dm.fv(i);
        assert_eq!(fv, &[i as f32, i as f32]);
        assert!(w > 0.0);
    }
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(50)]
fn unweighted_draws_are_uniform(#[case] n: usize) {
    let data = weighted_matrix(&vec![1.0; n], 1);
    let dm = DataMatrix::new(data.view(), &DF, None, None).unwrap();
    assert!(dm.cumulative_weights().is_none());

    let freq = draw_frequencies(&dm, DRAWS, &mut seeded_rng(5));
    for f in freq {
        assert_abs_diff_eq!(f, 1.0 / n as f64, epsilon = 0.01);
    }
}

#[test]
fn draws_are_reproducible() {
    let weights = [3.0, 1.0, 4.0, 1.0, 5.0];
    let data = weighted_matrix(&weights, 1);
    let mut dm = DataMatrix::new(data.view(), &DF, Some(1), None).unwrap();
    dm.set_scale(&[1.0], 1.0).unwrap();

    let mut a = seeded_rng(3);
    let mut b = seeded_rng(3);
    for _ in 0..1000 {
        assert_eq!(dm.draw(&mut a).unwrap(), dm.draw(&mut b).unwrap());
    }
}

#[test]
fn binary_search_reference_points() {
    let cum = CumulativeWeights::from_weights([2.0, 3.0, 4.0, 1.0]);
    assert_eq!(cum.as_slice(), &[2.0, 5.0, 9.0, 10.0]);
    assert_eq!(cum.search(4.9), 1);
    assert_eq!(cum.search(10.0 - f64::EPSILON * 10.0), 3);
}
