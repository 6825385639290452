use super::{
    best_2d_pair, best_3d_triplet, factors, first_minimum, plan, DecomposeError,
    DecompositionShape, Dimensions, FactorPair, FactorTriplet, DEFAULT_RATIO,
};
use proptest::prelude::*;

#[test]
pub fn factors_of_twelve() {
    assert_eq!(
        factors(12).unwrap(),
        vec![
            FactorPair(1, 12),
            FactorPair(2, 6),
            FactorPair(3, 4),
            FactorPair(4, 3),
            FactorPair(6, 2),
            FactorPair(12, 1),
        ]
    );
}

#[test]
pub fn factors_square_pair_once() {
    let pairs = factors(16).unwrap();

    assert_eq!(pairs.len(), 5);
    assert_eq!(
        pairs.iter().filter(|pair| **pair == FactorPair(4, 4)).count(),
        1
    );
    assert_eq!(factors(1).unwrap(), vec![FactorPair(1, 1)]);
}

#[test]
pub fn factors_rejects_non_positive() {
    assert_eq!(factors(0), Err(DecomposeError::InvalidInput(0)));
    assert_eq!(factors(-5), Err(DecomposeError::InvalidInput(-5)));
}

#[test]
pub fn best_pair_prefers_lowest_distortion() {
    // |3/4 - 1| = 0.25 beats |4/3 - 1| = 0.33
    assert_eq!(best_2d_pair(12, DEFAULT_RATIO).unwrap(), FactorPair(3, 4));
    assert_eq!(best_2d_pair(16, DEFAULT_RATIO).unwrap(), FactorPair(4, 4));
    assert_eq!(best_2d_pair(8, 2.0).unwrap(), FactorPair(4, 2));
    assert_eq!(best_2d_pair(7, DEFAULT_RATIO).unwrap(), FactorPair(1, 7));
}

#[test]
pub fn best_pair_rejects_bad_ratio() {
    assert_eq!(best_2d_pair(4, 0.0), Err(DecomposeError::InvalidRatio(0.0)));
    assert_eq!(best_2d_pair(4, -1.0), Err(DecomposeError::InvalidRatio(-1.0)));
    assert!(matches!(
        best_2d_pair(4, f64::NAN),
        Err(DecomposeError::InvalidRatio(_))
    ));
    assert_eq!(
        best_2d_pair(0, DEFAULT_RATIO),
        Err(DecomposeError::InvalidInput(0))
    );
}

#[test]
pub fn best_triplet_cubes() {
    assert_eq!(best_3d_triplet(8).unwrap(), FactorTriplet(2, 2, 2));
    assert_eq!(best_3d_triplet(27).unwrap(), FactorTriplet(3, 3, 3));
    // (2, 2, 3) and (3, 2, 2) both score 1.5, (2, 2, 3) is enumerated first
    assert_eq!(best_3d_triplet(12).unwrap(), FactorTriplet(2, 2, 3));
    assert_eq!(best_3d_triplet(7).unwrap(), FactorTriplet(1, 1, 7));
}

#[test]
pub fn best_triplet_edge_counts() {
    assert_eq!(best_3d_triplet(1).unwrap(), FactorTriplet(1, 1, 1));
    assert_eq!(best_3d_triplet(0), Err(DecomposeError::InvalidInput(0)));
    assert_eq!(best_3d_triplet(-8), Err(DecomposeError::InvalidInput(-8)));
}

#[test]
pub fn first_minimum_keeps_earliest() {
    let picked = first_minimum(vec![(0, 3.0), (1, 1.0), (2, 1.0), (3, 2.0)], |(_, score)| {
        *score
    });

    assert_eq!(picked, Some((1, 1.0)));
    assert_eq!(first_minimum(Vec::<u8>::new(), |_| 0.0), None);
}

#[test]
pub fn plan_planar() {
    let decomposition = plan(12, Dimensions::Planar, DEFAULT_RATIO, "simple").unwrap();

    assert_eq!(decomposition.workers, 12);
    assert_eq!(decomposition.method, "simple");
    assert_eq!(
        decomposition.shape,
        DecompositionShape::Planar(FactorPair(3, 4))
    );
    assert_eq!(decomposition.shape.components(), vec![3, 4]);
}

#[test]
pub fn plan_spatial_ignores_ratio() {
    let decomposition = plan(12, Dimensions::Spatial, 5.0, "hierarchical").unwrap();

    assert_eq!(
        decomposition.shape,
        DecompositionShape::Spatial(FactorTriplet(2, 2, 3))
    );
    assert_eq!(decomposition.shape.dimensions(), Dimensions::Spatial);
    assert!(plan(12, Dimensions::Spatial, -1.0, "simple").is_ok());
    assert!(plan(0, Dimensions::Planar, 1.0, "simple").is_err());
}

#[test]
pub fn dimensions_from_count() {
    assert_eq!(Dimensions::try_from(2u8), Ok(Dimensions::Planar));
    assert_eq!(Dimensions::try_from(3u8), Ok(Dimensions::Spatial));
    assert_eq!(
        Dimensions::try_from(4u8),
        Err(DecomposeError::InvalidDimensions(4))
    );
    assert_eq!(u8::from(Dimensions::Spatial), 3);
}

proptest! {
    #[test]
    fn factor_pairs_multiply_back(n in 1i64..5000) {
        let pairs = factors(n).unwrap();
        let divisor_count = (1..=n).filter(|x| n % x == 0).count();

        prop_assert_eq!(pairs.len(), divisor_count);
        prop_assert!(pairs.iter().all(|pair| pair.product() == n as u64));
        prop_assert!(pairs.windows(2).all(|window| window[0].0 < window[1].0));
    }

    #[test]
    fn planned_shapes_keep_worker_count(n in 1i64..2000, ratio in 0.1f64..10.0) {
        prop_assert_eq!(best_2d_pair(n, ratio).unwrap().product(), n as u64);
        prop_assert_eq!(best_3d_triplet(n).unwrap().product(), n as u64);
    }
}
