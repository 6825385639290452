use super::{
    factor::{factor_pairs, factors},
    first_minimum, DecomposeError, FactorPair,
};
use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactorTriplet(pub u64, pub u64, pub u64);

impl FactorTriplet {
    pub fn product(&self) -> u64 {
        self.0 * self.1 * self.2
    }

    /// worst larger/smaller ratio between any two axes, 1.0 is a perfect cube
    pub fn max_ratio(&self) -> f64 {
        axis_ratio(self.0, self.1)
            .max(axis_ratio(self.0, self.2))
            .max(axis_ratio(self.1, self.2))
    }
}

fn axis_ratio(a: u64, b: u64) -> f64 {
    if a > b {
        a as f64 / b as f64
    } else {
        b as f64 / a as f64
    }
}

/// Triplets reachable by splitting one member of each factor pair.
///
/// This does not visit every ordered triple factorization of `n`, only the ones the
/// "split one axis of a 2D grid" derivation produces, in that order.
fn split_candidates(pairs: &[FactorPair]) -> Vec<FactorTriplet> {
    let mut triplets = Vec::new();

    for &FactorPair(first, second) in pairs {
        if first > 1 {
            triplets.extend(
                factor_pairs(first)
                    .into_iter()
                    .map(|FactorPair(a, b)| FactorTriplet(second, a, b)),
            );
        }

        if second > 1 {
            triplets.extend(
                factor_pairs(second)
                    .into_iter()
                    .map(|FactorPair(a, b)| FactorTriplet(first, a, b)),
            );
        }
    }

    triplets
}

/// Most cube-like triplet of `n`
pub fn best_3d_triplet(n: i64) -> Result<FactorTriplet, DecomposeError> {
    let candidates = split_candidates(&factors(n)?);

    // a single worker has nothing to split
    Ok(first_minimum(candidates, FactorTriplet::max_ratio).unwrap_or(FactorTriplet(1, 1, 1)))
}
