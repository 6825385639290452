use super::{factor::factors, first_minimum, DecomposeError, FactorPair};

/// square-ish partitioning
pub const DEFAULT_RATIO: f64 = 1.0;

/// Factor pair of `n` whose x/y ratio is closest to `ratio`
pub fn best_2d_pair(n: i64, ratio: f64) -> Result<FactorPair, DecomposeError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(DecomposeError::InvalidRatio(ratio));
    }

    first_minimum(factors(n)?, |pair| (pair.ratio() - ratio).abs())
        .ok_or(DecomposeError::InvalidInput(n))
}
