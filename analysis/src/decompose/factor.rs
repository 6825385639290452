use super::DecomposeError;
use serde::Serialize;

/// `(x, n / x)` for a divisor `x` of `n`
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactorPair(pub u64, pub u64);

impl FactorPair {
    pub fn product(&self) -> u64 {
        self.0 * self.1
    }

    /// first over second axis
    pub fn ratio(&self) -> f64 {
        self.0 as f64 / self.1 as f64
    }
}

/// All factor pairs of `n` in ascending order of the first member.
///
/// A square pair such as `(4, 4)` for 16 appears once.
pub fn factors(n: i64) -> Result<Vec<FactorPair>, DecomposeError> {
    let count = u64::try_from(n)
        .ok()
        .filter(|count| *count > 0)
        .ok_or(DecomposeError::InvalidInput(n))?;

    Ok(factor_pairs(count))
}

/// `factors` for an already validated, non-zero count
pub(crate) fn factor_pairs(n: u64) -> Vec<FactorPair> {
    divisors(n)
        .into_iter()
        .map(|divisor| FactorPair(divisor, n / divisor))
        .collect()
}

fn divisors(n: u64) -> Vec<u64> {
    let mut lower = Vec::new();
    let mut upper = Vec::new();
    let mut candidate = 1;

    // candidate <= n / candidate is candidate² <= n without overflowing
    while candidate <= n / candidate {
        if n % candidate == 0 {
            lower.push(candidate);

            if candidate != n / candidate {
                upper.push(n / candidate);
            }
        }

        candidate += 1;
    }

    lower.extend(upper.into_iter().rev());
    lower
}
