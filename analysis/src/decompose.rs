mod factor;
mod planar;
mod spatial;

#[cfg(test)]
mod decompose_test;

pub use factor::{factors, FactorPair};
pub use planar::{best_2d_pair, DEFAULT_RATIO};
pub use spatial::{best_3d_triplet, FactorTriplet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecomposeError {
    #[error("Worker count must be a positive integer, got {0}")]
    InvalidInput(i64),
    #[error("Target ratio must be a positive, finite number, got {0}")]
    InvalidRatio(f64),
    #[error("Only 2D and 3D decompositions are supported, got {0} dimensions")]
    InvalidDimensions(u8),
}

/// Number of axes the worker grid is split along
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimensions {
    Planar,
    Spatial,
}

impl TryFrom<u8> for Dimensions {
    type Error = DecomposeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Planar),
            3 => Ok(Self::Spatial),
            other => Err(DecomposeError::InvalidDimensions(other)),
        }
    }
}

impl From<Dimensions> for u8 {
    fn from(dims: Dimensions) -> Self {
        match dims {
            Dimensions::Planar => 2,
            Dimensions::Spatial => 3,
        }
    }
}

/// Per-axis worker counts, the product always equals the planned worker count
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum DecompositionShape {
    Planar(FactorPair),
    Spatial(FactorTriplet),
}

impl DecompositionShape {
    /// axis counts in axis order, as handed to the dictionary template
    pub fn components(&self) -> Vec<u64> {
        match self {
            Self::Planar(FactorPair(x, y)) => vec![*x, *y],
            Self::Spatial(FactorTriplet(x, y, z)) => vec![*x, *y, *z],
        }
    }

    pub fn product(&self) -> u64 {
        match self {
            Self::Planar(pair) => pair.product(),
            Self::Spatial(triplet) => triplet.product(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            Self::Planar(_) => Dimensions::Planar,
            Self::Spatial(_) => Dimensions::Spatial,
        }
    }
}

/// A planned decomposition, ready to be written into the decomposition dictionary
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Decomposition {
    pub workers: u64,
    pub method: String,
    pub shape: DecompositionShape,
}

/// Plan the worker grid for `workers` processes.
///
/// `ratio` is the wanted x/y ratio of a 2D grid. 3D grids always aim for a cube, so
/// the ratio is neither used nor validated there.
#[instrument(level = "debug")]
pub fn plan(
    workers: i64,
    dims: Dimensions,
    ratio: f64,
    method: &str,
) -> Result<Decomposition, DecomposeError> {
    let shape = match dims {
        Dimensions::Planar => DecompositionShape::Planar(best_2d_pair(workers, ratio)?),
        Dimensions::Spatial => {
            if ratio != DEFAULT_RATIO {
                debug!(ratio, "Target ratio is ignored for 3D decompositions");
            }

            DecompositionShape::Spatial(best_3d_triplet(workers)?)
        }
    };

    debug!(shape = ?shape.components(), "Selected decomposition");

    Ok(Decomposition {
        workers: shape.product(),
        method: method.to_owned(),
        shape,
    })
}

/// Pick the candidate with the lowest score, the earliest one wins on ties.
pub(crate) fn first_minimum<T, I, F>(candidates: I, score: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> f64,
{
    let mut best: Option<(T, f64)> = None;

    for candidate in candidates {
        let distortion = score(&candidate);

        if best
            .as_ref()
            .map_or(true, |(_, lowest)| distortion < *lowest)
        {
            best = Some((candidate, distortion));
        }
    }

    best.map(|(candidate, _)| candidate)
}
