mod size;
mod times;


pub use size::size_of;
pub use times::{latest_time_step, list_time_steps, written_time_steps, TimeStep};

use crate::workers::{worker_count, worker_root};
use serde::Serialize;
use std::{io, path::Path, path::PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Path not found or not a directory: {0:?}")]
    PathNotFound(PathBuf),
    #[error("Failed to walk directory tree")]
    Walk(#[from] ignore::Error),
    #[error("Failed to read directory")]
    Io(#[from] io::Error),
}

/// Per-worker deviation from an even split of the latest output, in percent
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ImbalanceReport {
    /// time step that was compared, `None` if nothing was written yet
    pub time: Option<TimeStep>,
    /// indexed by worker index
    pub deviations: Vec<f64>,
}

impl ImbalanceReport {
    fn balanced(workers: usize) -> Self {
        Self {
            time: None,
            deviations: vec![0.0; workers],
        }
    }

    pub fn deviations(&self) -> &[f64] {
        &self.deviations
    }

    /// worker with the largest deviation and its deviation
    pub fn worst(&self) -> Option<(usize, f64)> {
        self.deviations
            .iter()
            .copied()
            .enumerate()
            .fold(None, |worst, (index, deviation)| match worst {
                Some((_, largest)) if largest >= deviation => worst,
                _ => Some((index, deviation)),
            })
    }
}

/// Percent deviation of each size from an even split of their total.
///
/// A total of zero means nothing was written, which is reported as perfectly even.
pub fn load_deviations(sizes: &[u64]) -> Vec<f64> {
    let total: u64 = sizes.iter().sum();

    if total == 0 {
        return vec![0.0; sizes.len()];
    }

    let workers = sizes.len() as f64;

    sizes
        .iter()
        .map(|&size| 100.0 * (workers * size as f64 / total as f64 - 1.0).abs())
        .collect()
}

/// Bytes worker `index` wrote for `step`. Workers other than 0 may not have created
/// the step yet and count as empty until they do.
fn worker_size(case: &Path, index: usize, step: &TimeStep) -> Result<u64, ProbeError> {
    let path = worker_root(case, index).join(&step.name);

    if index > 0 && !path.exists() {
        debug!(worker = index, time = %step.name, "Time step not written by worker yet");

        return Ok(0);
    }

    size_of(&path)
}

/// Measure the load imbalance of `case` at the latest time step of worker 0.
///
/// Without an explicit worker count the `processor<N>` directories of the case are
/// counted. Every call measures from disk again; while the solver is still writing a
/// sample can be off and should be re-polled rather than trusted.
#[instrument(level = "debug")]
pub fn imbalance(case: &Path, workers: Option<usize>) -> Result<ImbalanceReport, ProbeError> {
    let workers = match workers {
        Some(count) if count > 0 => count,
        _ => worker_count(case)?,
    };

    let Some(latest) = latest_time_step(&worker_root(case, 0))? else {
        info!("No time step written yet, nothing to compare");

        return Ok(ImbalanceReport::balanced(workers));
    };

    let sizes = (0..workers)
        .map(|index| worker_size(case, index, &latest))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(time = %latest.name, sizes = ?sizes, "Measured worker output");

    let report = ImbalanceReport {
        deviations: load_deviations(&sizes),
        time: Some(latest),
    };

    if let Some((index, deviation)) = report.worst() {
        if deviation > 50.0 {
            warn!(worker = index, deviation, "Worker output is heavily imbalanced");
        }
    }

    Ok(report)
}
