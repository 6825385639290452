use crate::monitor::ProbeError;
use itertools::Itertools;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, trace};

/// directory name prefix of a worker's output tree, followed by the worker index
pub const WORKER_PREFIX: &str = "processor";

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct WorkerDir {
    pub index: usize,
    pub path: PathBuf,
}

/// path of the output tree written by worker `index`
pub fn worker_root(case: &Path, index: usize) -> PathBuf {
    case.join(format!("{WORKER_PREFIX}{index}"))
}

fn parse_worker_index(name: &str) -> Option<usize> {
    name.strip_prefix(WORKER_PREFIX)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
}

/// All `processor<N>` directories directly below `case`, ordered by worker index
pub fn list_worker_directories(case: &Path) -> Result<Vec<WorkerDir>, ProbeError> {
    if !case.is_dir() {
        return Err(ProbeError::PathNotFound(case.to_path_buf()));
    }

    let workers = fs::read_dir(case)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map_or(false, |kind| kind.is_dir()))
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = parse_worker_index(name.to_str()?)?;

            trace!(index, path = ?entry.path(), "Found worker directory");

            Some(WorkerDir {
                index,
                path: entry.path(),
            })
        })
        .sorted_by_key(|worker| worker.index)
        .collect_vec();

    debug!(case = ?case, workers = workers.len(), "Discovered worker directories");

    Ok(workers)
}

/// number of workers of a case, a case without worker directories ran serially
pub fn worker_count(case: &Path) -> Result<usize, ProbeError> {
    Ok(list_worker_directories(case)?.len().max(1))
}
