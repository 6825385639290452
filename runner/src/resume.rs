use foamrun_analysis::worker_root;
use globset::{Glob, GlobMatcher};
use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, info};

pub const LOG_COPY_SUFFIX: &str = "Lcopy";
pub const OUT_COPY_SUFFIX: &str = "Ocopy";

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Expected at most one .out file in {dir:?}, found {count}")]
    TooManyOutFiles { dir: PathBuf, count: usize },
    #[error("Failed to preserve log file")]
    Io(#[from] io::Error),
    #[error("Log pattern was invalid")]
    InvalidGlob(#[from] globset::Error),
}

/// How many workers a run starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    Workers(u64),
    /// continue an earlier run with its existing worker directories
    Resume,
}

impl Default for Launch {
    fn default() -> Self {
        Self::Workers(1)
    }
}

impl FromStr for Launch {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "resume" {
            return Ok(Self::Resume);
        }

        match value.parse::<u64>() {
            Ok(0) => Err("worker count must be at least 1".to_owned()),
            Ok(workers) => Ok(Self::Workers(workers)),
            Err(_) => Err(format!(
                "expected a worker count or `resume`, got {value:?}"
            )),
        }
    }
}

fn matcher(pattern: &str) -> Result<GlobMatcher, ResumeError> {
    Ok(Glob::new(pattern)?.compile_matcher())
}

/// files directly in `dir` whose name matches `pattern`, sorted by name
fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ResumeError> {
    let matcher = matcher(pattern)?;
    let mut files = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map_or(false, |kind| kind.is_file()))
        .filter(|entry| matcher.is_match(entry.file_name()))
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    files.sort();

    Ok(files)
}

/// Move the logs of an interrupted run aside so the resumed run starts fresh ones.
///
/// `case/log` becomes `case/log.<k>.Lcopy` and the single `*.out` file of the first
/// worker (or of the case for serial runs) becomes `case/<name>.<k>.Ocopy`, with `k`
/// the number of copies made before. Returns the new paths.
pub fn preserve_log_files(case: &Path, workers: usize) -> Result<Vec<PathBuf>, ResumeError> {
    let mut preserved = Vec::new();

    let log = case.join("log");
    if log.is_file() {
        let copies = matching_files(case, &format!("*.{LOG_COPY_SUFFIX}"))?.len();
        let target = case.join(format!("log.{copies}.{LOG_COPY_SUFFIX}"));

        fs::rename(&log, &target)?;
        info!(from = ?log, to = ?target, "Preserved solver log");
        preserved.push(target);
    }

    let base = if workers > 1 {
        worker_root(case, 0)
    } else {
        case.to_path_buf()
    };

    let outputs = matching_files(&base, "*.out")?;
    match outputs.as_slice() {
        [] => debug!(dir = ?base, "No .out file to preserve"),
        [output] => {
            let copies = matching_files(case, &format!("*.{OUT_COPY_SUFFIX}"))?.len();
            let name = output
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let target = case.join(format!("{name}.{copies}.{OUT_COPY_SUFFIX}"));

            fs::rename(output, &target)?;
            info!(from = ?output, to = ?target, "Preserved output file");
            preserved.push(target);
        }
        _ => {
            return Err(ResumeError::TooManyOutFiles {
                dir: base,
                count: outputs.len(),
            })
        }
    }

    Ok(preserved)
}
