use super::ProbeError;
use serde::Serialize;
use std::{fs, path::Path};

/// A time step directory, kept by name so `0.10` is not rewritten to `0.1`
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TimeStep {
    pub name: String,
    pub value: f64,
}

impl TimeStep {
    pub fn parse(name: &str) -> Option<Self> {
        name.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| Self {
                name: name.to_owned(),
                value,
            })
    }
}

/// Time step directories of `root` in ascending time order
pub fn list_time_steps(root: &Path) -> Result<Vec<TimeStep>, ProbeError> {
    if !root.is_dir() {
        return Err(ProbeError::PathNotFound(root.to_path_buf()));
    }

    let mut steps: Vec<TimeStep> = fs::read_dir(root)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map_or(false, |kind| kind.is_dir()))
        .filter_map(|entry| TimeStep::parse(entry.file_name().to_str()?))
        .collect();

    steps.sort_by(|a, b| a.value.total_cmp(&b.value));

    Ok(steps)
}

pub fn latest_time_step(root: &Path) -> Result<Option<TimeStep>, ProbeError> {
    Ok(list_time_steps(root)?.pop())
}

/// Time steps written by the solver, i.e. all but the initial conditions
pub fn written_time_steps(root: &Path) -> Result<Vec<TimeStep>, ProbeError> {
    let mut steps = list_time_steps(root)?;

    if !steps.is_empty() {
        steps.remove(0);
    }

    Ok(steps)
}
