use crate::monitor::{written_time_steps, ProbeError, TimeStep};
use flate2::read::GzDecoder;
use globset::Glob;
use itertools::Itertools;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

const INTERNAL_FIELD: &str = "internalField";

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Failed to locate time steps")]
    Probe(#[from] ProbeError),
    #[error("Failed to read field file")]
    Io(#[from] io::Error),
    #[error("Field pattern was invalid")]
    InvalidGlob(#[from] globset::Error),
    #[error("No internalField entry in {0:?}")]
    MissingInternalField(PathBuf),
    #[error("Invalid internalField value {value:?} in {path:?}")]
    InvalidValue { path: PathBuf, value: String },
}

/// Uniform internal values of a set of fields at one time step
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FieldSample {
    pub time: TimeStep,
    /// `None` for fields with a non-uniform internal value
    pub values: Vec<(String, Option<f64>)>,
}

/// Names of the gzipped fields written in `time_dir`, sorted
pub fn field_names(time_dir: &Path) -> Result<Vec<String>, FieldError> {
    if !time_dir.is_dir() {
        return Err(ProbeError::PathNotFound(time_dir.to_path_buf()).into());
    }

    let matcher = Glob::new("*.gz")?.compile_matcher();

    Ok(fs::read_dir(time_dir)?
        .filter_map(Result::ok)
        .map(|entry| PathBuf::from(entry.file_name()))
        .filter(|name| matcher.is_match(name))
        .filter_map(|name| Some(name.file_stem()?.to_str()?.to_owned()))
        .sorted()
        .collect())
}

/// Internal value of a gzipped field file if it is uniform
pub fn read_uniform_value(path: &Path) -> Result<Option<f64>, FieldError> {
    let mut content = String::new();
    GzDecoder::new(File::open(path)?).read_to_string(&mut content)?;

    let entry = content
        .find(INTERNAL_FIELD)
        .map(|start| &content[start + INTERNAL_FIELD.len()..])
        .and_then(|rest| rest.find(';').map(|end| &rest[..end]))
        .ok_or_else(|| FieldError::MissingInternalField(path.to_path_buf()))?;

    if entry.contains("nonuniform") {
        return Ok(None);
    }

    let value = entry.split_whitespace().nth(1).unwrap_or_default();

    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| FieldError::InvalidValue {
            path: path.to_path_buf(),
            value: entry.trim().to_owned(),
        })
}

/// Sample every written time step of `root`.
///
/// The field list is taken from the first written time step; steps missing a field
/// report it as `None`.
pub fn field_history(root: &Path) -> Result<Vec<FieldSample>, FieldError> {
    let steps = written_time_steps(root)?;

    let Some(first) = steps.first() else {
        debug!(root = ?root, "No written time steps to sample");

        return Ok(Vec::new());
    };

    let fields = field_names(&root.join(&first.name))?;

    steps
        .into_iter()
        .map(|step| -> Result<FieldSample, FieldError> {
            let values = fields
                .iter()
                .map(|field| -> Result<(String, Option<f64>), FieldError> {
                    let path = root.join(&step.name).join(format!("{field}.gz"));

                    if !path.is_file() {
                        warn!(path = ?path, "Field missing from time step");

                        return Ok((field.clone(), None));
                    }

                    Ok((field.clone(), read_uniform_value(&path)?))
                })
                .collect::<Result<Vec<_>, FieldError>>()?;

            Ok(FieldSample { time: step, values })
        })
        .collect()
}
