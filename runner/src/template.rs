//! Writes solver dictionaries from `.org` templates by plain placeholder substitution.

use foamrun_analysis::Decomposition;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

pub const NUMPROCS: &str = "NUMPROCS";
pub const METHOD: &str = "DECOMPOSEPAR_METHOD";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0:?}")]
    TemplateNotFound(PathBuf),
    #[error("Failed to write {path:?}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to read template")]
    Read(#[from] io::Error),
}

/// placeholder -> value, applied in order
pub type Substitutions = Vec<(String, String)>;

/// `NUMPROCS`, `DECOMPOSEPAR_METHOD` and one `VALUE<n>` per axis
pub fn decomposition_substitutions(decomposition: &Decomposition) -> Substitutions {
    let mut substitutions = vec![
        (NUMPROCS.to_owned(), decomposition.workers.to_string()),
        (METHOD.to_owned(), decomposition.method.clone()),
    ];

    substitutions.extend(
        decomposition
            .shape
            .components()
            .into_iter()
            .enumerate()
            .map(|(axis, count)| (format!("VALUE{}", axis + 1), count.to_string())),
    );

    substitutions
}

pub fn balance_substitutions(workers: u64) -> Substitutions {
    vec![(NUMPROCS.to_owned(), workers.to_string())]
}

pub fn render(template: &str, substitutions: &Substitutions) -> String {
    substitutions
        .iter()
        .fold(template.to_owned(), |text, (placeholder, value)| {
            text.replace(placeholder.as_str(), value)
        })
}

/// Replace `target` with the rendered `template`
pub fn write_from_template(
    template: &Path,
    target: &Path,
    substitutions: &Substitutions,
) -> Result<(), TemplateError> {
    if !template.is_file() {
        return Err(TemplateError::TemplateNotFound(template.to_path_buf()));
    }

    let text = render(&fs::read_to_string(template)?, substitutions);

    // drop the dictionary of an earlier run first
    if target.exists() {
        debug!(target = ?target, "Removing previous dictionary");
        fs::remove_file(target).map_err(|source| TemplateError::Write {
            path: target.to_path_buf(),
            source,
        })?;
    }

    fs::write(target, text).map_err(|source| TemplateError::Write {
        path: target.to_path_buf(),
        source,
    })?;

    info!(target = ?target, "Wrote dictionary from {}", template.to_string_lossy());

    Ok(())
}
