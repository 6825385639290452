use super::ProbeError;
use ignore::WalkBuilder;
use std::{io::ErrorKind, path::Path};
use tracing::{debug, trace};

/// Total size in bytes of every regular file below `path`.
///
/// Hidden files count and no ignore files are honoured. Symbolic links are neither
/// followed nor counted, so the walk terminates even on trees with link cycles. Files
/// removed by the solver while walking are skipped.
pub fn size_of(path: &Path) -> Result<u64, ProbeError> {
    if !path.is_dir() {
        return Err(ProbeError::PathNotFound(path.to_path_buf()));
    }

    let mut total = 0;

    for entry in WalkBuilder::new(path).standard_filters(false).build() {
        let entry = entry?;

        if !entry.file_type().map_or(false, |kind| kind.is_file()) {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => {
                trace!(path = ?entry.path(), size = metadata.len(), "Counted file");
                total += metadata.len();
            }
            Err(error)
                if error
                    .io_error()
                    .map_or(false, |io| io.kind() == ErrorKind::NotFound) =>
            {
                debug!(path = ?entry.path(), "File vanished while measuring, skipped");
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(total)
}
