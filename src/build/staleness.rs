//! Timestamp-based freshness checks.
//!
//! An artifact is fresh when it exists and its modification time is at least
//! as new as every input's (ties are fresh, as in make). Resolution is
//! whatever the filesystem records; two writes inside one timestamp tick are
//! indistinguishable and that is accepted.

use crate::error::{BuildError, Result};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Returns whether `output` must be regenerated from `inputs`.
///
/// Every input must exist, even when `force` is set. Only stat calls are made.
pub fn is_stale<P: AsRef<Path>>(output: &Path, inputs: &[P], force: bool) -> Result<bool> {
    let mut newest_input: Option<SystemTime> = None;
    for input in inputs {
        let input = input.as_ref();
        let meta = fs::metadata(input).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BuildError::MissingInput(input.to_path_buf()),
            _ => BuildError::io(format!("failed to stat {}", input.display()), e),
        })?;
        if force {
            continue;
        }
        let mtime = modified(input, &meta)?;
        newest_input = Some(newest_input.map_or(mtime, |newest| newest.max(mtime)));
    }

    if force {
        return Ok(true);
    }

    let output_mtime = match fs::metadata(output) {
        Ok(meta) => modified(output, &meta)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(BuildError::io(format!("failed to stat {}", output.display()), e)),
    };

    Ok(newest_input.is_some_and(|newest| output_mtime < newest))
}

fn modified(path: &Path, meta: &fs::Metadata) -> Result<SystemTime> {
    meta.modified()
        .map_err(|e| BuildError::io(format!("failed to read mtime of {}", path.display()), e))
}
