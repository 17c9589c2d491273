//! All-or-nothing publication of a run's output files.
//!
//! Each output is first written to a hidden temp file next to its destination
//! and only renamed into place by [`OutputBatch::commit`]. Temp files left by a
//! failed write are removed when the batch is dropped; a failed rename rolls
//! back the files already moved.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppError;

#[derive(Debug, Default)]
pub struct OutputBatch {
    /// `(temp, destination)` pairs not yet committed.
    staged: Vec<(PathBuf, PathBuf)>,
}

impl OutputBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dest` and return the temp path its content should be written to.
    pub fn stage(&mut self, dest: &Path) -> PathBuf {
        let temp = staging_path(dest);
        self.staged.push((temp.clone(), dest.to_path_buf()));
        temp
    }

    /// Rename every staged file into place, in staging order.
    pub fn commit(mut self) -> Result<(), AppError> {
        let staged = std::mem::take(&mut self.staged);
        let mut published: Vec<&Path> = Vec::new();

        for (idx, (temp, dest)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(temp, dest) {
                for path in published {
                    let _ = fs::remove_file(path);
                }
                for (pending, _) in &staged[idx..] {
                    let _ = fs::remove_file(pending);
                }
                return Err(AppError::input(format!(
                    "Failed to move output into place at '{}': {e}",
                    dest.display()
                )));
            }
            published.push(dest);
        }
        Ok(())
    }
}

impl Drop for OutputBatch {
    fn drop(&mut self) {
        for (temp, _) in self.staged.drain(..) {
            if fs::remove_file(&temp).is_ok() {
                debug!(path = %temp.display(), "removed uncommitted output");
            }
        }
    }
}

fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let temp_name = format!(".tmp_{}_{name}", std::process::id());
    match dest.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}
