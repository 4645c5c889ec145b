//! Model hand-off
//!
//! The model loader reads the chosen model name from a file. The file is
//! replaced through a rename so a reader never sees a partial write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::SelectionResult;

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write `selection.chosen_model_name` followed by a newline to `path`
pub fn write_selection(path: &Path, selection: &SelectionResult) -> Result<(), HandoffError> {
    let wrap = |source: io::Error| HandoffError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, format!("{}\n", selection.chosen_model_name)).map_err(wrap)?;
    if let Err(e) = fs::rename(&tmp, path) {
        fs::remove_file(&tmp).ok();
        return Err(wrap(e));
    }

    tracing::info!(
        "Model hand-off written: {} -> {}{}",
        selection.chosen_model_name,
        path.display(),
        if selection.fallback_used { " (fallback)" } else { "" }
    );
    Ok(())
}

/// Read back a hand-off file
pub fn read_selection(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "selected_model".into());
    name.push(".tmp");
    path.with_file_name(name)
}
