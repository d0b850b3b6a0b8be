//! Help tag regeneration through a batch-mode editor run.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// Editors tried in order.
const EDITORS: [&str; 3] = ["vim", "nvim", "gvim"];

#[derive(Debug, Error)]
pub enum HelptagsError {
    #[error("no editor found (tried {})", EDITORS.join(", "))]
    EditorNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{editor} exited with code {code:?}")]
    Failed { editor: String, code: Option<i32> },
}

/// Find the first available editor on PATH.
pub fn find_editor() -> Result<PathBuf, HelptagsError> {
    EDITORS
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or(HelptagsError::EditorNotFound)
}

/// Arguments for a silent, batch-mode help tag run. `force` overwrites
/// existing tags instead of only generating missing ones.
pub fn editor_args(vim_dir: &Path, force: bool) -> Vec<String> {
    let overwrite = if force { "1" } else { "0" };
    vec![
        "-Nes".to_string(),
        "--cmd".to_string(),
        format!(
            "set rtp^={} | call helptags#({}) | qall!",
            vim_dir.display(),
            overwrite
        ),
    ]
}

/// Regenerate help tags for every bundle.
pub fn regenerate(vim_dir: &Path, force: bool) -> Result<(), HelptagsError> {
    let editor = find_editor()?;
    log::debug!("Generating help tags with {}", editor.display());

    let status = Command::new(&editor)
        .args(editor_args(vim_dir, force))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if !status.success() {
        return Err(HelptagsError::Failed {
            editor: editor.display().to_string(),
            code: status.code(),
        });
    }
    Ok(())
}
