use std::path::Path;

/// Check if the working copy at `path` has its HEAD attached to a branch.
///
/// An attached HEAD is a symbolic ref (`ref: refs/heads/main`); a detached
/// HEAD is a bare commit id. If `.git/HEAD` cannot be read the HEAD is
/// assumed to be attached.
pub fn head_attached(path: &Path) -> bool {
    match std::fs::read_to_string(path.join(".git").join("HEAD")) {
        Ok(contents) => contents.lines().any(|line| line.contains('/')),
        Err(e) => {
            log::debug!("Cannot read HEAD of {}: {}", path.display(), e);
            true
        }
    }
}

/// Whether the working copy declares submodules.
pub fn has_submodules(path: &Path) -> bool {
    path.join(".gitmodules").exists()
}
