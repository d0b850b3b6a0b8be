//! Version-control boundary.
//!
//! All remote work goes through the `git` executable; the only things read
//! back are exit statuses, a few bytes of stdout, and `.git/HEAD`.

mod cli;
mod head;

use std::path::Path;

pub use cli::{GitCli, GitError};
pub use head::{has_submodules, head_attached};

/// Marker git prints when a pull brought nothing new ("Already up to date.").
///
/// Only the first byte is compared, so both the older "up-to-date" and the
/// newer "up to date" wording match. Pulls run with `LC_ALL=C` to keep the
/// message in English.
pub const ALREADY_UP_TO_DATE_MARKER: u8 = b'A';

/// Whether `git pull` output means nothing was fetched.
pub fn is_up_to_date(pull_output: &[u8]) -> bool {
    pull_output.first().is_none_or(|&b| b == ALREADY_UP_TO_DATE_MARKER)
}

/// Operations the sync orchestrator needs from a version-control tool.
pub trait Vcs: Sync {
    /// Shallow, recursive, quiet clone of `url` into `dest`.
    fn clone_repo(&self, url: &str, dest: &Path, branch: Option<&str>) -> Result<(), GitError>;

    /// Pull in `dest`, returning stdout.
    fn pull(&self, dest: &Path) -> Result<Vec<u8>, GitError>;

    /// One line per non-merge commit brought in by the last pull.
    fn new_commits(&self, dest: &Path) -> Result<String, GitError>;

    /// `git submodule sync` in `dest`.
    fn submodule_sync(&self, dest: &Path) -> Result<(), GitError>;

    /// `git submodule update --init --recursive` in `dest`.
    fn submodule_update(&self, dest: &Path) -> Result<(), GitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_to_date_detection() {
        assert!(is_up_to_date(b"Already up to date.\n"));
        assert!(is_up_to_date(b"Already up-to-date.\n"));
        assert!(is_up_to_date(b""));
        assert!(!is_up_to_date(b"Updating 1a2b3c4..5d6e7f8\nFast-forward\n"));
    }
}
