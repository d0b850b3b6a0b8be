//! Clone-or-update of declared bundles.
//!
//! For every bundle matching the configured filter:
//! 1. Clone if the bundle directory is missing (falling back to the default
//!    branch when the requested one cannot be cloned)
//! 2. Pull if updates were requested and HEAD is attached
//! 3. Otherwise leave it alone

mod outcome;
mod worker;

use std::io::Write;
use std::path::Path;

use crate::config::Config;
use crate::git::{self, GitError, Vcs};
use crate::registry::Registry;
use crate::report::ReportSink;
use crate::types::BundleDescriptor;

pub use outcome::{SyncOutcome, SyncSummary};

/// Total pull attempts before giving up on a bundle.
pub const PULL_ATTEMPTS: u32 = 3;

/// Sync every registry bundle matching `config.filter`.
///
/// Returns once every worker has finished. Failures are reported through
/// `sink` and counted in the summary; they never abort other bundles.
pub fn run<V, W>(registry: &Registry, config: &Config, vcs: &V, sink: &ReportSink<W>) -> SyncSummary
where
    V: Vcs,
    W: Write + Send,
{
    let bundles: Vec<_> = registry.matching(&config.filter).collect();
    log::info!(
        "Syncing {} of {} bundles with up to {} workers",
        bundles.len(),
        registry.len(),
        config.max_parallel
    );
    worker::run_pool(bundles, config, vcs, sink)
}

/// Clone or update a single bundle.
pub fn sync_bundle(bundle: &BundleDescriptor, config: &Config, vcs: &impl Vcs) -> SyncOutcome {
    let dest = config.bundle_dir(bundle.project());

    if !dest.exists() {
        clone(bundle, &dest, vcs)
    } else if config.update && git::head_attached(&dest) {
        update(&dest, vcs)
    } else {
        SyncOutcome::Untouched
    }
}

fn clone(bundle: &BundleDescriptor, dest: &Path, vcs: &impl Vcs) -> SyncOutcome {
    let url = bundle.url();

    let err = match vcs.clone_repo(&url, dest, bundle.requested_branch()) {
        Ok(()) => return SyncOutcome::Cloned,
        Err(e) => e,
    };

    // Assume the branch doesn't exist and try the default branch.
    let Some(branch) = bundle.requested_branch() else {
        return SyncOutcome::CloneFailed(err);
    };
    log::debug!("Cloning {} at {} failed ({}), trying default branch", url, branch, err);

    match vcs.clone_repo(&url, dest, None) {
        Ok(()) => SyncOutcome::ClonedDefaultBranch {
            branch: branch.to_string(),
        },
        Err(e) => SyncOutcome::CloneFailed(e),
    }
}

fn update(dest: &Path, vcs: &impl Vcs) -> SyncOutcome {
    let output = match pull_with_retry(dest, vcs) {
        Ok(output) => output,
        Err(e) => return SyncOutcome::PullFailed(e),
    };

    if git::is_up_to_date(&output) {
        return SyncOutcome::UpToDate;
    }

    let log = vcs.new_commits(dest).unwrap_or_else(|e| {
        log::warn!("Failed to list new commits in {}: {}", dest.display(), e);
        String::new()
    });

    let submodule_error = if git::has_submodules(dest) {
        update_submodules(dest, vcs).err()
    } else {
        None
    };

    SyncOutcome::Updated {
        log,
        submodule_error,
    }
}

fn pull_with_retry(dest: &Path, vcs: &impl Vcs) -> Result<Vec<u8>, GitError> {
    let mut attempt = 1;
    loop {
        match vcs.pull(dest) {
            Ok(output) => return Ok(output),
            Err(e) if attempt < PULL_ATTEMPTS => {
                log::warn!(
                    "Pull attempt {}/{} failed in {}: {}",
                    attempt,
                    PULL_ATTEMPTS,
                    dest.display(),
                    e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn update_submodules(dest: &Path, vcs: &impl Vcs) -> Result<(), GitError> {
    if let Err(e) = vcs.submodule_sync(dest) {
        log::warn!("Submodule sync failed in {}: {}", dest.display(), e);
    }
    vcs.submodule_update(dest)
}
