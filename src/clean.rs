//! Removal of bundle directories that are no longer declared.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::registry::Registry;
use crate::report::{ReportSink, SEPARATOR};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub entries_scanned: u64,
    pub unmatched: u64,
    pub removed: u64,
    pub failed: u64,
}

/// Remove every entry of `bundle_root` whose name is not a declared project.
///
/// With `dry_run` nothing is touched, but every unmatched entry is still
/// reported. A missing root counts as empty.
pub fn run<W: Write + Send>(
    registry: &Registry,
    bundle_root: &Path,
    dry_run: bool,
    sink: &ReportSink<W>,
) -> CleanStats {
    let mut stats = CleanStats::default();

    let unmatched: Vec<PathBuf> = match std::fs::read_dir(bundle_root) {
        Ok(entries) => entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                stats.entries_scanned += 1;
                if registry.declares_project(&name) {
                    None
                } else {
                    Some(entry.path())
                }
            })
            .collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("clean: {} does not exist", bundle_root.display());
            Vec::new()
        }
        Err(e) => {
            log::warn!("clean: failed to list {}: {}", bundle_root.display(), e);
            Vec::new()
        }
    };
    stats.unmatched = unmatched.len() as u64;

    for path in unmatched {
        if dry_run {
            sink.emit(&format!("{}{} would be removed.", SEPARATOR, path.display()));
            continue;
        }

        match remove_bundle(&path) {
            Ok(()) => {
                stats.removed += 1;
                sink.emit(&format!("{}{} removed.", SEPARATOR, path.display()));
            }
            Err(e) => {
                stats.failed += 1;
                sink.emit(&format!("{}Fail removing {}: {}", SEPARATOR, path.display(), e));
            }
        }
    }

    log::info!(
        "clean: scanned {}, unmatched {}, removed {}, failed {}",
        stats.entries_scanned,
        stats.unmatched,
        stats.removed,
        stats.failed
    );
    stats
}

/// Remove a bundle directory (or stray file), including read-only contents.
fn remove_bundle(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if !meta.is_dir() {
        return std::fs::remove_file(path);
    }

    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            log::debug!("clean: clearing read-only flags under {}", path.display());
            make_writable(path)?;
            std::fs::remove_dir_all(path)
        }
        other => other,
    }
}

/// Recursively grant the owner write access, without following symlinks.
fn make_writable(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }

    set_writable(path, meta.permissions())?;

    if meta.is_dir() {
        for entry in std::fs::read_dir(path)? {
            make_writable(&entry?.path())?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_writable(path: &Path, mut perms: std::fs::Permissions) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    perms.set_mode(perms.mode() | 0o700);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn set_writable(path: &Path, mut perms: std::fs::Permissions) -> io::Result<()> {
    if perms.readonly() {
        perms.set_readonly(false);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}
