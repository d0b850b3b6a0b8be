pub mod clean;
pub mod config;
pub mod git;
pub mod helptags;
pub mod registry;
pub mod report;
pub mod sync;
pub mod types;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{Config, DEFAULT_FILTER, DEFAULT_ROUTINES, declarations};
use crate::git::{GitCli, Vcs};
use crate::helptags::HelptagsError;
use crate::registry::Registry;
use crate::report::ReportSink;

#[derive(Parser)]
#[command(
    name = "vundle",
    about = "Vundle - clone, update and clean Vim bundles"
)]
struct Cli {
    /// Update bundles that are already cloned
    #[arg(short, long)]
    update: bool,

    /// Only sync bundles whose owner/project matches this regex
    #[arg(short, long, default_value = DEFAULT_FILTER)]
    filter: String,

    /// Remove bundles that are no longer declared
    #[arg(short, long)]
    clean: bool,

    /// With --clean, only report what would be removed
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Maximum number of concurrent sync workers
    #[arg(short, long, default_value_t = DEFAULT_ROUTINES)]
    routines: usize,

    /// File holding the bundle declarations [default: ~/.vim/init.vim]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory bundles are cloned into [default: ~/.vim/bundle]
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Skip help tag regeneration
    #[arg(long)]
    no_helptags: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config, config::ConfigError> {
        let mut config = Config::from_home()?
            .with_update(self.update)
            .with_filter(&self.filter)?
            .with_clean(self.clean, self.dry_run)
            .with_max_parallel(self.routines)
            .with_helptags(!self.no_helptags);
        if let Some(file) = self.config {
            config = config.with_init_file(file);
        }
        if let Some(root) = self.root {
            config = config.with_bundle_root(root);
        }
        Ok(config)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    // Individual bundle failures are reported, never turned into an exit code.
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.into_config()?;
    let git = GitCli::locate()?;
    let declared = declarations::read(&config.init_file)?;

    synchronize(
        &config,
        &declared,
        &git,
        &ReportSink::stdout(),
        helptags::regenerate,
    )
}

/// Sync, regenerate help tags and clean once the preconditions hold.
///
/// Bundle failures end up in the report and help tag failures in the log;
/// neither is returned as an error.
fn synchronize<V, W>(
    config: &Config,
    declared: &[String],
    vcs: &V,
    sink: &ReportSink<W>,
    regenerate_helptags: impl FnOnce(&Path, bool) -> Result<(), HelptagsError>,
) -> Result<(), Box<dyn std::error::Error>>
where
    V: Vcs,
    W: Write + Send,
{
    let (registry, rejected) = Registry::from_declarations(declared);
    for e in rejected {
        log::warn!("Skipping bundle: {}", e);
        sink.emit(&e.to_string());
    }
    log::info!("{} bundles declared in {}", registry.len(), config.init_file.display());

    let summary = sync::run(&registry, config, vcs, sink);
    log::info!(
        "Sync finished: {} cloned, {} updated, {} up to date, {} untouched, {} failed",
        summary.cloned,
        summary.updated,
        summary.up_to_date,
        summary.untouched,
        summary.failed
    );

    if config.helptags {
        if let Err(e) = regenerate_helptags(&config.vim_dir, config.update) {
            log::warn!("Fail generating HELP tags: {}", e);
        }
    }

    if config.clean {
        clean::run(&registry, config.bundle_root(), config.dry_run, sink);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitError;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Remote that refuses every clone.
    #[derive(Default)]
    struct Unreachable {
        clones: AtomicUsize,
    }

    impl Vcs for Unreachable {
        fn clone_repo(&self, _url: &str, _dest: &Path, _branch: Option<&str>) -> Result<(), GitError> {
            self.clones.fetch_add(1, Ordering::SeqCst);
            Err(GitError::CommandFailed {
                command: "clone".to_string(),
                code: Some(128),
                stderr: ": could not resolve host".to_string(),
            })
        }

        fn pull(&self, _dest: &Path) -> Result<Vec<u8>, GitError> {
            unreachable!("nothing is cloned, so nothing is pulled")
        }

        fn new_commits(&self, _dest: &Path) -> Result<String, GitError> {
            unreachable!("nothing is cloned, so nothing is pulled")
        }

        fn submodule_sync(&self, _dest: &Path) -> Result<(), GitError> {
            unreachable!("nothing is cloned, so nothing is pulled")
        }

        fn submodule_update(&self, _dest: &Path) -> Result<(), GitError> {
            unreachable!("nothing is cloned, so nothing is pulled")
        }
    }

    fn declared(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bundle_and_helptags_failures_are_not_errors() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path()).with_clean(true, false);
        std::fs::create_dir_all(config.bundle_dir("stale").join(".git")).unwrap();
        let vcs = Unreachable::default();
        let sink = ReportSink::new(Vec::new());
        let helptags_ran = Cell::new(false);

        let result = synchronize(
            &config,
            &declared(&["a/one", "b/two:dev", "not valid"]),
            &vcs,
            &sink,
            |vim_dir, force| {
                assert_eq!(vim_dir, dir.path());
                assert!(!force);
                helptags_ran.set(true);
                Err(HelptagsError::EditorNotFound)
            },
        );

        assert!(result.is_ok());
        assert!(helptags_ran.get());
        // one clone for a/one, branch then default for b/two
        assert_eq!(vcs.clones.load(Ordering::SeqCst), 3);

        let report = sink.contents();
        assert!(report.contains("Wrong bundle format: not valid"));
        assert!(report.contains("https://github.com/a/one can't be cloned!"));
        assert!(report.contains("https://github.com/b/two can't be cloned!"));
        assert!(report.contains(" removed."));
        assert!(!config.bundle_dir("stale").exists());
    }

    #[test]
    fn disabled_steps_are_skipped() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path()).with_helptags(false);
        std::fs::create_dir_all(config.bundle_dir("stale")).unwrap();
        let sink = ReportSink::new(Vec::new());

        let result = synchronize(
            &config,
            &[],
            &Unreachable::default(),
            &sink,
            |_, _| panic!("help tags are disabled"),
        );

        assert!(result.is_ok());
        assert_eq!(sink.contents(), "");
        assert!(config.bundle_dir("stale").exists());
    }
}
