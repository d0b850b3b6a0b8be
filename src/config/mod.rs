//! Run configuration, built once at startup and passed by reference.
//!
//! Default layout:
//!
//! ```text
//! ~/.vim/
//! ├── init.vim        # Bundle declarations
//! └── bundle/
//!     └── <project>/  # One working copy per declared bundle
//! ```

pub mod declarations;

use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

/// Default number of concurrent sync workers.
pub const DEFAULT_ROUTINES: usize = 12;

/// Filter matching every bundle.
pub const DEFAULT_FILTER: &str = ".";

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to determine home directory")]
    HomeDirNotFound,

    #[error("invalid filter pattern: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime directory handed to the editor when regenerating help tags.
    pub vim_dir: PathBuf,
    /// Directory holding one subdirectory per bundle.
    pub bundle_root: PathBuf,
    /// File the bundle declarations are read from.
    pub init_file: PathBuf,
    /// Pull bundles that are already cloned.
    pub update: bool,
    /// Only bundles whose `owner/project` matches are synced.
    pub filter: Regex,
    /// Remove undeclared bundle directories after syncing.
    pub clean: bool,
    /// Report what clean would remove without touching the filesystem.
    pub dry_run: bool,
    /// Upper bound on concurrent sync workers (never below 1).
    pub max_parallel: usize,
    /// Regenerate help tags after syncing.
    pub helptags: bool,
}

impl Config {
    /// Create a configuration rooted at the given Vim directory.
    pub fn new(vim_dir: impl Into<PathBuf>) -> Self {
        let vim_dir = vim_dir.into();
        Self {
            bundle_root: vim_dir.join("bundle"),
            init_file: vim_dir.join("init.vim"),
            vim_dir,
            update: false,
            filter: match_all(),
            clean: false,
            dry_run: false,
            max_parallel: DEFAULT_ROUTINES,
            helptags: true,
        }
    }

    /// Create a configuration rooted at `~/.vim`.
    pub fn from_home() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(Self::new(home.join(".vim")))
    }

    /// Override the directory bundles are cloned into.
    pub fn with_bundle_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.bundle_root = root.into();
        self
    }

    /// Override the file declarations are read from.
    pub fn with_init_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.init_file = file.into();
        self
    }

    /// Pull bundles that already exist.
    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Set the bundle filter from a regular expression.
    pub fn with_filter(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.filter = Regex::new(pattern)?;
        Ok(self)
    }

    /// Remove undeclared bundles after syncing, or only report them with `dry_run`.
    pub fn with_clean(mut self, clean: bool, dry_run: bool) -> Self {
        self.clean = clean;
        self.dry_run = dry_run;
        self
    }

    /// Set the worker count; zero is treated as one.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Regenerate help tags after syncing.
    pub fn with_helptags(mut self, helptags: bool) -> Self {
        self.helptags = helptags;
        self
    }

    /// Local directory for a bundle's project name.
    pub fn bundle_dir(&self, project: &str) -> PathBuf {
        self.bundle_root.join(project)
    }

    /// Directory holding one sub-directory per bundle.
    pub fn bundle_root(&self) -> &Path {
        &self.bundle_root
    }
}

fn match_all() -> Regex {
    Regex::new(DEFAULT_FILTER).expect("match-all filter is valid")
}
