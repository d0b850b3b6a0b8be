//! `git` subprocess wrapper.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use thiserror::Error;

use super::Vcs;

/// Errors returned by git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// No `git` executable on PATH.
    #[error("git executable not found: {0}")]
    NotFound(#[from] which::Error),
    /// Spawning or waiting on git failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// git ran but exited unsuccessfully.
    #[error("git {command} failed ({}){stderr}", exit_status(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// `exit code: N`, or `killed by signal` when git exited without a code.
fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code: {}", code),
        None => "killed by signal".to_string(),
    }
}

/// Git CLI wrapper bound to a located executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_path: PathBuf,
}

impl GitCli {
    /// Find `git` on PATH.
    pub fn locate() -> Result<Self, GitError> {
        let git_path = which::which("git")?;
        log::debug!("Using git at {}", git_path.display());
        Ok(Self { git_path })
    }

    /// Use a specific git executable.
    pub fn with_path(git_path: impl Into<PathBuf>) -> Self {
        Self {
            git_path: git_path.into(),
        }
    }

    /// Create a Command that never prompts for credentials.
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.stdin(Stdio::null());
        cmd
    }

    /// `-C <dest>` followed by `args`.
    fn in_repo(&self, dest: &Path, args: &[&str]) -> Command {
        let mut cmd = self.command();
        cmd.arg("-C").arg(dest).args(args);
        cmd
    }

    fn run(&self, mut cmd: Command, name: &str) -> Result<Output, GitError> {
        log::debug!("Running {:?}", cmd);
        let output = cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(GitError::CommandFailed {
                command: name.to_string(),
                code: output.status.code(),
                stderr: if stderr.is_empty() {
                    String::new()
                } else {
                    format!(": {}", stderr)
                },
            });
        }

        Ok(output)
    }
}

/// Argument vector for a shallow, recursive, quiet clone.
pub(crate) fn clone_args(url: &str, dest: &Path, branch: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["clone", "--depth", "1", "--recursive", "--quiet"]
        .into_iter()
        .map(OsString::from)
        .collect();
    if let Some(branch) = branch {
        args.push("--branch".into());
        args.push(branch.into());
    }
    args.push(url.into());
    args.push(dest.as_os_str().to_owned());
    args
}

impl Vcs for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path, branch: Option<&str>) -> Result<(), GitError> {
        let mut cmd = self.command();
        cmd.args(clone_args(url, dest, branch));
        self.run(cmd, "clone").map(|_| ())
    }

    fn pull(&self, dest: &Path) -> Result<Vec<u8>, GitError> {
        let mut cmd = self.in_repo(dest, &["pull"]);
        cmd.env("LC_ALL", "C");
        self.run(cmd, "pull").map(|output| output.stdout)
    }

    fn new_commits(&self, dest: &Path) -> Result<String, GitError> {
        let cmd = self.in_repo(dest, &["log", "--no-merges", "--oneline", "ORIG_HEAD..HEAD"]);
        let output = self.run(cmd, "log")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn submodule_sync(&self, dest: &Path) -> Result<(), GitError> {
        let cmd = self.in_repo(dest, &["submodule", "sync"]);
        self.run(cmd, "submodule sync").map(|_| ())
    }

    fn submodule_update(&self, dest: &Path) -> Result<(), GitError> {
        let cmd = self.in_repo(dest, &["submodule", "update", "--init", "--recursive"]);
        self.run(cmd, "submodule update").map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::is_up_to_date;
    use tempfile::tempdir;

    fn git() -> Option<GitCli> {
        match GitCli::locate() {
            Ok(git) => Some(git),
            Err(_) => {
                eprintln!("skipping test: git not found on PATH");
                None
            }
        }
    }

    /// Run raw git in `dir` with a fixed identity.
    fn sh(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
            .arg("-C")
            .arg(dir)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .expect("failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    }

    fn commit(dir: &Path, file: &str, message: &str) {
        std::fs::write(dir.join(file), message).unwrap();
        sh(dir, &["add", "."]);
        sh(dir, &["commit", "-q", "-m", message]);
    }

    fn file_url(path: &Path) -> String {
        format!("file://{}", path.display())
    }

    #[test]
    fn clone_args_without_branch() {
        let args = clone_args("https://github.com/a/b", Path::new("/tmp/b"), None);
        assert_eq!(
            args,
            ["clone", "--depth", "1", "--recursive", "--quiet", "https://github.com/a/b", "/tmp/b"]
                .map(OsString::from)
        );
    }

    #[test]
    fn clone_args_with_branch() {
        let args = clone_args("git@host:a/b", Path::new("b"), Some("dev"));
        assert_eq!(
            args,
            [
                "clone", "--depth", "1", "--recursive", "--quiet", "--branch", "dev",
                "git@host:a/b", "b",
            ]
            .map(OsString::from)
        );
    }

    #[test]
    fn command_failure_shows_plain_exit_code() {
        let err = GitError::CommandFailed {
            command: "pull".to_string(),
            code: Some(128),
            stderr: ": fatal: not a git repository".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "git pull failed (exit code: 128): fatal: not a git repository"
        );
    }

    #[test]
    fn command_failure_without_code_was_killed() {
        let err = GitError::CommandFailed {
            command: "clone".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "git clone failed (killed by signal)");
    }

    #[test]
    fn missing_executable_fails_to_run() {
        let dir = tempdir().unwrap();
        let git = GitCli::with_path(dir.path().join("no-such-git"));
        let result = git.pull(dir.path());
        assert!(matches!(result, Err(GitError::Io(_))));
    }

    #[test]
    fn clone_of_missing_remote_fails() {
        let Some(git) = git() else { return };
        let dir = tempdir().unwrap();
        let result = git.clone_repo(
            &file_url(&dir.path().join("missing")),
            &dir.path().join("dest"),
            None,
        );
        assert!(matches!(result, Err(GitError::CommandFailed { .. })));
        assert!(!dir.path().join("dest").exists());
    }

    #[test]
    fn clone_pull_and_log_against_local_remote() {
        let Some(git) = git() else { return };
        let dir = tempdir().unwrap();
        let upstream = dir.path().join("upstream");
        std::fs::create_dir(&upstream).unwrap();
        sh(&upstream, &["init", "-q"]);
        commit(&upstream, "plugin.vim", "initial");

        let dest = dir.path().join("bundle").join("upstream");
        git.clone_repo(&file_url(&upstream), &dest, None).unwrap();
        assert!(dest.join("plugin.vim").exists());

        let output = git.pull(&dest).unwrap();
        assert!(is_up_to_date(&output));

        commit(&upstream, "autoload.vim", "add autoload");
        let output = git.pull(&dest).unwrap();
        assert!(!is_up_to_date(&output));

        let log = git.new_commits(&dest).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.ends_with("add autoload"));
    }

    #[test]
    fn clone_with_unknown_branch_fails() {
        let Some(git) = git() else { return };
        let dir = tempdir().unwrap();
        let upstream = dir.path().join("upstream");
        std::fs::create_dir(&upstream).unwrap();
        sh(&upstream, &["init", "-q"]);
        commit(&upstream, "plugin.vim", "initial");

        let result = git.clone_repo(
            &file_url(&upstream),
            &dir.path().join("dest"),
            Some("no-such-branch"),
        );
        assert!(matches!(result, Err(GitError::CommandFailed { .. })));
    }
}
