use crate::git::GitError;
use crate::report::{SEPARATOR, SUB_SEPARATOR};

/// What happened to one bundle during a sync.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Fresh clone at the requested (or default) branch.
    Cloned,
    /// The requested branch was missing; the default branch was cloned.
    ClonedDefaultBranch { branch: String },
    /// Neither clone attempt succeeded.
    CloneFailed(GitError),
    /// A pull brought new commits.
    Updated {
        /// `--oneline` log of the new non-merge commits.
        log: String,
        /// Set when updating submodules failed after the pull.
        submodule_error: Option<GitError>,
    },
    /// A pull found nothing new.
    UpToDate,
    /// Every pull attempt failed.
    PullFailed(GitError),
    /// Already cloned and not updated (no update requested or HEAD detached).
    Untouched,
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::CloneFailed(_) | SyncOutcome::PullFailed(_))
    }

    /// Report block for this outcome; empty when there is nothing to say.
    pub fn render(&self, url: &str) -> String {
        match self {
            SyncOutcome::Cloned => format!("{}{} cloned.", SEPARATOR, url),
            SyncOutcome::ClonedDefaultBranch { branch } => format!(
                "{}{} cloned, but the branch {} doesn't exist.",
                SEPARATOR, url, branch
            ),
            SyncOutcome::CloneFailed(_) => format!("{}{} can't be cloned!", SEPARATOR, url),
            SyncOutcome::PullFailed(e) => format!("{}{} pull failed: {}", SEPARATOR, url, e),
            SyncOutcome::Updated {
                log,
                submodule_error,
            } => {
                let mut block = format!("{}{} updated.", SEPARATOR, url);
                if !log.is_empty() {
                    block.push('\n');
                    block.push_str(log);
                }
                if let Some(e) = submodule_error {
                    block.push('\n');
                    block.push_str(&format!("{}Submodule update failed: {}", SUB_SEPARATOR, e));
                }
                block
            }
            SyncOutcome::UpToDate | SyncOutcome::Untouched => String::new(),
        }
    }
}

/// Per-run tally of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub cloned: u64,
    pub updated: u64,
    pub up_to_date: u64,
    pub untouched: u64,
    pub failed: u64,
}

impl SyncSummary {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Cloned | SyncOutcome::ClonedDefaultBranch { .. } => self.cloned += 1,
            SyncOutcome::Updated { .. } => self.updated += 1,
            SyncOutcome::UpToDate => self.up_to_date += 1,
            SyncOutcome::Untouched => self.untouched += 1,
            SyncOutcome::CloneFailed(_) | SyncOutcome::PullFailed(_) => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: SyncSummary) {
        self.cloned += other.cloned;
        self.updated += other.updated;
        self.up_to_date += other.up_to_date;
        self.untouched += other.untouched;
        self.failed += other.failed;
    }

    pub fn total(&self) -> u64 {
        self.cloned + self.updated + self.up_to_date + self.untouched + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://github.com/a/b";

    fn failure() -> GitError {
        GitError::CommandFailed {
            command: "pull".to_string(),
            code: Some(1),
            stderr: String::new(),
        }
    }

    #[test]
    fn clone_reports() {
        assert_eq!(
            SyncOutcome::Cloned.render(URL),
            "============ https://github.com/a/b cloned."
        );
        assert_eq!(
            SyncOutcome::ClonedDefaultBranch {
                branch: "dev".to_string()
            }
            .render(URL),
            "============ https://github.com/a/b cloned, but the branch dev doesn't exist."
        );
        assert_eq!(
            SyncOutcome::CloneFailed(failure()).render(URL),
            "============ https://github.com/a/b can't be cloned!"
        );
    }

    #[test]
    fn pull_failure_includes_error() {
        let block = SyncOutcome::PullFailed(failure()).render(URL);
        assert_eq!(
            block,
            "============ https://github.com/a/b pull failed: git pull failed (exit code: 1)"
        );
    }

    #[test]
    fn update_report_lists_commits_and_submodule_failure() {
        let outcome = SyncOutcome::Updated {
            log: "abc1234 Fix mapping\ndef5678 Add docs".to_string(),
            submodule_error: Some(failure()),
        };
        let block = outcome.render(URL);
        let lines: Vec<_> = block.lines().collect();
        assert_eq!(lines[0], "============ https://github.com/a/b updated.");
        assert_eq!(lines[1], "abc1234 Fix mapping");
        assert_eq!(lines[2], "def5678 Add docs");
        assert!(lines[3].starts_with("------------ Submodule update failed: "));
    }

    #[test]
    fn quiet_outcomes_render_nothing() {
        assert!(SyncOutcome::UpToDate.render(URL).is_empty());
        assert!(SyncOutcome::Untouched.render(URL).is_empty());
    }

    #[test]
    fn summary_tallies_and_merges() {
        let mut a = SyncSummary::default();
        a.record(&SyncOutcome::Cloned);
        a.record(&SyncOutcome::PullFailed(failure()));
        let mut b = SyncSummary::default();
        b.record(&SyncOutcome::UpToDate);
        b.record(&SyncOutcome::ClonedDefaultBranch {
            branch: "x".to_string(),
        });

        a.merge(b);
        assert_eq!(a.cloned, 2);
        assert_eq!(a.failed, 1);
        assert_eq!(a.up_to_date, 1);
        assert_eq!(a.total(), 4);
    }
}
