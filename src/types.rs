//! Bundle identifiers and their canonical decoded form.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Host used when an identifier does not name one.
pub const DEFAULT_HOST: &str = "github.com/";

/// `[host/ | host:] owner/project [:[branch]] [/sub/directory]`
static BUNDLE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[[:word:].-]+[/:])?[[:word:].-]+/[[:word:].-]+(?::[[:word:].-]*)?(?:/[[:word:].-]*)*$",
    )
    .expect("bundle format regex is valid")
});

/// Error type for identifier decoding failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Wrong bundle format: {0}")]
    InvalidFormat(String),
}

/// Protocol used to reach the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Https,
    Ssh,
}

impl Transport {
    /// URL prefix for this transport
    pub fn prefix(self) -> &'static str {
        match self {
            Transport::Https => "https://",
            Transport::Ssh => "git@",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A decoded bundle identifier.
///
/// `host` keeps the delimiter that introduced it (`/` for https, `:` for ssh),
/// so `transport + host + repo` is always a usable remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleDescriptor {
    transport: Transport,
    host: String,
    repo: String,
    branch: String,
}

impl BundleDescriptor {
    /// Protocol the remote is reached over.
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Host including its trailing delimiter (`github.com/`, `host.com:`).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `owner/project`
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Requested branch; empty means the remote default branch.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the branch to check out, if one was requested
    pub fn requested_branch(&self) -> Option<&str> {
        if self.branch.is_empty() {
            None
        } else {
            Some(&self.branch)
        }
    }

    /// Name of the local bundle directory (the `project` segment).
    pub fn project(&self) -> &str {
        self.repo
            .split_once('/')
            .map(|(_, project)| project)
            .unwrap_or(&self.repo)
    }

    /// Remote URL handed to git.
    pub fn url(&self) -> String {
        format!("{}{}{}", self.transport.prefix(), self.host, self.repo)
    }

    /// Key used to detect duplicate declarations.
    pub(crate) fn dedup_key(&self) -> String {
        self.repo.to_lowercase()
    }
}

impl FromStr for BundleDescriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !BUNDLE_FORMAT.is_match(s) {
            return Err(ParseError::InvalidFormat(s.to_string()));
        }

        let (transport, host, rest) = split_host(s);

        // Drop [/sub/directory]: everything from the second slash on.
        let rest = match rest.match_indices('/').nth(1) {
            Some((idx, _)) => &rest[..idx],
            None => rest,
        };

        let (repo, branch) = match rest.split_once(':') {
            Some((repo, "")) => (repo, platform_branch()),
            Some((repo, branch)) => (repo, branch.to_string()),
            None => (rest, String::new()),
        };

        Ok(BundleDescriptor {
            transport,
            host: host.unwrap_or(DEFAULT_HOST).to_string(),
            repo: repo.to_string(),
            branch,
        })
    }
}

impl fmt::Display for BundleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repo)
    }
}

/// Splits an optional `host/` or `host:` prefix off a validated identifier.
///
/// A `:` before the first `/` always introduces an ssh host. A leading segment
/// ended by `/` is a host only when it contains a dot and is followed by a
/// full `owner/project`, since owner names never contain dots.
fn split_host(s: &str) -> (Transport, Option<&str>, &str) {
    let Some(idx) = s.find(['/', ':']) else {
        return (Transport::Https, None, s);
    };
    let (head, tail) = (&s[..idx], &s[idx + 1..]);

    if s[idx..].starts_with(':') {
        return (Transport::Ssh, Some(&s[..=idx]), tail);
    }

    let owner_and_project = tail
        .split_once('/')
        .is_some_and(|(owner, _)| !owner.contains(':'));
    if head.contains('.') && owner_and_project {
        return (Transport::Https, Some(&s[..=idx]), tail);
    }

    (Transport::Https, None, s)
}

/// Branch substituted for a bare trailing `:`, e.g. `linux_amd64`.
pub fn platform_branch() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    };
    format!("{}_{}", os, arch)
}
