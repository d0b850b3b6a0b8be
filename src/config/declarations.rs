//! Reads raw bundle declarations out of a Vim init file.
//!
//! Two forms are recognized:
//!
//! ```vim
//! call Bundles('tpope/vim-surround', 'junegunn/fzf:')
//! call BundleRun('author/project/sub/dir', {...})
//! ```
//!
//! Lines starting with a `"` comment are ignored. Arguments to `Bundles()`
//! must stay on one line.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::ConfigError;

const KEYWORD: &str = "Bundle";

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*""#).expect("comment regex is valid"));
static CALL_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w*\(").expect("call regex is valid"));
static LIST_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\s,'"]+"#).expect("list token regex is valid"));
static FIRST_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\s'",()]+"#).expect("token regex is valid"));

/// Read the declarations from `path`.
pub fn read(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&text))
}

/// Extract raw identifiers from init file text, first-seen order, with
/// case-insensitive duplicates removed.
pub fn parse(text: &str) -> Vec<String> {
    let mut bundles: Vec<String> = Vec::new();

    for line in text.lines() {
        if COMMENT.is_match(line) {
            continue;
        }
        let Some(idx) = line.find(KEYWORD) else {
            continue;
        };
        let after = &line[idx + KEYWORD.len()..];

        if let Some(args) = after.strip_prefix("s(") {
            match args.rfind(')') {
                Some(end) => {
                    for token in LIST_TOKEN.find_iter(&args[..end]) {
                        push_distinct(&mut bundles, token.as_str());
                    }
                }
                None => log::warn!("Arguments to Bundles() should be on a single line."),
            }
        } else if let Some(open) = CALL_OPEN.find(after) {
            if let Some(token) = FIRST_TOKEN.find(&after[open.end()..]) {
                push_distinct(&mut bundles, token.as_str());
            }
        }
    }

    bundles
}

fn push_distinct(bundles: &mut Vec<String>, candidate: &str) {
    let lower = candidate.to_lowercase();
    if !bundles.iter().any(|b| b.to_lowercase() == lower) {
        bundles.push(candidate.to_string());
    }
}
