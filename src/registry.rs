//! The deduplicated set of declared bundles for one run.

use std::collections::HashSet;

use regex::Regex;

use crate::types::{BundleDescriptor, ParseError};

/// Declared bundles in first-seen order, unique on `owner/project`
/// (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    bundles: Vec<BundleDescriptor>,
}

impl Registry {
    /// Decode raw declarations into a registry.
    ///
    /// Malformed identifiers are returned alongside the registry and never
    /// enter it. Later duplicates are dropped silently.
    pub fn from_declarations<I, S>(raw: I) -> (Self, Vec<ParseError>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Registry::default();
        let mut seen = HashSet::new();
        let mut rejected = Vec::new();

        for declaration in raw {
            let declaration = declaration.as_ref().trim();
            match declaration.parse::<BundleDescriptor>() {
                Ok(bundle) => {
                    if seen.insert(bundle.dedup_key()) {
                        registry.bundles.push(bundle);
                    } else {
                        log::debug!("Dropping duplicate declaration: {}", declaration);
                    }
                }
                Err(e) => rejected.push(e),
            }
        }

        (registry, rejected)
    }

    /// Number of distinct bundles.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// True when nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Bundles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BundleDescriptor> {
        self.bundles.iter()
    }

    /// Bundles whose `owner/project` matches `filter`, in registry order.
    pub fn matching<'a>(
        &'a self,
        filter: &'a Regex,
    ) -> impl Iterator<Item = &'a BundleDescriptor> + 'a {
        self.bundles.iter().filter(|b| filter.is_match(b.repo()))
    }

    /// Whether a local directory name belongs to a declared bundle.
    /// Exact, case-sensitive comparison on the project segment.
    pub fn declares_project(&self, name: &str) -> bool {
        self.bundles.iter().any(|b| b.project() == name)
    }
}
