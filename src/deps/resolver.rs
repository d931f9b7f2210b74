//! Transitive dependents in build order.
//!
//! Each declarer is followed immediately by its own dependents, so a page
//! always comes after the pages it depends on. Recursion is bounded by a
//! fixed depth: a cycle (`a extends b`, `b extends a`) stops when the bound
//! runs out instead of looping forever.

use super::scanner::RelationScanner;
use crate::log;
use std::path::{Path, PathBuf};

/// Ordered dependent list of a page.
///
/// May contain the same page more than once when the dependency graph has
/// diamonds; rebuilding twice is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependents {
    pages: Vec<PathBuf>,
    truncated: bool,
}

impl Dependents {
    #[allow(unused)]
    pub fn pages(&self) -> &[PathBuf] {
        &self.pages
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the depth bound stopped recursion while dependents remained.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.pages.iter()
    }

    /// Comma-separated list for log lines.
    pub fn display(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'a> IntoIterator for &'a Dependents {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

/// Every page that depends on `page`, directly or not, dependency-first.
///
/// `max_depth` counts scanner levels: `1` returns direct declarers only.
pub fn transitive_dependents(scanner: &RelationScanner, page: &Path, max_depth: usize) -> Dependents {
    let mut dependents = Dependents::default();
    collect(scanner, page, max_depth, &mut dependents);
    dependents
}

fn collect(scanner: &RelationScanner, page: &Path, max_depth: usize, out: &mut Dependents) {
    let declarers = scanner.find_declarers(page);
    if declarers.is_empty() {
        return;
    }

    if max_depth <= 1 {
        log!("warn"; "while looking for dependents of {}: maximum recursion depth reached, \
                      not recursing any further. You might have a circular dependency.",
             page.display());
        out.truncated = true;
        out.pages.extend(declarers);
        return;
    }

    for declarer in declarers {
        out.pages.push(declarer.clone());
        collect(scanner, &declarer, max_depth - 1, out);
    }
}
