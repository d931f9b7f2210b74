//! The site database handed to builders.
//!
//! A JSON object keyed by entry id (works, tags, technologies, ...).
//! Loaded once at startup; builders read it through the build context.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    path: Option<PathBuf>,
    entries: Map<String, Value>,
}

impl Database {
    /// Read a JSON object from `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("could not read database {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("could not parse database {}", path.display()))?;
        let Value::Object(entries) = value else {
            bail!("database {} must be a JSON object", path.display());
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
        })
    }

    #[allow(unused)]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Path for command placeholders; empty when there is no database file.
    pub fn path_str(&self) -> String {
        self.path
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[allow(unused)]
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    #[allow(unused)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
