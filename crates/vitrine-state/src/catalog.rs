use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One selectable model: where to load it from and what to call it in the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub path: PathBuf,
    pub name: String,
}

impl ModelEntry {
    pub fn new(path: PathBuf, name: String) -> Self {
        Self { path, name }
    }

    /// Builds an entry whose display name is the file stem.
    pub fn from_path(path: PathBuf) -> Self {
        let name = display_name(&path);
        Self { path, name }
    }
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Fixed, ordered list of models. Indices are cyclic: stepping past either
/// end wraps around.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    /// An empty catalog is a configuration error, rejected up front.
    pub fn new(entries: Vec<ModelEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> &ModelEntry {
        &self.entries[index]
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn next(&self, index: usize) -> usize {
        (index + 1) % self.entries.len()
    }

    pub fn previous(&self, index: usize) -> usize {
        (index + self.entries.len() - 1) % self.entries.len()
    }
}
