//! The user's list of project roots and where it is persisted.
//!
//! None of this is used by the purge engine itself; front ends load a
//! [`RootList`] from a [`PathStore`], edit it, and pass its paths to a run.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::PurgeError;

/// Whether `path` can be registered as a project root
pub fn path_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().is_dir()
}

/// Durable storage for the ordered list of project roots
pub trait PathStore {
    fn load(&self) -> Result<Vec<String>, PurgeError>;
    fn save(&self, paths: &[String]) -> Result<(), PurgeError>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StoredPaths {
    #[serde(default)]
    project_paths: Vec<String>,
    #[serde(default)]
    last_saved: Option<DateTime<Local>>,
}

/// Keeps the root list in a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonPathStore {
    path: PathBuf,
}

impl JsonPathStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/heretic-purge/config.json`
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("heretic-purge").join("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn store_error(&self, message: impl ToString) -> PurgeError {
        PurgeError::Store {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

impl PathStore for JsonPathStore {
    fn load(&self) -> Result<Vec<String>, PurgeError> {
        if !self.exists() {
            debug!("No saved paths at {:?}", self.path);
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.store_error(e))?;
        let stored: StoredPaths =
            serde_json::from_str(&content).map_err(|e| self.store_error(e))?;

        info!(
            "Loaded {} saved path(s) from {:?}",
            stored.project_paths.len(),
            self.path
        );
        Ok(stored.project_paths)
    }

    fn save(&self, paths: &[String]) -> Result<(), PurgeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.store_error(e))?;
        }

        let stored = StoredPaths {
            project_paths: paths.to_vec(),
            last_saved: Some(Local::now()),
        };
        let content = serde_json::to_string_pretty(&stored).map_err(|e| self.store_error(e))?;
        fs::write(&self.path, content).map_err(|e| self.store_error(e))?;

        info!("Saved {} path(s) to {:?}", paths.len(), self.path);
        Ok(())
    }
}

/// Ordered, duplicate-free list of project roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootList {
    paths: Vec<String>,
}

impl RootList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored paths, keeping the first copy of duplicates
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for path in paths {
            let path = path.into();
            if !list.contains(&path) {
                list.paths.push(path);
            }
        }
        list
    }

    /// Load the saved list, dropping roots that no longer exist
    pub fn load_from<S: PathStore + ?Sized>(store: &S) -> Result<Self, PurgeError> {
        let stored = store.load()?;
        let total = stored.len();
        let list = Self::from_paths(stored.into_iter().filter(|path| path_exists(path)));

        if list.len() < total {
            info!(
                "Dropped {} saved path(s) that no longer exist",
                total - list.len()
            );
        }
        Ok(list)
    }

    pub fn save_to<S: PathStore + ?Sized>(&self, store: &S) -> Result<(), PurgeError> {
        store.save(&self.paths)
    }

    /// Register a root. Returns `Ok(false)` if it is already listed.
    pub fn add(&mut self, path: &str) -> Result<bool, PurgeError> {
        let path = path.trim();
        if path.is_empty() || !path_exists(path) {
            return Err(PurgeError::InvalidRoot(PathBuf::from(path)));
        }
        if self.contains(path) {
            return Ok(false);
        }
        self.paths.push(path.to_string());
        Ok(true)
    }

    /// Add several roots at once, e.g. the result of a project search.
    /// Returns `(added, skipped)`; missing paths and duplicates are skipped.
    pub fn extend_paths<I, P>(&mut self, paths: I) -> (usize, usize)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut added = 0;
        let mut skipped = 0;
        for path in paths {
            match self.add(&path.as_ref().to_string_lossy()) {
                Ok(true) => added += 1,
                _ => skipped += 1,
            }
        }
        (added, skipped)
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let path = path.trim();
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Roots that no longer exist on disk
    pub fn invalid_paths(&self) -> Vec<&str> {
        self.paths
            .iter()
            .filter(|path| !path_exists(path))
            .map(String::as_str)
            .collect()
    }

    /// Drop every root that no longer exists, returning how many were removed
    pub fn remove_invalid(&mut self) -> usize {
        let before = self.paths.len();
        self.paths.retain(|path| path_exists(path));
        before - self.paths.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn to_path_bufs(&self) -> Vec<PathBuf> {
        self.paths.iter().map(PathBuf::from).collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
