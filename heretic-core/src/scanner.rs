use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::PurgeError;

/// Folder names the engine looks for, in processing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TargetSet {
    names: Vec<String>,
}

impl TargetSet {
    pub const DEFAULT_NAMES: [&'static str; 2] = ["bin", "obj"];

    /// Build a target set, keeping the first occurrence of each name.
    ///
    /// Fails with [`PurgeError::Configuration`] when no names are given or a
    /// name is blank, `.`/`..`, or contains a path separator.
    pub fn new<I, S>(names: I) -> Result<Self, PurgeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            Self::validate_name(&name)?;
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        if unique.is_empty() {
            return Err(PurgeError::configuration("no target folder names selected"));
        }

        Ok(Self { names: unique })
    }

    fn validate_name(name: &str) -> Result<(), PurgeError> {
        if name.is_empty() || name == "." || name == ".." {
            return Err(PurgeError::configuration(format!(
                "invalid target folder name {name:?}"
            )));
        }
        if name.contains(['/', '\\']) {
            return Err(PurgeError::configuration(format!(
                "target folder name {name:?} must not contain a path separator"
            )));
        }
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl Default for TargetSet {
    fn default() -> Self {
        Self {
            names: Self::DEFAULT_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for TargetSet {
    type Error = PurgeError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<TargetSet> for Vec<String> {
    fn from(set: TargetSet) -> Self {
        set.names
    }
}

/// Parses a comma separated list such as `bin,obj`
impl FromStr for TargetSet {
    type Err = PurgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(',').filter(|part| !part.trim().is_empty()))
    }
}

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Compare folder names ignoring case. Defaults to the platform
    /// convention: on for Windows and macOS, off elsewhere.
    pub case_insensitive: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            case_insensitive: cfg!(any(windows, target_os = "macos")),
        }
    }
}

/// Finds directories by name beneath a root.
///
/// Symbolic links are never followed: a linked directory is treated as a
/// leaf, even when its name matches.
pub struct FolderScanner {
    config: ScanConfig,
}

impl FolderScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Collect every directory under `root` named `target_name`.
    ///
    /// Matching directories are not descended into, so a `bin` nested in
    /// another `bin` is removed together with its parent and never listed.
    /// The result is in lexical traversal order.
    pub fn find_matching_directories<P: AsRef<Path>>(
        &self,
        root: P,
        target_name: &str,
    ) -> Result<Vec<PathBuf>, PurgeError> {
        let root = root.as_ref();
        debug!("Scanning {:?} for '{}' folders", root, target_name);

        Self::check_root(root)?;

        let mut matches = Vec::new();
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", root, e);
                    continue;
                }
            };

            if !self.name_matches(entry.file_name(), target_name) {
                continue;
            }

            if entry.path_is_symlink() {
                debug!("Not following symlink {:?}", entry.path());
                continue;
            }

            if entry.file_type().is_dir() {
                debug!("Matched {:?}", entry.path());
                matches.push(entry.into_path());
                walker.skip_current_dir();
            }
        }

        info!(
            "Found {} '{}' folder(s) under {:?}",
            matches.len(),
            target_name,
            root
        );
        Ok(matches)
    }

    /// Directories containing at least one file with the given extension,
    /// sorted and de-duplicated. Used to discover project roots.
    pub fn search_projects<P: AsRef<Path>>(
        &self,
        search_root: P,
        extension: &str,
    ) -> Result<Vec<PathBuf>, PurgeError> {
        let search_root = search_root.as_ref();
        Self::check_root(search_root)?;

        let extension = extension.trim_start_matches('.');
        let mut dirs = BTreeSet::new();

        for entry in WalkDir::new(search_root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", search_root, e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let has_extension = entry
                .path()
                .extension()
                .is_some_and(|ext| self.name_matches(ext, extension));

            if has_extension {
                if let Some(parent) = entry.path().parent() {
                    dirs.insert(parent.to_path_buf());
                }
            }
        }

        info!(
            "Found {} project folder(s) with .{} files under {:?}",
            dirs.len(),
            extension,
            search_root
        );
        Ok(dirs.into_iter().collect())
    }

    fn check_root(root: &Path) -> Result<(), PurgeError> {
        let scan_error = |source: io::Error| PurgeError::Scan {
            root: root.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(root).map_err(scan_error)?;
        if !metadata.is_dir() {
            return Err(scan_error(io::Error::new(
                io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }

        // Surface an unreadable root as a scan failure instead of an empty result
        fs::read_dir(root).map_err(scan_error)?;
        Ok(())
    }

    fn name_matches(&self, name: &OsStr, target: &str) -> bool {
        if self.config.case_insensitive {
            name.to_string_lossy().to_lowercase() == target.to_lowercase()
        } else {
            name == OsStr::new(target)
        }
    }
}

impl Default for FolderScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
