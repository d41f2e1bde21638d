use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::format_bytes;
use crate::scanner::{FolderScanner, ScanConfig, TargetSet};
use crate::size::directory_size;

/// Number of folders matched for one target name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCount {
    pub name: String,
    pub folders: usize,
}

/// What a purge over the same roots would remove, without deleting anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgePreview {
    pub counts: Vec<TargetCount>,
    pub total_folders: usize,
    /// Approximate size. A match nested inside another match is counted once.
    pub total_bytes: u64,
    /// Roots that were missing or could not be read
    pub unreadable_roots: usize,
}

impl PurgePreview {
    pub fn folders_for(&self, name: &str) -> usize {
        self.counts
            .iter()
            .find(|count| count.name == name)
            .map_or(0, |count| count.folders)
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.total_bytes)
    }
}

/// Count and size every target folder beneath `roots`.
///
/// Read-only, so the sizes are computed in parallel.
pub fn preview<P>(roots: &[P], targets: &TargetSet, config: &ScanConfig) -> PurgePreview
where
    P: AsRef<Path>,
{
    let scanner = FolderScanner::new(config.clone());
    let mut counts: Vec<TargetCount> = targets
        .iter()
        .map(|name| TargetCount {
            name: name.to_string(),
            folders: 0,
        })
        .collect();
    let mut matches: Vec<PathBuf> = Vec::new();
    let mut unreadable_roots = 0;

    for root in roots {
        let root = root.as_ref();
        let mut readable = true;

        for count in counts.iter_mut() {
            match scanner.find_matching_directories(root, &count.name) {
                Ok(found) => {
                    count.folders += found.len();
                    matches.extend(found);
                }
                Err(e) => {
                    warn!("Preview skipping root: {}", e);
                    readable = false;
                    break;
                }
            }
        }

        if !readable {
            unreadable_roots += 1;
        }
    }

    let outermost = outermost_only(matches);
    let total_bytes = outermost
        .par_iter()
        .map(directory_size)
        .reduce(|| 0, u64::saturating_add);

    let preview = PurgePreview {
        total_folders: counts.iter().map(|count| count.folders).sum(),
        counts,
        total_bytes,
        unreadable_roots,
    };

    info!(
        "Preview: {} folder(s), {}",
        preview.total_folders,
        preview.format_size()
    );
    preview
}

/// Drop paths that lie beneath another path in the list
fn outermost_only(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let all: HashSet<PathBuf> = paths.iter().cloned().collect();
    let mut kept: Vec<PathBuf> = all
        .iter()
        .filter(|path| !path.ancestors().skip(1).any(|ancestor| all.contains(ancestor)))
        .cloned()
        .collect();
    kept.sort();
    kept
}
