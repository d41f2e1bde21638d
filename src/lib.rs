//! # Heretic Purge
//!
//! A tool for deleting `bin` and `obj` build directories beneath a list of
//! project roots.
//!
//! ## Features
//!
//! - Find build folders at any depth, without following symlinks
//! - Delete them one by one, carrying on past locked or vanished folders
//! - Stream progress events and report the space reclaimed
//! - Keep a saved list of project roots
//!
//! ## Usage
//!
//! ### Command Line
//!
//! ```bash
//! # Register a project root, or find every .csproj under a folder
//! heretic roots add ~/src/MyApp
//! heretic roots search ~/src
//!
//! # See what would be removed
//! heretic preview
//!
//! # Purge only obj folders, without a prompt
//! heretic purge --targets obj --yes
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use heretic_purge::{CancelToken, PurgeConfig, PurgeEngine, PurgeEvent};
//!
//! let root = tempfile::tempdir()?;
//! std::fs::create_dir_all(root.path().join("App").join("obj"))?;
//! std::fs::write(root.path().join("App").join("obj").join("cache"), "12345")?;
//!
//! let mut engine = PurgeEngine::new(PurgeConfig::default());
//! let mut log: Vec<PurgeEvent> = Vec::new();
//! let result = engine.run(&[root.path()], &mut log, &CancelToken::new())?;
//!
//! assert_eq!(result.folders_deleted, 1);
//! assert_eq!(result.bytes_freed, 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export core functionality
pub use heretic_core::*;
