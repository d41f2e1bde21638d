use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::warn;

use heretic_core::{
    CancelToken, EventKind, FolderScanner, JsonPathStore, PathStore, PurgeConfig, PurgeEngine,
    PurgeEvent, PurgeResult, RootList, ScanConfig, TargetSet, format_bytes, path_exists, preview,
    spawn_purge,
};

/// Arguments of the purge command
#[derive(Debug)]
struct PurgeCommandArgs {
    roots: Vec<PathBuf>,
    targets: TargetSet,
    case: CaseArg,
    dry_run: bool,
    yes: bool,
    timeout: Option<u64>,
}

#[derive(Parser)]
#[command(name = "heretic")]
#[command(about = "Purge bin and obj build folders from your project roots")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Saved project list to use instead of the one in the user config directory
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Delete build folders beneath the given (or saved) project roots
    Purge {
        /// Project roots; the saved list is used when none are given
        roots: Vec<PathBuf>,

        /// Comma separated folder names to delete
        #[arg(short, long, default_value = "bin,obj")]
        targets: TargetSet,

        /// How folder names are compared
        #[arg(long, value_enum, default_value = "auto")]
        case: CaseArg,

        /// Dry run - show what would be deleted without deleting
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Stop the purge after this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
    /// Count matching folders and estimate their size without deleting
    Preview {
        /// Project roots; the saved list is used when none are given
        roots: Vec<PathBuf>,

        /// Comma separated folder names to look for
        #[arg(short, long, default_value = "bin,obj")]
        targets: TargetSet,

        /// How folder names are compared
        #[arg(long, value_enum, default_value = "auto")]
        case: CaseArg,
    },
    /// Manage the saved list of project roots
    Roots {
        #[command(subcommand)]
        action: RootsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum RootsCommand {
    /// Show saved roots and whether they still exist
    List,
    /// Add one or more existing directories
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove roots from the list
    Remove {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove every saved root
    Clear,
    /// Remove roots that no longer exist
    Prune,
    /// Find project folders under a directory and add them
    Search {
        /// Directory to search
        dir: PathBuf,

        /// Project file extension that marks a project folder
        #[arg(short, long, default_value = "csproj")]
        extension: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CaseArg {
    /// Follow the platform: ignore case on Windows and macOS
    #[value(name = "auto")]
    Auto,
    /// Names must match exactly
    #[value(name = "sensitive")]
    Sensitive,
    /// Ignore case
    #[value(name = "insensitive")]
    Insensitive,
}

impl From<CaseArg> for ScanConfig {
    fn from(arg: CaseArg) -> Self {
        match arg {
            CaseArg::Auto => ScanConfig::default(),
            CaseArg::Sensitive => ScanConfig {
                case_insensitive: false,
            },
            CaseArg::Insensitive => ScanConfig {
                case_insensitive: true,
            },
        }
    }
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Log level from the global flags
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "heretic_core={log_level},heretic_cli={log_level}"
        ))
        .with_writer(io::stderr)
        .init();

    let store = open_store(cli.config)?;

    match cli.command {
        Commands::Purge {
            roots,
            targets,
            case,
            dry_run,
            yes,
            timeout,
        } => handle_purge_command(
            PurgeCommandArgs {
                roots,
                targets,
                case,
                dry_run,
                yes,
                timeout,
            },
            &store,
        ),
        Commands::Preview {
            roots,
            targets,
            case,
        } => handle_preview_command(roots, targets, case, &store),
        Commands::Roots { action } => handle_roots_command(action, &store),
    }
}

fn open_store(config: Option<PathBuf>) -> Result<JsonPathStore> {
    let path = config
        .or_else(JsonPathStore::default_location)
        .context("Could not determine the config directory; pass --config <FILE>")?;
    Ok(JsonPathStore::new(path))
}

/// Explicit roots win; otherwise fall back to the saved list
fn resolve_roots<S: PathStore + ?Sized>(roots: Vec<PathBuf>, store: &S) -> Result<Vec<PathBuf>> {
    if !roots.is_empty() {
        return Ok(roots);
    }

    let saved = RootList::load_from(store).context("Failed to load saved project roots")?;
    if saved.is_empty() {
        anyhow::bail!(
            "No project roots given and none saved. Add some with `heretic roots add <PATH>`."
        );
    }
    Ok(saved.to_path_bufs())
}

fn handle_purge_command<S: PathStore + ?Sized>(args: PurgeCommandArgs, store: &S) -> Result<()> {
    let roots = resolve_roots(args.roots, store)?;
    let config = PurgeConfig {
        targets: args.targets,
        dry_run: args.dry_run,
        scan: args.case.into(),
    };

    display_plan(&roots, &config);

    if !args.yes && !args.dry_run && !confirm_purge(&roots, &config.targets)? {
        println!("Purge cancelled.");
        return Ok(());
    }

    let handle = spawn_purge(PurgeEngine::new(config), roots, CancelToken::new());
    if let Some(seconds) = args.timeout {
        start_watchdog(handle.cancel_token(), Duration::from_secs(seconds));
    }
    let result = handle.wait(&mut |event: PurgeEvent| print_event(&event))?;

    display_purge_result(&result);
    Ok(())
}

/// Trip the cancel token once the wall-clock budget is spent
fn start_watchdog(cancel: CancelToken, budget: Duration) {
    thread::spawn(move || {
        thread::sleep(budget);
        if !cancel.is_cancelled() {
            warn!("Time budget of {:?} exhausted, cancelling purge", budget);
            cancel.cancel();
        }
    });
}

fn handle_preview_command<S: PathStore + ?Sized>(
    roots: Vec<PathBuf>,
    targets: TargetSet,
    case: CaseArg,
    store: &S,
) -> Result<()> {
    let roots = resolve_roots(roots, store)?;
    let stats = preview(&roots, &targets, &case.into());

    println!("Purge Preview:\n");
    for count in &stats.counts {
        println!("  '{}' folders: {}", count.name, count.folders);
    }
    println!("\nTotal folders: {}", stats.total_folders);
    println!("Approximate size: {}", stats.format_size());

    if stats.unreadable_roots > 0 {
        println!(
            "\n{} root(s) could not be read and were skipped.",
            stats.unreadable_roots
        );
    }
    Ok(())
}

fn handle_roots_command<S: PathStore + ?Sized>(action: RootsCommand, store: &S) -> Result<()> {
    match action {
        RootsCommand::List => {
            let saved = RootList::from_paths(store.load()?);
            if saved.is_empty() {
                println!("No saved project roots.");
                return Ok(());
            }

            println!("Project Paths ({}):", saved.len());
            for path in saved.paths() {
                let status = if path_exists(path) { "OK" } else { "Missing" };
                println!("  {:<8} {}", status, path);
            }
        }
        RootsCommand::Add { paths } => {
            let mut list = RootList::load_from(store)?;
            for path in &paths {
                let path = path.to_string_lossy();
                match list.add(&path) {
                    Ok(true) => println!("Added: {path}"),
                    Ok(false) => println!("Already in list: {path}"),
                    Err(e) => println!("Skipped: {e}"),
                }
            }
            list.save_to(store)?;
        }
        RootsCommand::Remove { paths } => {
            let mut list = RootList::from_paths(store.load()?);
            for path in &paths {
                let path = path.to_string_lossy();
                if list.remove(&path) {
                    println!("Removed: {path}");
                } else {
                    println!("Not in list: {path}");
                }
            }
            list.save_to(store)?;
        }
        RootsCommand::Clear => {
            RootList::new().save_to(store)?;
            println!("Cleared all saved project roots.");
        }
        RootsCommand::Prune => {
            let mut list = RootList::from_paths(store.load()?);
            let removed = list.remove_invalid();
            list.save_to(store)?;
            println!("Removed {removed} invalid path(s)");
        }
        RootsCommand::Search { dir, extension } => {
            handle_search(&dir, &extension, store)?;
        }
    }
    Ok(())
}

fn handle_search<S: PathStore + ?Sized>(dir: &Path, extension: &str, store: &S) -> Result<()> {
    let scanner = FolderScanner::default();
    let found = scanner
        .search_projects(dir, extension)
        .with_context(|| format!("Error searching for projects in {}", dir.display()))?;

    if found.is_empty() {
        println!("No .{} files found in {}.", extension.trim_start_matches('.'), dir.display());
        return Ok(());
    }

    let mut list = RootList::load_from(store)?;
    let (added, skipped) = list.extend_paths(&found);
    list.save_to(store)?;

    println!("Found {} project(s)", found.len());
    println!("Added: {added}");
    println!("Already in list: {skipped}");
    Ok(())
}

fn display_plan(roots: &[PathBuf], config: &PurgeConfig) {
    let action = if config.dry_run { "Dry run" } else { "Purging" };
    println!(
        "{} '{}' folders in {} project root(s):",
        action,
        config.targets.names().join("', '"),
        roots.len()
    );
    for root in roots {
        println!("  {}", root.display());
    }
    println!();
}

fn confirm_purge(roots: &[PathBuf], targets: &TargetSet) -> Result<bool> {
    print!(
        "This will permanently delete all '{}' folders under {} root(s). Continue? [y/N]: ",
        targets.names().join("', '"),
        roots.len()
    );

    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    let answer = input.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

fn print_event(event: &PurgeEvent) {
    if let Some(line) = format_event(event) {
        println!("{line}");
    }
}

fn format_event(event: &PurgeEvent) -> Option<String> {
    let line = match event.kind {
        _ if event.is_root_header() => format!("\n=== {} ===", event.message),
        EventKind::Info | EventKind::Found => format!("  {}", event.message),
        EventKind::Deleted => format!("    ✓ {}", event.message),
        EventKind::Skipped => format!("    - {}", event.message),
        EventKind::Error => format!("    ✗ {}", event.message),
        // Printed by display_purge_result
        EventKind::Summary => return None,
    };
    Some(line)
}

fn display_purge_result(result: &PurgeResult) {
    println!("\n{}", result.completion_message());

    if result.dry_run {
        println!("  • Folders that would be deleted: {}", result.folders_skipped);
    } else {
        println!("  • Folders deleted: {}", result.folders_deleted);
    }
    println!("  • Errors encountered: {}", result.errors);

    if result.dry_run && result.bytes_reclaimable > 0 {
        println!(
            "  • Approximate space reclaimable: {}",
            format_bytes(result.bytes_reclaimable)
        );
    } else if result.bytes_freed > 0 {
        println!(
            "  • Approximate space freed: {}",
            format_bytes(result.bytes_freed)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parse_purge_command() {
        let args = vec![
            "heretic",
            "purge",
            "/src/a",
            "/src/b",
            "--targets",
            "obj",
            "--dry-run",
            "--yes",
            "--timeout",
            "30",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Purge {
                roots,
                targets,
                dry_run,
                yes,
                timeout,
                ..
            } => {
                assert_eq!(roots, vec![PathBuf::from("/src/a"), PathBuf::from("/src/b")]);
                assert_eq!(targets.names(), &["obj".to_string()]);
                assert!(dry_run);
                assert!(yes);
                assert_eq!(timeout, Some(30));
            }
            _ => panic!("Expected Purge command"),
        }
    }

    #[test]
    fn test_cli_purge_defaults() {
        let cli = Cli::try_parse_from(["heretic", "purge"]).unwrap();

        match cli.command {
            Commands::Purge {
                roots,
                targets,
                case,
                dry_run,
                yes,
                timeout,
            } => {
                assert!(roots.is_empty());
                assert_eq!(targets, TargetSet::default());
                assert!(matches!(case, CaseArg::Auto));
                assert!(!dry_run);
                assert!(!yes);
                assert!(timeout.is_none());
            }
            _ => panic!("Expected Purge command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_targets() {
        assert!(Cli::try_parse_from(["heretic", "purge", "--targets", ","]).is_err());
        assert!(Cli::try_parse_from(["heretic", "purge", "--targets", "a/b"]).is_err());
    }

    #[test]
    fn test_cli_parse_roots_commands() {
        let cli = Cli::try_parse_from(["heretic", "--config", "/tmp/c.json", "roots", "add", "/x"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        match cli.command {
            Commands::Roots {
                action: RootsCommand::Add { paths },
            } => assert_eq!(paths, vec![PathBuf::from("/x")]),
            _ => panic!("Expected roots add"),
        }

        let cli = Cli::try_parse_from(["heretic", "roots", "search", "/src"]).unwrap();
        match cli.command {
            Commands::Roots {
                action: RootsCommand::Search { dir, extension },
            } => {
                assert_eq!(dir, PathBuf::from("/src"));
                assert_eq!(extension, "csproj");
            }
            _ => panic!("Expected roots search"),
        }

        assert!(Cli::try_parse_from(["heretic", "roots", "add"]).is_err());
    }

    #[test]
    fn test_case_arg_conversion() {
        assert!(!ScanConfig::from(CaseArg::Sensitive).case_insensitive);
        assert!(ScanConfig::from(CaseArg::Insensitive).case_insensitive);
        assert_eq!(
            ScanConfig::from(CaseArg::Auto).case_insensitive,
            ScanConfig::default().case_insensitive
        );
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn test_resolve_roots_prefers_explicit() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = JsonPathStore::new(temp_dir.path().join("config.json"));

        let explicit = vec![PathBuf::from("/given")];
        assert_eq!(resolve_roots(explicit.clone(), &store)?, explicit);

        // Nothing saved yet
        assert!(resolve_roots(Vec::new(), &store).is_err());

        store.save(&[temp_dir.path().to_string_lossy().to_string()])?;
        assert_eq!(
            resolve_roots(Vec::new(), &store)?,
            vec![temp_dir.path().to_path_buf()]
        );
        Ok(())
    }

    #[test]
    fn test_roots_add_prune_and_clear() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = JsonPathStore::new(temp_dir.path().join("config.json"));
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir_all(&a)?;
        fs::create_dir_all(&b)?;

        handle_roots_command(
            RootsCommand::Add {
                paths: vec![a.clone(), b.clone(), temp_dir.path().join("missing")],
            },
            &store,
        )?;
        assert_eq!(store.load()?.len(), 2);

        fs::remove_dir_all(&b)?;
        handle_roots_command(RootsCommand::Prune, &store)?;
        assert_eq!(store.load()?, vec![a.to_string_lossy().to_string()]);

        handle_roots_command(RootsCommand::Clear, &store)?;
        assert!(store.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_roots_search_adds_project_dirs() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = JsonPathStore::new(temp_dir.path().join("config.json"));
        let src = temp_dir.path().join("src");
        for name in ["Api", "Web"] {
            let project = src.join(name);
            fs::create_dir_all(&project)?;
            fs::write(project.join(format!("{name}.csproj")), "<Project />")?;
        }

        handle_roots_command(
            RootsCommand::Search {
                dir: src.clone(),
                extension: "csproj".to_string(),
            },
            &store,
        )?;

        let saved = store.load()?;
        assert_eq!(saved.len(), 2);
        assert!(saved.iter().any(|p| p.ends_with("Api")));
        Ok(())
    }

    #[test]
    fn test_purge_command_end_to_end() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = JsonPathStore::new(temp_dir.path().join("config.json"));
        let project = temp_dir.path().join("App");
        fs::create_dir_all(project.join("bin").join("Debug"))?;
        fs::create_dir_all(project.join("obj"))?;
        fs::write(project.join("bin").join("Debug").join("App.dll"), "dll")?;

        handle_purge_command(
            PurgeCommandArgs {
                roots: vec![project.clone()],
                targets: TargetSet::default(),
                case: CaseArg::Sensitive,
                dry_run: false,
                yes: true,
                timeout: None,
            },
            &store,
        )?;

        assert!(!project.join("bin").exists());
        assert!(!project.join("obj").exists());
        Ok(())
    }

    #[test]
    fn test_format_event_marks_root_headers() {
        let root = Path::new("/src/App");
        let header = format_event(&PurgeEvent::root_started(1, 2, root));
        assert_eq!(
            header.as_deref(),
            Some(format!("\n=== Project 1/2: {} ===", root.display()).as_str())
        );

        let plain = format_event(&PurgeEvent::info("Project notes"));
        assert_eq!(plain.as_deref(), Some("  Project notes"));

        let summary = PurgeEvent::new(EventKind::Summary, "done");
        assert_eq!(format_event(&summary), None);
    }

    #[test]
    fn test_purge_command_dry_run_keeps_folders() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = JsonPathStore::new(temp_dir.path().join("config.json"));
        let project = temp_dir.path().join("App");
        fs::create_dir_all(project.join("bin"))?;
        fs::write(project.join("bin").join("App.dll"), "dll")?;

        handle_purge_command(
            PurgeCommandArgs {
                roots: vec![project.clone()],
                targets: TargetSet::default(),
                case: CaseArg::Sensitive,
                dry_run: true,
                yes: false,
                timeout: Some(60),
            },
            &store,
        )?;

        assert!(project.join("bin").join("App.dll").exists());
        Ok(())
    }

    #[test]
    fn test_preview_command_keeps_folders() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = JsonPathStore::new(temp_dir.path().join("config.json"));
        let project = temp_dir.path().join("App");
        fs::create_dir_all(project.join("bin"))?;

        handle_preview_command(
            vec![project.clone()],
            TargetSet::default(),
            CaseArg::Sensitive,
            &store,
        )?;
        assert!(project.join("bin").exists());
        Ok(())
    }
}
