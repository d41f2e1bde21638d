use heretic_core::{CancelToken, EventKind, PurgeConfig, PurgeEngine, spawn_purge};
use std::fs;
use tempfile::TempDir;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A throwaway solution with two projects
    let temp_dir = TempDir::new()?;
    for name in ["App", "App.Tests"] {
        let project = temp_dir.path().join(name);
        fs::create_dir_all(project.join("bin").join("Debug"))?;
        fs::create_dir_all(project.join("obj"))?;
        fs::write(project.join(format!("{name}.csproj")), "<Project />")?;
        fs::write(project.join("bin").join("Debug").join(format!("{name}.dll")), vec![0u8; 4096])?;
        fs::write(project.join("obj").join("project.assets.json"), "{}")?;
    }

    let engine = PurgeEngine::new(PurgeConfig::default());
    let handle = spawn_purge(
        engine,
        vec![temp_dir.path().to_path_buf()],
        CancelToken::new(),
    );

    // Events arrive while the worker thread is still deleting
    for event in handle.events().iter() {
        let marker = match event.kind {
            EventKind::Deleted => "+",
            EventKind::Error => "!",
            EventKind::Summary => "=",
            _ => " ",
        };
        println!("{marker} {}", event.message);
    }

    let result = handle.join()?;
    println!("\nstatus: {:?}, freed {}", result.status, result.format_size());

    Ok(())
}
