use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use heretic_core::{
    CancelToken, FolderScanner, PurgeConfig, PurgeEngine, PurgeEvent, ScanConfig, TargetSet,
    directory_size, preview,
};
use std::fs;
use std::hint::black_box;
use std::path::Path;
use tempfile::TempDir;

/// A project with bin/ and obj/ output plus some source files
fn create_test_project(base_path: &Path, name: &str) -> anyhow::Result<()> {
    let project_path = base_path.join(name);
    let src_dir = project_path.join("src");
    fs::create_dir_all(&src_dir)?;
    fs::write(
        project_path.join(format!("{name}.csproj")),
        r#"<Project Sdk="Microsoft.NET.Sdk"></Project>"#,
    )?;
    for i in 0..5 {
        fs::write(src_dir.join(format!("File{i}.cs")), "class C {}")?;
    }

    let output_dir = project_path.join("bin").join("Debug").join("net8.0");
    fs::create_dir_all(&output_dir)?;
    for i in 0..10 {
        let content = "x".repeat(1024 * (i + 1));
        fs::write(output_dir.join(format!("Dep{i}.dll")), &content)?;
    }

    let obj_dir = project_path.join("obj").join("Debug");
    fs::create_dir_all(&obj_dir)?;
    for i in 0..5 {
        fs::write(obj_dir.join(format!("cache_{i}.cache")), "cache".repeat(512))?;
    }

    Ok(())
}

fn create_multiple_projects(base_path: &Path, count: usize) -> anyhow::Result<()> {
    for i in 0..count {
        create_test_project(base_path, &format!("Project{i:03}"))?;
    }
    Ok(())
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_bin_folders");

    for count in [10, 50, 100] {
        let temp_dir = TempDir::new().unwrap();
        create_multiple_projects(temp_dir.path(), count).unwrap();
        let scanner = FolderScanner::default();

        group.bench_function(format!("{count}_projects"), |b| {
            b.iter(|| {
                let found = scanner
                    .find_matching_directories(black_box(temp_dir.path()), "bin")
                    .unwrap();
                black_box(found);
            })
        });
    }

    group.finish();
}

fn bench_directory_size(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    create_multiple_projects(temp_dir.path(), 20).unwrap();

    c.bench_function("directory_size_20_projects", |b| {
        b.iter(|| black_box(directory_size(black_box(temp_dir.path()))))
    });
}

fn bench_preview(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    create_multiple_projects(temp_dir.path(), 50).unwrap();
    let targets = TargetSet::default();
    let config = ScanConfig::default();

    c.bench_function("preview_50_projects", |b| {
        b.iter(|| black_box(preview(&[temp_dir.path()], &targets, &config)))
    });
}

fn bench_purge_dry_run(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    create_multiple_projects(temp_dir.path(), 20).unwrap();

    let config = PurgeConfig {
        dry_run: true,
        ..Default::default()
    };
    let mut engine = PurgeEngine::new(config);

    c.bench_function("purge_20_projects_dry_run", |b| {
        b.iter(|| {
            let result = engine
                .run(
                    &[temp_dir.path()],
                    &mut |_e: PurgeEvent| {},
                    &CancelToken::new(),
                )
                .unwrap();
            black_box(result);
        })
    });
}

fn bench_purge_delete(c: &mut Criterion) {
    c.bench_function("purge_10_projects_delete", |b| {
        b.iter_batched(
            || {
                let temp_dir = TempDir::new().unwrap();
                create_multiple_projects(temp_dir.path(), 10).unwrap();
                temp_dir
            },
            |temp_dir| {
                let mut engine = PurgeEngine::default();
                let result = engine
                    .run(
                        &[temp_dir.path()],
                        &mut |_e: PurgeEvent| {},
                        &CancelToken::new(),
                    )
                    .unwrap();
                black_box(result);
            },
            BatchSize::PerIteration,
        )
    });
}

criterion_group!(
    benches,
    bench_scan,
    bench_directory_size,
    bench_preview,
    bench_purge_dry_run,
    bench_purge_delete
);
criterion_main!(benches);
