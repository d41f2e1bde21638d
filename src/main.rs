use anyhow::Result;

fn main() -> Result<()> {
    heretic_cli::run_cli()
}
