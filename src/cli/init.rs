// src/cli/init.rs — First-time setup: default config and directories

use std::path::Path;

use crate::infra::config::Config;
use crate::infra::paths;

/// Write a default config file and create the state directory.
pub async fn run_init(config: &Config, config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("ideaforge setup");
    println!();

    let default_path = paths::config_file_path();
    let path = config_path.unwrap_or(&default_path);

    let overwrite = if path.exists() {
        inquire::Confirm::new("Config already exists. Overwrite with defaults?")
            .with_default(false)
            .with_help_message(&format!("Writes to {}", path.display()))
            .prompt()
            .unwrap_or(false)
    } else {
        true
    };

    if overwrite {
        eprint!("  Writing config... ");
        write_default_config(path)?;
        eprintln!("done");
        println!("  Config:   {}", path.display());
    } else {
        println!("  Config:   {} (kept)", path.display());
    }

    let state = config.storage.state_path();
    if let Some(dir) = state.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    println!("  Document: {}", state.display());

    let seed = config.storage.seed_path();
    if seed.exists() {
        println!("  Seed:     {}", seed.display());
    } else {
        println!("  Seed:     {} (missing)", seed.display());
        println!();
        println!("  Add one JSON candidate per line, or let a model draft some:");
        println!("    ideaforge draft --count 10");
    }

    println!();
    println!("Tips:");
    println!("  ideaforge              Run the generation loop");
    println!("  ideaforge status       Show the current generation");

    Ok(())
}

/// Serialize the default config to `path`, creating parent directories.
pub fn write_default_config(path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    tracing::info!("Wrote default config to {}", path.display());
    Ok(())
}
