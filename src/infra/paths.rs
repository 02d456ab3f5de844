// src/infra/paths.rs — Path management
//
// All paths respect the IDEAFORGE_HOME environment variable for isolation.
// When IDEAFORGE_HOME is set, config and state live under that directory.
// When unset, config uses ~/.ideaforge/ and state uses XDG_DATA_HOME/ideaforge.
// The seed file is resolved relative to the working directory by default,
// since it is produced by whatever upstream process shortlisted the ideas.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Default seed file, relative to the working directory.
pub const DEFAULT_SEED_FILE: &str = "data/seed_candidates.jsonl";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "ideaforge")
}

/// Returns the IDEAFORGE_HOME override, if set.
fn ideaforge_home() -> Option<PathBuf> {
    std::env::var_os("IDEAFORGE_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory when it cannot be determined.
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $IDEAFORGE_HOME/ or ~/.ideaforge/
pub fn config_dir() -> PathBuf {
    if let Some(home) = ideaforge_home() {
        return home;
    }
    dirs_home().join(".ideaforge")
}

/// Data directory: $IDEAFORGE_HOME/data/ or ~/.local/share/ideaforge/
pub fn data_dir() -> PathBuf {
    if let Some(home) = ideaforge_home() {
        return home.join("data");
    }
    project_dirs()
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Generation document: $IDEAFORGE_STATE_FILE, else <data_dir>/state/state.json
pub fn state_file_path() -> PathBuf {
    if let Some(p) = std::env::var_os("IDEAFORGE_STATE_FILE") {
        return PathBuf::from(p);
    }
    data_dir().join("state").join("state.json")
}

/// Seed file: $IDEAFORGE_SEED_FILE, else `data/seed_candidates.jsonl` in the working directory.
pub fn seed_file_path() -> PathBuf {
    std::env::var_os("IDEAFORGE_SEED_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_FILE))
}
