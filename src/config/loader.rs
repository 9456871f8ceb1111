use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::core::AppConfig;

const CONFIG_FILE: &str = "texquad.toml";

/// Reads the config at `path`, writing the defaults there first if the
/// file does not exist yet.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    if !path.exists() {
        let default_config = AppConfig::default();
        let toml_content = toml::to_string_pretty(&default_config)?;
        fs::write(path, toml_content).context("Failed to write default config")?;
        return Ok(default_config);
    }

    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

pub fn load_or_create_config() -> Result<AppConfig> {
    load_config(&get_config_path()?)
}

fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "MetroManDevTeam", "texquad")
        .context("Couldn't determine project directory")?;
    Ok(proj_dirs.config_dir().join(CONFIG_FILE))
}
