//! Subcommand handlers for list-cameras and config actions.

use std::path::Path;

use super::args::ConfigAction;
use crate::camera::{self, CameraError};
use crate::config::{default_path, Config, ConfigError, DEFAULT_CONFIG};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Config file already exists: {0}")]
    ConfigExists(String),
    #[error("Error writing config file '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// List available cameras and print them to stdout.
pub fn list_cameras() -> Result<(), CommandError> {
    let devices = camera::list_devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
        println!("On macOS, grant access in System Settings > Privacy & Security > Camera.");
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}

/// Handle config subcommand actions. `config` is the effective
/// configuration (file plus command-line overrides).
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<(), CommandError> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            let state = if path.exists() { "exists" } else { "not found" };
            println!("# Config file: {} ({})", path.display(), state);
            println!();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init => {
            if path.exists() {
                return Err(CommandError::ConfigExists(path.display().to_string()));
            }
            write_default(&path)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

fn write_default(path: &Path) -> Result<(), CommandError> {
    let write_err = |source| CommandError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, DEFAULT_CONFIG).map_err(write_err)
}
