use std::path::PathBuf;

use clap::{ArgAction, Subcommand};
use snakegrid::{EngineConfig, config};
use tracing::{info, warn};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write a default configuration file
    Init {
        /// Target file (defaults to .snakegrid/config.json)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue, default_value_t = false)]
        force: bool,
    },
    /// Print the effective configuration
    Show {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Update one attribute (matrix, apples, interval-speed, show-renders)
    Set {
        #[arg(long)]
        path: Option<PathBuf>,
        name: String,
        value: String,
    },
}

pub fn run_config(command: ConfigCommand) -> Result<(), String> {
    match command {
        ConfigCommand::Init { path, force } => {
            let path = path.unwrap_or_else(config::default_config_path);
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                ));
            }
            config::save(&path, &EngineConfig::default()).map_err(|e| e.to_string())?;
            info!(path = %path.display(), "wrote default configuration");
            println!("Wrote {}", path.display());
        }
        ConfigCommand::Show { path } => {
            let path = path.unwrap_or_else(config::default_config_path);
            let current = match config::load(&path).map_err(|e| e.to_string())? {
                Some(current) => current,
                None => {
                    warn!(path = %path.display(), "no configuration file; showing defaults");
                    EngineConfig::default()
                }
            };
            let json = serde_json::to_string_pretty(&current).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        ConfigCommand::Set { path, name, value } => {
            let path = path.unwrap_or_else(config::default_config_path);
            let mut current = config::load(&path)
                .map_err(|e| e.to_string())?
                .unwrap_or_default();
            let changed = current
                .apply_attribute(&name, &value)
                .map_err(|e| e.to_string())?;
            if !changed {
                if config::ATTRIBUTES.contains(&name.as_str()) {
                    println!("{} is already {}", name, value);
                } else {
                    warn!(attribute = %name, "ignoring unknown attribute");
                    println!(
                        "Unknown attribute `{}` (expected one of: {})",
                        name,
                        config::ATTRIBUTES.join(", ")
                    );
                }
                return Ok(());
            }
            current.validate().map_err(|e| e.to_string())?;
            config::save(&path, &current).map_err(|e| e.to_string())?;
            println!("Updated {} = {} in {}", name, value, path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("snakegrid-cli-{}-{}", std::process::id(), name))
            .join("config.json")
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let path = scratch("init");
        let _ = std::fs::remove_file(&path);

        run_config(ConfigCommand::Init {
            path: Some(path.clone()),
            force: false,
        })
        .unwrap();
        assert!(
            run_config(ConfigCommand::Init {
                path: Some(path.clone()),
                force: false,
            })
            .is_err()
        );
        run_config(ConfigCommand::Init {
            path: Some(path.clone()),
            force: true,
        })
        .unwrap();
        assert_eq!(config::load(&path).unwrap(), Some(EngineConfig::default()));
    }

    #[test]
    fn set_updates_and_validates() {
        let path = scratch("set");
        let _ = std::fs::remove_file(&path);

        run_config(ConfigCommand::Set {
            path: Some(path.clone()),
            name: "matrix".into(),
            value: "7".into(),
        })
        .unwrap();
        assert_eq!(config::load(&path).unwrap().unwrap().grid_size, 7);

        assert!(
            run_config(ConfigCommand::Set {
                path: Some(path.clone()),
                name: "matrix".into(),
                value: "0".into(),
            })
            .is_err()
        );
        assert!(
            run_config(ConfigCommand::Set {
                path: Some(path.clone()),
                name: "apples".into(),
                value: "lots".into(),
            })
            .is_err()
        );
        assert_eq!(config::load(&path).unwrap().unwrap().grid_size, 7);
    }
}
