use crate::cli::ConfigAction;
use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// `config show|init|set` against the file at `path`
pub fn handle_config_action(action: ConfigAction, path: &Path, json_output: bool) -> Result<()> {
    match action {
        ConfigAction::Init => {
            Config::default()
                .save_to(path)
                .context("Failed to initialize config")?;
            if json_output {
                let body = serde_json::json!({
                    "status": "success",
                    "message": "Configuration initialized successfully",
                    "path": path.display().to_string(),
                });
                println!("{}", body);
            } else {
                println!("Configuration initialized at: {}", path.display());
            }
        }
        ConfigAction::Show => {
            let config = Config::load_from(path).context("Failed to load config")?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config")?;
                println!("Configuration ({})", path.display());
                println!("{}", toml_str);
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(path).context("Failed to load config")?;
            config
                .set_value(&key, &value)
                .context("Invalid configuration")?;
            config.save_to(path).context("Failed to save config")?;
            if json_output {
                let body = serde_json::json!({
                    "status": "success",
                    "message": format!("Configuration updated: {} = {}", key, value),
                });
                println!("{}", body);
            } else {
                println!("Configuration updated: {} = {}", key, value);
            }
        }
    }
    Ok(())
}
