//! `firectl config` -- init/show/path, no fireplace connection needed.

use std::path::PathBuf;

use intellifire_config::{Config, load_config_at, sample_config, save_config_at};

use crate::cli::{ConfigAction, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub fn handle(action: ConfigAction, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_file(global);
    match action {
        ConfigAction::Init => {
            if path.exists() {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("config already exists at {}", path.display()),
                });
            }
            save_config_at(&sample_config(), &path)?;
            println!("wrote starter config to {}", path.display());
            println!("edit it, then run: firectl status");
            Ok(())
        }
        ConfigAction::Show => {
            let config = redact(load_config_at(&path)?);
            match global.output {
                OutputFormat::Text => {
                    let rendered = toml::to_string_pretty(&config).map_err(|e| {
                        CliError::Validation {
                            field: "config".into(),
                            reason: e.to_string(),
                        }
                    })?;
                    print!("{rendered}");
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
            }
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(intellifire_config::config_path)
}

/// Secrets never hit stdout.
fn redact(mut config: Config) -> Config {
    for profile in config.fireplaces.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("<redacted>".to_owned());
        }
        if profile.api_key.is_some() {
            profile.api_key = Some("<redacted>".to_owned());
        }
    }
    config
}
