mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use intellifire_config::{ConfigError, Profile, load_config_at, profile_to_fireplace_config, select_profile};
use intellifire_core::FireplaceConfig;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.quiet);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the network.
        Command::Config { action } => commands::config_cmd::handle(action, &cli.global),

        cmd => {
            let config = build_fireplace_config(&cli.global)?;
            let connected = intellifire_core::connect(&config).await?;

            for warning in &connected.warnings {
                tracing::warn!("{warning}");
            }
            if let Some(ref recovered) = connected.recovered {
                tracing::info!(
                    serial = %recovered.serial,
                    "recovered local credentials from the cloud; store api_key/user_id \
                     in your profile to allow cloud-free startup"
                );
            }

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &connected.coordinator, &cli.global).await;
            connected.coordinator.shutdown().await;
            result
        }
    }
}

/// Build a `FireplaceConfig` from the config file, profile, and CLI overrides.
fn build_fireplace_config(global: &GlobalOpts) -> Result<FireplaceConfig, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(intellifire_config::config_path);
    let config = load_config_at(&path)?;

    let mut fireplace = match select_profile(&config, global.fireplace.as_deref()) {
        Ok((name, profile)) => {
            tracing::debug!(profile = name, "using fireplace profile");
            profile_to_fireplace_config(profile, &config.defaults)?
        }
        // No profiles at all -- flags/env may still describe a fireplace.
        Err(ConfigError::NoProfiles) => {
            let host = global.host.clone().ok_or(CliError::NoConfig)?;
            let profile = Profile {
                host,
                username: global.username.clone(),
                ..Profile::default()
            };
            profile_to_fireplace_config(&profile, &config.defaults)?
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(ref host) = global.host {
        fireplace.host.clone_from(host);
    }
    if let Some(ref username) = global.username {
        fireplace.username = Some(username.clone());
    }
    Ok(fireplace)
}
