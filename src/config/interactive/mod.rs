
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};
use std::path::Path;

use super::{Config, LoggingConfig, ServerConfig};

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Starter MCP Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir)?;

    eprintln!("{}", style("Server").bold().yellow());
    configure_server(&mut config.server)?;

    eprintln!();
    eprintln!("{}", style("Logging").bold().yellow());
    eprintln!("Uses tracing filter syntax; RUST_LOG overrides it at runtime.");
    configure_logging(&mut config.logging)?;

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Server Settings:").bold().yellow());
    eprintln!("  Name: {}", style(&config.server.name).cyan());
    match config.instructions() {
        Some(instructions) => eprintln!("  Instructions: {}", style(instructions).cyan()),
        None => eprintln!("  Instructions: {}", style("none").dim()),
    }

    eprintln!();
    eprintln!("{}", style("Logging Settings:").bold().yellow());
    eprintln!("  Filter: {}", style(&config.logging.filter).cyan());
    if let Ok(env) = std::env::var("RUST_LOG") {
        eprintln!("  RUST_LOG override: {}", style(env).cyan());
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    if config_dir.join("config.toml").exists() {
        let config = Config::load(config_dir)?;
        eprintln!("{}", style("Found existing configuration.").green());
        Ok(config)
    } else {
        eprintln!(
            "{}",
            style("No existing configuration found. Using defaults.").yellow()
        );
        Config::load(config_dir)
    }
}

fn configure_server(server: &mut ServerConfig) -> Result<()> {
    let name: String = Input::new()
        .with_prompt("Server name")
        .default(server.name.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Server name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let instructions: String = Input::new()
        .with_prompt("Instructions for clients (blank for none)")
        .default(server.instructions.clone())
        .allow_empty(true)
        .interact_text()?;

    server.set_name(name)?;
    server.instructions = instructions;

    Ok(())
}

fn configure_logging(logging: &mut LoggingConfig) -> Result<()> {
    let filter: String = Input::new()
        .with_prompt("Log filter")
        .default(logging.filter.clone())
        .validate_with(|input: &String| -> Result<(), String> {
            LoggingConfig::default()
                .set_filter(input.clone())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    logging.set_filter(filter)?;

    Ok(())
}
