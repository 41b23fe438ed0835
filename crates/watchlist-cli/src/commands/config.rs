use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;
use watchlist_config::{Config, PathManager, StorageBackend};

pub fn run_config(
    cmd: crate::ConfigCommands,
    config: &Config,
    config_file: &Path,
    path_manager: &PathManager,
    output: &Output,
) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show => show_config(config, config_file, path_manager, output),
        crate::ConfigCommands::Init { force } => init_config(config_file, path_manager, force, output),
        crate::ConfigCommands::Path => {
            match output.format() {
                OutputFormat::Human => println!("{}", config_file.display()),
                OutputFormat::Json | OutputFormat::JsonPretty => {
                    output.json(&json!({ "config_file": config_file.display().to_string() }));
                }
            }
            Ok(())
        }
    }
}

fn backend_name(backend: StorageBackend) -> &'static str {
    match backend {
        StorageBackend::File => "file",
        StorageBackend::Memory => "memory",
    }
}

fn show_config(config: &Config, config_file: &Path, path_manager: &PathManager, output: &Output) -> Result<()> {
    let storage_dir = config.storage_dir(path_manager);
    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|p| p.display().to_string());

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            println!("\n{}", "Configuration".bright_cyan().bold());
            if !config_file.exists() {
                output.warn(format!("No config file at {}, showing defaults", config_file.display()));
            }

            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
            ]);
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            table.add_row(vec![Cell::new("Config File"), Cell::new(config_file.display().to_string())]);
            table.add_row(vec![Cell::new("Storage Backend"), Cell::new(backend_name(config.storage.backend))]);
            table.add_row(vec![Cell::new("Storage Key"), Cell::new(&config.storage.key)]);
            table.add_row(vec![Cell::new("Storage Directory"), Cell::new(storage_dir.display().to_string())]);
            table.add_row(vec![Cell::new("Log Level"), Cell::new(&config.logging.level)]);
            table.add_row(vec![Cell::new("JSON Logs"), Cell::new(config.logging.json.to_string())]);
            table.add_row(vec![Cell::new("Log File"), Cell::new(log_file.as_deref().unwrap_or("stderr"))]);
            println!("{}", table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "config_file_exists": config_file.exists(),
                "storage": {
                    "backend": backend_name(config.storage.backend),
                    "key": config.storage.key,
                    "dir": storage_dir.display().to_string(),
                },
                "logging": {
                    "level": config.logging.level,
                    "json": config.logging.json,
                    "file": log_file,
                }
            }));
        }
    }

    Ok(())
}

/// Write a default config that logs to the managed log file, and lay out the directories it refers to
fn init_config(config_file: &Path, path_manager: &PathManager, force: bool, output: &Output) -> Result<()> {
    if config_file.exists() && !force {
        output.warn(format!(
            "Config file already exists at {}. Use --force to overwrite it.",
            config_file.display()
        ));
        return Ok(());
    }

    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create watchlist directories: {}", e))?;

    let mut config = Config::default();
    config.logging.file = Some(path_manager.log_file());
    config
        .save_to_file(config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}
