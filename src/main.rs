mod cli;
mod core;

use anyhow::{Context, Result};
use cli::commands::{RenderCommand, UploadCommand, ValidateCommand};
use cli::output::*;
use cli::{Cli, Command};
use crate::core::{Pipeline, PluginConfig, ProcessEnv};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::from_args();

    let env = ProcessEnv;
    let document = cli.read_document(&env)?;
    let config = match PluginConfig::locate(&document, &cli.plugin, &env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Failed to load plugin configuration:", CROSS);
            eprintln!("  {}", style(&e).red());
            std::process::exit(1);
        }
    };

    init_logging(cli.verbose, &config)?;
    debug!("Diff command: {}", config.diff_command());

    // Execute command
    match &cli.command {
        Command::Validate(cmd) => validate_config(cmd, &config)?,
        Command::Render(cmd) => render_pipeline(cmd, &config)?,
        Command::UploadCommand(cmd) => print_upload_command(cmd, &config),
    }

    Ok(())
}

/// Install the log subscriber
///
/// `RUST_LOG` takes precedence, then `--verbose`, then the configured
/// `log_level`. Logs go to stderr so stdout carries only the pipeline.
fn init_logging(verbose: bool, config: &PluginConfig) -> Result<()> {
    let configured = config.tracing_level();
    let level = if verbose {
        Level::DEBUG
    } else {
        configured.unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    if configured.is_none() {
        warn!("Unknown log_level '{}', using info", config.log_level);
    }

    Ok(())
}

fn validate_config(cmd: &ValidateCommand, config: &PluginConfig) -> Result<()> {
    eprintln!("{} Plugin configuration is valid!", CHECK);
    eprintln!("{}", format_config_summary(config));

    if cmd.json {
        let json = serde_json::to_string_pretty(config)?;
        println!("{}", json);
    }

    Ok(())
}

fn render_pipeline(cmd: &RenderCommand, config: &PluginConfig) -> Result<()> {
    let rules = cmd.select_rules(config)?;
    let pipeline = Pipeline::from_rules(config, rules.iter().copied());
    let yaml = pipeline
        .to_yaml()
        .context("Failed to serialize pipeline")?;

    info!(
        "Generated {} step(s) from {} watch rule(s)",
        pipeline.len(),
        rules.len()
    );

    match &cmd.output {
        Some(path) => {
            std::fs::write(path, &yaml)
                .with_context(|| format!("Failed to write pipeline to {}", path))?;
            eprintln!("{} Pipeline written to {}", INFO, style(path).bold());
        }
        None => print!("{}", yaml),
    }

    Ok(())
}

fn print_upload_command(cmd: &UploadCommand, config: &PluginConfig) {
    println!("{}", cmd.command_line(config));
}
