//! Command-line interface

pub mod commands;
pub mod output;

use crate::core::config::PLUGIN_NAME;
use crate::core::env::{EnvSource, BUILDKITE_PLUGINS};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{RenderCommand, UploadCommand, ValidateCommand};
use std::ffi::OsString;

/// Generate a Buildkite pipeline from monorepo-diff plugin configuration
#[derive(Debug, Parser, Clone)]
#[command(name = "monorepo-diff")]
#[command(author = "monorepo-diff Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Turns monorepo-diff plugin configuration into a Buildkite pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Plugin identity prefix used to find the configuration block
    #[arg(short, long, global = true, default_value = PLUGIN_NAME)]
    pub plugin: String,

    /// Path to a plugins JSON document (defaults to $BUILDKITE_PLUGINS)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Validate the plugin configuration
    Validate(ValidateCommand),

    /// Render the pipeline YAML for watch rules
    Render(RenderCommand),

    /// Print the pipeline upload command
    UploadCommand(UploadCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// Read the plugins document from `--config` or `$BUILDKITE_PLUGINS`
    pub fn read_document(&self, env: &dyn EnvSource) -> Result<String> {
        match &self.config {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read plugins document {}", path)),
            None => {
                let document = env.var(BUILDKITE_PLUGINS, "");
                if document.trim().is_empty() {
                    anyhow::bail!("{} is not set and no --config file was given", BUILDKITE_PLUGINS);
                }
                Ok(document)
            }
        }
    }
}
