//! monorepo-diff - turns monorepo-diff plugin configuration into a Buildkite pipeline

pub mod cli;
pub mod core;

// Re-export commonly used types
pub use crate::core::{ConfigError, EnvSource, MapEnv, Pipeline, PluginConfig, ProcessEnv, Step, StepKind};
