//! Plugin configuration from the plugins document
//!
//! The CI agent passes every plugin's configuration as one JSON array of
//! single-key objects. [`PluginConfig::locate`] finds this plugin's block
//! and normalizes it: defaults are applied, union-shaped fields resolved and
//! top-level env merged into each watch rule.

use crate::core::decode::{lenient, lenient_items};
use crate::core::env::EnvSource;
use crate::core::error::{ConfigError, ConfigResult};
use crate::core::shape::{resolve_env, resolve_paths};
use crate::core::step::{RawStep, Step};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, Level};

/// Identity prefix of this plugin's configuration block
pub const PLUGIN_NAME: &str = "github.com/chronotc/monorepo-diff";

pub const DEFAULT_DIFF_COMMAND: &str = "git diff --name-only HEAD~1";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Plugin block as written in the plugins document
///
/// Every field is optional; absent, `null` and wrong-typed values keep the
/// default from [`PluginConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawPluginConfig {
    #[serde(deserialize_with = "lenient")]
    diff: Option<String>,
    #[serde(deserialize_with = "lenient")]
    wait: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    log_level: Option<String>,
    #[serde(deserialize_with = "lenient")]
    interpolation: Option<bool>,
    #[serde(deserialize_with = "lenient_items")]
    hooks: Option<Vec<HookConfig>>,
    #[serde(deserialize_with = "lenient_items")]
    watch: Option<Vec<RawWatchRule>>,
    env: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawWatchRule {
    path: Value,
    #[serde(deserialize_with = "lenient")]
    config: Option<RawStep>,
}

/// Normalized plugin configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginConfig {
    /// Command that lists changed files
    pub diff: String,

    /// Append a `wait` step after the generated steps
    pub wait: bool,

    pub log_level: String,

    /// Whether the uploaded pipeline is interpolated by the agent
    pub interpolation: bool,

    /// Commands appended to the pipeline after the watch steps
    pub hooks: Vec<HookConfig>,

    pub watch: Vec<WatchRule>,

    /// Top-level env, already merged into every watch rule
    pub env: BTreeMap<String, String>,
}

/// A hook command run after the generated steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub command: String,
}

/// Paths to watch and the step to run when they change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchRule {
    pub paths: Vec<String>,
    pub step: Step,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            diff: DEFAULT_DIFF_COMMAND.to_string(),
            wait: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            interpolation: true,
            hooks: Vec::new(),
            watch: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

impl PluginConfig {
    /// Find the block for `plugin` in a plugins document and normalize it
    ///
    /// Objects are scanned in order, and keys within each object in document
    /// order. The first key starting with `plugin` is used; later matches
    /// are ignored.
    pub fn locate(document: &str, plugin: &str, env: &dyn EnvSource) -> ConfigResult<Self> {
        let plugins: Vec<Map<String, Value>> = serde_json::from_str(document)?;

        let mut matches = plugins
            .iter()
            .flat_map(|entry| entry.iter())
            .filter(|(key, _)| key.starts_with(plugin));

        let (key, block) = matches
            .next()
            .ok_or_else(|| ConfigError::ConfigNotFound(plugin.to_string()))?;

        let ignored = matches.count();
        if ignored > 0 {
            debug!("Ignoring {} additional configuration block(s) for {}", ignored, plugin);
        }

        debug!("Using configuration block '{}'", key);
        Self::from_block(block, env)
    }

    /// Normalize a single plugin configuration block
    pub fn from_block(block: &Value, env: &dyn EnvSource) -> ConfigResult<Self> {
        let raw = if block.is_null() {
            RawPluginConfig::default()
        } else {
            RawPluginConfig::deserialize(block)?
        };
        Self::from_raw(raw, env)
    }

    fn from_raw(raw: RawPluginConfig, env: &dyn EnvSource) -> ConfigResult<Self> {
        let defaults = Self::default();
        let global_env = resolve_env(&raw.env, "env", env)?;

        let watch = raw
            .watch
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, rule)| WatchRule::from_raw(rule, index, &global_env, env))
            .collect::<ConfigResult<Vec<_>>>()?;

        let hooks: Vec<HookConfig> = raw
            .hooks
            .unwrap_or_default()
            .into_iter()
            .filter(|hook| {
                if hook.command.is_empty() {
                    debug!("Skipping hook without a command");
                }
                !hook.command.is_empty()
            })
            .collect();

        debug!("Loaded {} watch rule(s), {} hook(s)", watch.len(), hooks.len());

        Ok(Self {
            diff: raw.diff.unwrap_or(defaults.diff),
            wait: raw.wait.unwrap_or(defaults.wait),
            log_level: raw.log_level.unwrap_or(defaults.log_level),
            interpolation: raw.interpolation.unwrap_or(defaults.interpolation),
            hooks,
            watch,
            env: global_env,
        })
    }

    /// Command used to list changed files
    pub fn diff_command(&self) -> &str {
        &self.diff
    }

    /// Arguments for the agent's pipeline upload command
    pub fn upload_args(&self) -> Vec<&'static str> {
        let mut args = vec!["pipeline", "upload"];
        if !self.interpolation {
            args.push("--no-interpolation");
        }
        args
    }

    /// Configured log level, if it names a known level
    pub fn tracing_level(&self) -> Option<Level> {
        self.log_level.parse().ok()
    }
}

impl WatchRule {
    fn from_raw(
        raw: RawWatchRule,
        index: usize,
        global_env: &BTreeMap<String, String>,
        env: &dyn EnvSource,
    ) -> ConfigResult<Self> {
        let paths = resolve_paths(&raw.path, index)?;

        let mut step = Step::from_raw(raw.config.unwrap_or_default(), index, env)?;
        step.merge_env(global_env);
        step.apply_build_fallback(env);

        Ok(Self { paths, step })
    }
}
