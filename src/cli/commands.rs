//! CLI command definitions

use crate::core::config::{PluginConfig, WatchRule};
use anyhow::Result;
use clap::Args;

/// Validate the plugin configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output the normalized configuration as JSON
    #[arg(long)]
    pub json: bool,
}

/// Render the pipeline YAML
#[derive(Debug, Args, Clone)]
pub struct RenderCommand {
    /// Index of a watch rule to include (repeatable; all rules when omitted)
    #[arg(short, long)]
    pub rule: Vec<usize>,

    /// Write the pipeline to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Print the pipeline upload command
#[derive(Debug, Args, Clone)]
pub struct UploadCommand {
    /// Agent executable to invoke
    #[arg(long, default_value = "buildkite-agent")]
    pub agent: String,
}

impl RenderCommand {
    /// Watch rules selected by `--rule`, in the order given
    pub fn select_rules<'a>(&self, config: &'a PluginConfig) -> Result<Vec<&'a WatchRule>> {
        if self.rule.is_empty() {
            return Ok(config.watch.iter().collect());
        }

        self.rule
            .iter()
            .map(|&index| {
                config.watch.get(index).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Watch rule {} does not exist ({} rule(s) configured)",
                        index,
                        config.watch.len()
                    )
                })
            })
            .collect()
    }
}

impl UploadCommand {
    /// Full upload command line for `config`
    pub fn command_line(&self, config: &PluginConfig) -> String {
        std::iter::once(self.agent.as_str())
            .chain(config.upload_args())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::env::MapEnv;
    use serde_json::json;

    fn config() -> PluginConfig {
        PluginConfig::from_block(
            &json!({
                "interpolation": false,
                "watch": [
                    {"path": "a/", "config": {"command": "a.sh"}},
                    {"path": "b/", "config": {"command": "b.sh"}}
                ]
            }),
            &MapEnv::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_select_all_rules_by_default() {
        let config = config();
        let cmd = RenderCommand { rule: vec![], output: None };
        assert_eq!(cmd.select_rules(&config).unwrap().len(), 2);
    }

    #[test]
    fn test_select_rules_in_given_order() {
        let config = config();
        let cmd = RenderCommand { rule: vec![1, 0], output: None };

        let rules = cmd.select_rules(&config).unwrap();
        assert_eq!(rules[0].step.command_str(), Some("b.sh"));
        assert_eq!(rules[1].step.command_str(), Some("a.sh"));
    }

    #[test]
    fn test_select_unknown_rule_fails() {
        let config = config();
        let cmd = RenderCommand { rule: vec![5], output: None };
        assert!(cmd.select_rules(&config).is_err());
    }

    #[test]
    fn test_upload_command_line() {
        let cmd = UploadCommand { agent: "buildkite-agent".to_string() };
        assert_eq!(
            cmd.command_line(&config()),
            "buildkite-agent pipeline upload --no-interpolation"
        );
    }
}
