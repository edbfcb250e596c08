//! Pipeline document assembled from the plugin configuration

use crate::core::config::{PluginConfig, WatchRule};
use crate::core::step::Step;
use serde::{Serialize, Serializer};

/// The pipeline document handed to the agent for upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    pub steps: Vec<PipelineStep>,
}

/// An entry in the pipeline's `steps` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStep {
    Step(Step),
    /// Barrier that waits for all previous steps
    Wait,
}

impl Serialize for PipelineStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PipelineStep::Step(step) => step.serialize(serializer),
            PipelineStep::Wait => serializer.serialize_str("wait"),
        }
    }
}

impl Pipeline {
    /// Build the pipeline for the selected watch rules
    ///
    /// Rule steps come first, in the given order. A `wait` step follows them
    /// when `wait` is enabled and at least one rule was selected. Hook
    /// commands are always appended last.
    pub fn from_rules<'a, I>(config: &PluginConfig, rules: I) -> Self
    where
        I: IntoIterator<Item = &'a WatchRule>,
    {
        let mut steps: Vec<PipelineStep> = rules
            .into_iter()
            .map(|rule| PipelineStep::Step(rule.step.clone()))
            .collect();

        if config.wait && !steps.is_empty() {
            steps.push(PipelineStep::Wait);
        }

        steps.extend(
            config
                .hooks
                .iter()
                .map(|hook| PipelineStep::Step(Step::command(hook.command.clone()))),
        );

        Self { steps }
    }

    /// Build the pipeline for every watch rule
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::from_rules(config, &config.watch)
    }

    /// Number of steps, including wait and hook steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Serialize to pipeline YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HookConfig;
    use crate::core::env::MapEnv;
    use serde_json::json;

    fn config(block: serde_json::Value) -> PluginConfig {
        PluginConfig::from_block(&block, &MapEnv::new()).unwrap()
    }

    #[test]
    fn test_pipeline_from_all_rules() {
        let config = config(json!({
            "watch": [
                {"path": "a/", "config": {"command": "a.sh"}},
                {"path": "b/", "config": {"trigger": "b-pipeline"}}
            ]
        }));

        let pipeline = Pipeline::from_config(&config);

        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            serde_json::to_value(&pipeline).unwrap(),
            json!({"steps": [{"command": "a.sh"}, {"trigger": "b-pipeline"}]})
        );
    }

    #[test]
    fn test_wait_and_hooks_follow_rule_steps() {
        let config = config(json!({
            "wait": true,
            "hooks": [{"command": "echo finished"}],
            "watch": [{"path": "a/", "config": {"command": "a.sh"}}]
        }));

        let pipeline = Pipeline::from_config(&config);

        assert_eq!(
            pipeline.to_yaml().unwrap(),
            "steps:\n- command: a.sh\n- wait\n- command: echo finished\n"
        );
    }

    #[test]
    fn test_no_wait_without_rule_steps() {
        let config = PluginConfig {
            wait: true,
            hooks: vec![HookConfig { command: "notify".to_string() }],
            ..Default::default()
        };

        let pipeline = Pipeline::from_rules(&config, std::iter::empty());

        assert_eq!(
            pipeline.steps,
            vec![PipelineStep::Step(Step::command("notify"))]
        );
    }

    #[test]
    fn test_selected_rules_only() {
        let config = config(json!({
            "watch": [
                {"path": "a/", "config": {"command": "a.sh"}},
                {"path": "b/", "config": {"command": "b.sh", "group": "B"}}
            ]
        }));

        let pipeline = Pipeline::from_rules(&config, [&config.watch[1]]);

        assert_eq!(
            pipeline.to_yaml().unwrap(),
            "steps:\n- group: B\n  steps:\n  - command: b.sh\n"
        );
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = Pipeline::from_config(&PluginConfig::default());
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.to_yaml().unwrap(), "steps: []\n");
    }
}
