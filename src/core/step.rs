//! Step domain model
//!
//! A watch rule's `config` block is decoded into [`RawStep`], which keeps
//! the union-shaped fields as raw JSON, and then normalized into [`Step`].
//! `Step` serializes straight into the pipeline format: a step with a
//! `group` label is emitted as a group wrapping the step.

use crate::core::decode::lenient;
use crate::core::env::{EnvSource, BUILDKITE_BRANCH, BUILDKITE_COMMIT, BUILDKITE_MESSAGE};
use crate::core::error::ConfigResult;
use crate::core::shape::{resolve_env, resolve_soft_fail, SoftFail};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Step as written in the plugin configuration
///
/// `null` and wrong-typed values are treated as absent, except for `env`
/// which is validated during normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStep {
    #[serde(deserialize_with = "lenient")]
    pub group: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub trigger: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub build: Option<RawBuild>,
    #[serde(deserialize_with = "lenient")]
    pub command: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub agents: Option<RawAgents>,
    #[serde(deserialize_with = "lenient")]
    pub artifacts: Option<Vec<String>>,
    pub env: Value,
    #[serde(rename = "async", deserialize_with = "lenient")]
    pub is_async: Option<bool>,
    pub soft_fail: Value,
}

/// `build` block of a trigger step as written in the configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBuild {
    #[serde(deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub branch: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub commit: Option<String>,
    pub env: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAgents {
    #[serde(deserialize_with = "lenient")]
    pub queue: Option<String>,
}

/// A normalized pipeline step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Display group; when set the step is emitted inside a group wrapper
    pub group: Option<String>,
    pub label: Option<String>,
    /// What the step does. `None` for a step with neither a command nor a
    /// trigger.
    pub kind: Option<StepKind>,
    pub agent_queue: Option<String>,
    pub artifacts: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub is_async: bool,
    pub soft_fail: SoftFail,
}

/// A step either runs a command or triggers another pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    Command(String),
    Trigger { pipeline: String, build: Build },
}

/// Build parameters passed to a triggered pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Build {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl Build {
    /// Fill empty message/branch/commit from the build environment
    ///
    /// Values already set are never replaced.
    pub fn fill_from_env(&mut self, env: &dyn EnvSource) {
        fill_field(&mut self.message, BUILDKITE_MESSAGE, env);
        fill_field(&mut self.branch, BUILDKITE_BRANCH, env);
        fill_field(&mut self.commit, BUILDKITE_COMMIT, env);
    }

    fn is_empty(&self) -> bool {
        self.message.is_none()
            && self.branch.is_none()
            && self.commit.is_none()
            && self.env.is_empty()
    }
}

fn fill_field(field: &mut Option<String>, name: &str, env: &dyn EnvSource) {
    if field.is_some() {
        return;
    }
    let value = env.var(name, "");
    if !value.is_empty() {
        debug!("Using {} for trigger build", name);
        *field = Some(value);
    }
}

impl Step {
    /// A plain command step
    pub fn command(command: impl Into<String>) -> Self {
        Step {
            kind: Some(StepKind::Command(command.into())),
            ..Default::default()
        }
    }

    /// Normalize the `config` block of watch rule `rule`
    ///
    /// Resolves the step's own `env` and `build.env`. Inherited settings are
    /// applied separately by [`Step::merge_env`] and
    /// [`Step::apply_build_fallback`].
    pub fn from_raw(raw: RawStep, rule: usize, env: &dyn EnvSource) -> ConfigResult<Self> {
        let step_env = resolve_env(&raw.env, &format!("watch[{}].config.env", rule), env)?;
        let soft_fail = resolve_soft_fail(&raw.soft_fail);

        let command = non_empty(raw.command);
        let trigger = non_empty(raw.trigger);

        let kind = match (command, trigger) {
            (Some(command), trigger) => {
                if let Some(trigger) = trigger {
                    warn!(
                        "watch[{}] sets both command and trigger; ignoring trigger '{}'",
                        rule, trigger
                    );
                }
                Some(StepKind::Command(command))
            }
            (None, Some(pipeline)) => {
                let raw_build = raw.build.unwrap_or_default();
                let build = Build {
                    message: non_empty(raw_build.message),
                    branch: non_empty(raw_build.branch),
                    commit: non_empty(raw_build.commit),
                    env: resolve_env(
                        &raw_build.env,
                        &format!("watch[{}].config.build.env", rule),
                        env,
                    )?,
                };
                Some(StepKind::Trigger { pipeline, build })
            }
            (None, None) => None,
        };

        Ok(Step {
            group: non_empty(raw.group),
            label: non_empty(raw.label),
            kind,
            agent_queue: raw.agents.and_then(|agents| non_empty(agents.queue)),
            artifacts: raw.artifacts.unwrap_or_default(),
            env: step_env,
            is_async: raw.is_async.unwrap_or(false),
            soft_fail,
        })
    }

    /// Merge top-level env into this step
    ///
    /// Command steps receive the entries in `env`, trigger steps in
    /// `build.env`. Top-level values replace the step's own on conflict.
    /// Steps of neither kind are left unchanged.
    pub fn merge_env(&mut self, global: &BTreeMap<String, String>) {
        let target = match &mut self.kind {
            Some(StepKind::Command(_)) => &mut self.env,
            Some(StepKind::Trigger { build, .. }) => &mut build.env,
            None => return,
        };

        for (key, value) in global {
            target.insert(key.clone(), value.clone());
        }
    }

    /// Fill a trigger step's build identity from the environment
    pub fn apply_build_fallback(&mut self, env: &dyn EnvSource) {
        if let Some(StepKind::Trigger { build, .. }) = &mut self.kind {
            build.fill_from_env(env);
        }
    }

    pub fn command_str(&self) -> Option<&str> {
        match &self.kind {
            Some(StepKind::Command(command)) => Some(command),
            _ => None,
        }
    }

    pub fn trigger_str(&self) -> Option<&str> {
        match &self.kind {
            Some(StepKind::Trigger { pipeline, .. }) => Some(pipeline),
            _ => None,
        }
    }

    pub fn build(&self) -> Option<&Build> {
        match &self.kind {
            Some(StepKind::Trigger { build, .. }) => Some(build),
            _ => None,
        }
    }

    /// The step as embedded inside its group wrapper
    pub fn without_group(&self) -> Step {
        Step {
            group: None,
            ..self.clone()
        }
    }

    fn group_label(&self) -> Option<&str> {
        self.group.as_deref().filter(|label| !label.is_empty())
    }
}

/// Serialized form of a step without its group
#[derive(Serialize)]
struct FlatStep<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    trigger: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<&'a Build>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agents: Option<FlatAgents<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifacts: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<&'a BTreeMap<String, String>>,
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    is_async: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    soft_fail: Option<&'a SoftFail>,
}

#[derive(Serialize)]
struct FlatAgents<'a> {
    queue: &'a str,
}

#[derive(Serialize)]
struct GroupStep<'a> {
    group: &'a str,
    steps: Vec<FlatStep<'a>>,
}

impl<'a> From<&'a Step> for FlatStep<'a> {
    fn from(step: &'a Step) -> Self {
        FlatStep {
            trigger: step.trigger_str(),
            label: step.label.as_deref(),
            build: step.build().filter(|build| !build.is_empty()),
            command: step.command_str(),
            agents: step.agent_queue.as_deref().map(|queue| FlatAgents { queue }),
            artifacts: Some(step.artifacts.as_slice()).filter(|a| !a.is_empty()),
            env: Some(&step.env).filter(|env| !env.is_empty()),
            is_async: step.is_async.then_some(true),
            soft_fail: Some(&step.soft_fail).filter(|soft_fail| !soft_fail.is_disabled()),
        }
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.group_label() {
            Some(label) => GroupStep {
                group: label,
                steps: vec![FlatStep::from(self)],
            }
            .serialize(serializer),
            None => FlatStep::from(self).serialize(serializer),
        }
    }
}
