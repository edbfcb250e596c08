//! Environment variable lookup
//!
//! Normalization reads the process environment in two places: bare keys in
//! `env` lists and the build-identity fallback for trigger steps. Both go
//! through [`EnvSource`] so tests can supply a fixed environment.

use std::collections::HashMap;

pub const BUILDKITE_MESSAGE: &str = "BUILDKITE_MESSAGE";
pub const BUILDKITE_BRANCH: &str = "BUILDKITE_BRANCH";
pub const BUILDKITE_COMMIT: &str = "BUILDKITE_COMMIT";
pub const BUILDKITE_PLUGINS: &str = "BUILDKITE_PLUGINS";

/// Source of environment variable values
pub trait EnvSource: Send + Sync {
    /// Look up `name`, returning `fallback` when it is unset
    fn var(&self, name: &str, fallback: &str) -> String;
}

/// Reads from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str, fallback: &str) -> String {
        std::env::var(name).unwrap_or_else(|_| fallback.to_string())
    }
}

/// Fixed in-memory environment
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable (builder style)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str, fallback: &str) -> String {
        self.vars
            .get(name)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_lookup_and_fallback() {
        let env = MapEnv::new().with("BUILDKITE_BRANCH", "main");

        assert_eq!(env.var("BUILDKITE_BRANCH", ""), "main");
        assert_eq!(env.var("BUILDKITE_COMMIT", ""), "");
        assert_eq!(env.var("MISSING", "fallback"), "fallback");
    }

    #[test]
    fn test_process_env_fallback_for_unset_variable() {
        let value = ProcessEnv.var("MONOREPO_DIFF_SURELY_UNSET_VARIABLE", "default");
        assert_eq!(value, "default");
    }
}
