//! Union-shaped configuration fields
//!
//! The plugin configuration accepts several shapes for the same logical
//! field. `path` may be one string or many, `soft_fail` may be a flag or a
//! list of exit-status records, and every `env` field is a list of `KEY` or
//! `KEY=VALUE` tokens. The resolvers here turn the raw JSON value into one
//! canonical form.
//!
//! `path` and `env` reject unrecognized shapes; `soft_fail` falls back to
//! [`SoftFail::Disabled`] instead.

use crate::core::env::EnvSource;
use crate::core::error::{ConfigError, ConfigResult};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A field that is either a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(s) => vec![s],
            StringOrList::Many(list) => list,
        }
    }
}

/// A field that is either a boolean or a list of records
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BoolOrRecordList {
    Flag(bool),
    Records(Vec<Value>),
}

/// Canonical soft-fail setting of a step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SoftFail {
    #[default]
    Disabled,
    /// Every non-zero exit is (or is not) a soft failure
    AllExitCodes(bool),
    /// Only the listed exit codes are soft failures; `None` is a record
    /// without a usable `exit_status`
    ExitCodeList(Vec<Option<i64>>),
}

impl SoftFail {
    /// True when the setting has no effect and is left out of the output
    pub fn is_disabled(&self) -> bool {
        matches!(self, SoftFail::Disabled | SoftFail::AllExitCodes(false))
    }
}

impl Serialize for SoftFail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SoftFail::Disabled => serializer.serialize_none(),
            SoftFail::AllExitCodes(flag) => serializer.serialize_bool(*flag),
            SoftFail::ExitCodeList(codes) => {
                let mut seq = serializer.serialize_seq(Some(codes.len()))?;
                for code in codes {
                    seq.serialize_element(&ExitStatusRecord(*code))?;
                }
                seq.end()
            }
        }
    }
}

struct ExitStatusRecord(Option<i64>);

impl Serialize for ExitStatusRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(self.0.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(code) = self.0 {
            map.serialize_entry("exit_status", &code)?;
        }
        map.end()
    }
}

/// Resolve a raw `path` value of watch rule `rule` into a list of paths
pub fn resolve_paths(raw: &Value, rule: usize) -> ConfigResult<Vec<String>> {
    if raw.is_null() {
        return Ok(Vec::new());
    }

    StringOrList::deserialize(raw)
        .map(StringOrList::into_vec)
        .map_err(|_| ConfigError::InvalidPathShape { rule })
}

/// Resolve a raw `env` value into a key/value map
///
/// `field` names the offending field in the error when the value is not a
/// list of strings.
pub fn resolve_env(
    raw: &Value,
    field: &str,
    env: &dyn EnvSource,
) -> ConfigResult<BTreeMap<String, String>> {
    if raw.is_null() {
        return Ok(BTreeMap::new());
    }

    let entries = Vec::<String>::deserialize(raw).map_err(|_| ConfigError::InvalidEnvShape {
        field: field.to_string(),
    })?;

    Ok(parse_env_list(entries.as_slice(), env))
}

/// Parse `KEY` / `KEY=VALUE` tokens into a map
///
/// Bare keys take their value from `env`, defaulting to an empty string;
/// blank tokens are skipped. The value is everything after the first `=`,
/// and the key everything before it, even when empty. Later keys overwrite
/// earlier ones.
pub fn parse_env_list<S: AsRef<str>>(entries: &[S], env: &dyn EnvSource) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();

    for entry in entries {
        let entry = entry.as_ref();
        let (key, value) = match entry.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim().to_string()),
            None => {
                let key = entry.trim();
                if key.is_empty() {
                    debug!("Skipping blank env entry");
                    continue;
                }
                (key, env.var(key, ""))
            }
        };

        result.insert(key.to_string(), value);
    }

    result
}

/// Resolve a raw `soft_fail` value
pub fn resolve_soft_fail(raw: &Value) -> SoftFail {
    match BoolOrRecordList::deserialize(raw) {
        Ok(BoolOrRecordList::Flag(flag)) => SoftFail::AllExitCodes(flag),
        Ok(BoolOrRecordList::Records(records)) => SoftFail::ExitCodeList(
            records.iter().map(exit_status_of).collect(),
        ),
        Err(_) => SoftFail::Disabled,
    }
}

/// Integer `exit_status` of a soft-fail record
///
/// Any other value (such as the `"*"` wildcard) cannot be represented and
/// is dropped with a warning.
fn exit_status_of(record: &Value) -> Option<i64> {
    let status = record.get("exit_status").filter(|status| !status.is_null())?;
    let code = status.as_i64();
    if code.is_none() {
        warn!("Ignoring non-integer soft_fail exit_status {}", status);
    }
    code
}
