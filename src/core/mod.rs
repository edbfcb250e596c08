//! Core domain models for the plugin
//!
//! This module defines the plugin configuration, its normalization into
//! pipeline steps, and the pipeline document built from them.

pub mod config;
pub mod decode;
pub mod env;
pub mod error;
pub mod pipeline;
pub mod shape;
pub mod step;

pub use config::*;
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{ConfigError, ConfigResult};
pub use pipeline::*;
pub use shape::SoftFail;
pub use step::{Build, Step, StepKind};
