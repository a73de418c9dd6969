//! # Configuration Module
//!
//! Startup configuration: a YAML file plus environment overrides.
//!
//! ```yaml
//! application:
//!   addr: 0.0.0.0:8080
//!   log_level: info
//!   log_format: json        # or pretty
//!   disable_boot_checks: false
//!   max_stream_bytes: 16777216  # cap on a streamed body held before writing
//! apis:                     # API paths to mount; empty mounts every API
//!   - calc
//! runtime:
//!   stack_size: 0x8000      # decimal or 0x-prefixed hex
//! ```
//!
//! Every key is optional. The environment wins over the file:
//!
//! | Variable                       | Overrides                          |
//! |--------------------------------|------------------------------------|
//! | `SWAGGERY_ADDR`                | `application.addr`                 |
//! | `SWAGGERY_LOG_LEVEL`           | `application.log_level`            |
//! | `SWAGGERY_DISABLE_BOOT_CHECKS` | `application.disable_boot_checks`  |
//! | `SWAGGERY_MAX_STREAM_BYTES`    | `application.max_stream_bytes`     |
//! | `SWAGGERY_STACK_SIZE`          | `runtime.stack_size`               |
//!
//! The introspection API is mounted whatever `apis` says.

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

use crate::render::DEFAULT_MAX_STREAM_BYTES;

/// Default coroutine stack size (16 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub disable_boot_checks: bool,
    /// Largest streamed body buffered for one response; beyond it the
    /// response becomes a 500
    pub max_stream_bytes: usize,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            disable_boot_checks: false,
            max_stream_bytes: DEFAULT_MAX_STREAM_BYTES,
        }
    }
}

/// Coroutine runtime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Stack size of every coroutine, handlers included, in bytes
    #[serde(deserialize_with = "deserialize_stack_size")]
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Configure the `may` scheduler. Must run before the first coroutine
    /// is spawned.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        info!(stack_size = self.stack_size, "Coroutine runtime configured");
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub application: ApplicationConfig,
    pub apis: Vec<String>,
    pub runtime: RuntimeConfig,
}

impl AppConfig {
    /// Read `path` (if any) and apply the environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides looked up through `lookup`; unparsable values are
    /// logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("SWAGGERY_ADDR") {
            self.application.addr = addr;
        }
        if let Some(level) = lookup("SWAGGERY_LOG_LEVEL") {
            self.application.log_level = level;
        }
        if let Some(raw) = lookup("SWAGGERY_DISABLE_BOOT_CHECKS") {
            match parse_flag(&raw) {
                Some(flag) => self.application.disable_boot_checks = flag,
                None => warn!(value = %raw, "Ignoring SWAGGERY_DISABLE_BOOT_CHECKS"),
            }
        }
        if let Some(raw) = lookup("SWAGGERY_MAX_STREAM_BYTES") {
            match raw.trim().parse() {
                Ok(limit) => self.application.max_stream_bytes = limit,
                Err(_) => warn!(value = %raw, "Ignoring SWAGGERY_MAX_STREAM_BYTES"),
            }
        }
        if let Some(raw) = lookup("SWAGGERY_STACK_SIZE") {
            match parse_stack_size(&raw) {
                Some(size) => self.runtime.stack_size = size,
                None => warn!(value = %raw, "Ignoring SWAGGERY_STACK_SIZE"),
            }
        }
    }
}

/// Parse a stack size given in decimal or `0x` hex.
#[must_use]
pub fn parse_stack_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn deserialize_stack_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => parse_stack_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stack size `{s}`"))),
    }
}
