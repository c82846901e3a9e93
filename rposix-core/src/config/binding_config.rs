use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::logger_config::LoggerConfig;

/// Runtime switches for the operation registry.
/// Please use [`BindingConfigBuilder`] if you want to build it from code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Logger configuration for tools embedding the binding.
    pub logger: LoggerConfig,
    /// Log every dispatched call at trace level.
    pub trace_calls: bool,
    /// Log OS rejections at debug level before handing them to the caller.
    pub log_os_errors: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            trace_calls: false,
            log_os_errors: true,
        }
    }
}

impl BindingConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: BindingConfig = toml::from_str(s)?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config {:?}", path))?;
        Self::from_toml_str(&s).with_context(|| format!("parse config {:?}", path))
    }
}

/// `BindingConfigBuilder` is a convenience builder to create a `BindingConfig` from code.
pub struct BindingConfigBuilder {
    config: BindingConfig,
}

impl BindingConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_logger_config(mut self, logger: LoggerConfig) -> Self {
        self.config.logger = logger;
        self
    }

    pub fn with_trace_calls(mut self, trace_calls: bool) -> Self {
        self.config.trace_calls = trace_calls;
        self
    }

    pub fn with_log_os_errors(mut self, log_os_errors: bool) -> Self {
        self.config.log_os_errors = log_os_errors;
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> BindingConfig {
        self.config
    }
}

impl Default for BindingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
