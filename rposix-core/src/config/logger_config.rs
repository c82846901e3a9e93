use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Logger configuration used by rposix tools.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub level_filter: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { level_filter: LevelFilter::Warn }
    }
}
