pub mod binding_config;
pub mod logger_config;

pub use binding_config::{BindingConfig, BindingConfigBuilder};
pub use logger_config::LoggerConfig;
