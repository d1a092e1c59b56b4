//! Shared types and configuration for the bilitrack workspace:
//! the checkpoint schedule, label thresholds and classifier, derived-metric
//! formulas, and env/YAML configuration loading.

use thiserror::Error;

pub mod app_config;
pub mod channels;
mod config;
pub mod label;
pub mod metrics;
pub mod schedule;

pub use app_config::{AppConfig, Environment};
pub use channels::{load_channels, ChannelConfig, ChannelsFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use label::{LabelThresholds, OutcomeLabel};
pub use metrics::{engagement_rate, view_velocity};
pub use schedule::CheckpointSchedule;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read channels file {path}: {source}")]
    ChannelsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse channels file: {0}")]
    ChannelsFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
