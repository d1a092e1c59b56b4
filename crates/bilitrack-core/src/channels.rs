//! Monitored-channel configuration, loaded from `config/channels.yaml`.
//!
//! The YAML file is the source of truth for which external channels get
//! scanned for comparison data; `seed-channels` upserts it into the store.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One monitored channel as declared in the YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Numeric channel uid, kept as a string since it is an opaque external id.
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelsFile {
    pub channels: Vec<ChannelConfig>,
}

/// Load and validate the channels configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_channels(path: &Path) -> Result<ChannelsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ChannelsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let channels_file: ChannelsFile = serde_yaml::from_str(&content)?;
    validate_channels(&channels_file)?;

    Ok(channels_file)
}

fn validate_channels(file: &ChannelsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for channel in &file.channels {
        let uid = channel.uid.trim();
        if uid.is_empty() {
            return Err(ConfigError::Validation(
                "channel uid must be non-empty".to_string(),
            ));
        }
        if !uid.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Validation(format!(
                "channel uid '{uid}' must be numeric"
            )));
        }
        if !seen.insert(uid.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate channel uid: '{uid}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<(), ConfigError> {
        let file: ChannelsFile = serde_yaml::from_str(yaml)?;
        validate_channels(&file)
    }

    #[test]
    fn valid_channels_pass_validation() {
        let yaml = "channels:\n  - uid: \"12345\"\n    name: transporter-a\n  - uid: \"67890\"\n";
        assert!(parse(yaml).is_ok());
    }

    #[test]
    fn empty_uid_is_rejected() {
        let yaml = "channels:\n  - uid: \"\"\n";
        assert!(matches!(parse(yaml), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn non_numeric_uid_is_rejected() {
        let yaml = "channels:\n  - uid: \"abc123\"\n";
        assert!(matches!(parse(yaml), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn duplicate_uid_is_rejected() {
        let yaml = "channels:\n  - uid: \"12345\"\n  - uid: \"12345\"\n";
        assert!(matches!(parse(yaml), Err(ConfigError::Validation(_))));
    }
}
