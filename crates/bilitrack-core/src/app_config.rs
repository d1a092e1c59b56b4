use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub channels_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub api_user_agent: String,
    pub api_min_interval_ms: u64,
    pub api_max_retries: u32,
    pub api_throttle_backoff_base_secs: u64,
    pub api_error_backoff_base_secs: u64,
    pub max_concurrent_channels: usize,
    pub min_label_checkpoint_hours: i32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("channels_path", &self.channels_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("api_user_agent", &self.api_user_agent)
            .field("api_min_interval_ms", &self.api_min_interval_ms)
            .field("api_max_retries", &self.api_max_retries)
            .field(
                "api_throttle_backoff_base_secs",
                &self.api_throttle_backoff_base_secs,
            )
            .field(
                "api_error_backoff_base_secs",
                &self.api_error_backoff_base_secs,
            )
            .field("max_concurrent_channels", &self.max_concurrent_channels)
            .field(
                "min_label_checkpoint_hours",
                &self.min_label_checkpoint_hours,
            )
            .finish()
    }
}
