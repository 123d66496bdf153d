use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (holds the cursor database)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Team news list endpoint
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,
    /// Team code to track (e.g. "OB", "LG", "HT")
    #[serde(default = "default_team")]
    pub team: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL for feed fetching (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_base_url(),
            team: default_team(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyProvider {
    /// Slack Web API `chat.postMessage`
    Slack,
    /// Generic incoming webhook accepting `{"text": "..."}`
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_provider")]
    pub provider: NotifyProvider,
    /// Slack channel id, or the webhook URL for the webhook provider
    #[serde(default)]
    pub destination: String,
    /// Bot token (Slack). Prefer NEWSRELAY_NOTIFY_TOKEN over writing it here.
    #[serde(default)]
    pub token: Option<String>,
    /// Slack Web API base URL
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            destination: String::new(),
            token: None,
            api_base: default_slack_api_base(),
            request_timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between poll cycles in daemon mode (0 = disabled)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub day_boundary: DayBoundaryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            day_boundary: DayBoundaryConfig::default(),
        }
    }
}

/// Fetch the previous day's list during the first minutes after midnight,
/// so articles published late yesterday are still delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayBoundaryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_grace_minutes")]
    pub grace_minutes: u32,
}

impl Default for DayBoundaryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            grace_minutes: default_grace_minutes(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsrelay")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_feed_base_url() -> String {
    "https://sports.news.naver.com/kbaseball/news/list".to_string()
}

fn default_team() -> String {
    "OB".to_string()
}

fn default_provider() -> NotifyProvider {
    NotifyProvider::Slack
}

fn default_slack_api_base() -> String {
    "https://slack.com/api".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    3600 // 1 hour
}

fn default_grace_minutes() -> u32 {
    60
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default path, or defaults if it does not exist
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, then apply environment overrides
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Credentials and the team code may come from the environment instead of the file
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(team) = lookup("NEWSRELAY_TEAM").filter(|v| !v.is_empty()) {
            self.feed.team = team;
        }
        if let Some(token) = lookup("NEWSRELAY_NOTIFY_TOKEN").filter(|v| !v.is_empty()) {
            self.notify.token = Some(token);
        }
        if let Some(dest) = lookup("NEWSRELAY_NOTIFY_DESTINATION").filter(|v| !v.is_empty()) {
            self.notify.destination = dest;
        }
    }

    /// Check the settings a poll cycle cannot run without
    pub fn validate(&self) -> crate::Result<()> {
        self.validate_feed()?;
        if self.notify.destination.trim().is_empty() {
            return Err(crate::Error::Config(
                "notify.destination must be set (or NEWSRELAY_NOTIFY_DESTINATION)".to_string(),
            ));
        }
        if self.notify.provider == NotifyProvider::Slack
            && self.notify.token.as_deref().map_or(true, |t| t.trim().is_empty())
        {
            return Err(crate::Error::Config(
                "notify.token is required for the slack provider (or NEWSRELAY_NOTIFY_TOKEN)"
                    .to_string(),
            ));
        }
        if self.notify.provider == NotifyProvider::Webhook {
            url::Url::parse(&self.notify.destination).map_err(|e| {
                crate::Error::Config(format!("notify.destination is not a webhook URL: {}", e))
            })?;
        }
        Ok(())
    }

    /// Check only what fetching and resolving need
    pub fn validate_feed(&self) -> crate::Result<()> {
        if self.feed.team.trim().is_empty() {
            return Err(crate::Error::Config("feed.team must not be empty".to_string()));
        }
        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/newsrelay/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("newsrelay")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("newsrelay.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}
