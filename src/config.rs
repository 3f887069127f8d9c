//! Configuration types for panreport

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable consulted for the API key before the config file
pub const API_KEY_ENV: &str = "PANREPORT_API_KEY";

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "panreport.toml";

/// Timestamp format the appliance accepts in query filters,
/// e.g. `2023/01/01 00:00:00`
pub const START_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// API credential for the appliance
///
/// Wraps the raw key so it cannot leak into logs: both `Debug` and `Display`
/// render a redacted placeholder. Use [`ApiKey::expose`] at the one point the
/// key is written into a request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key value
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key material, for request construction only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***")
    }
}

/// Log query parameters for the report job
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Appliance log type to query (default: "hipmatch")
    #[serde(default = "default_log_type")]
    pub log_type: String,

    /// Number of logs to capture (default: 5000)
    ///
    /// Informational only: reported to the operator, never sent to the
    /// appliance.
    #[serde(default = "default_max_logs")]
    pub max_logs: u32,

    /// Inclusive lower bound on record receive time
    /// (default: "2023/01/01 00:00:00", see [`START_DATE_FORMAT`])
    #[serde(default = "default_start_date")]
    pub start_date: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            log_type: default_log_type(),
            max_logs: default_max_logs(),
            start_date: default_start_date(),
        }
    }
}

/// Job status polling parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wait between status probes (default: 10 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub interval: Duration,

    /// Maximum number of status probes before giving up (default: 30)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Main configuration for panreport
///
/// Loaded from a TOML file with per-field defaults; any subset of fields may
/// be present. The API key can also come from the [`API_KEY_ENV`] environment
/// variable, which takes precedence over the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Hostname of the PAN-OS appliance
    #[serde(default)]
    pub hostname: Option<String>,

    /// API key for authentication (file value; env overrides)
    #[serde(default)]
    pub api_key: Option<ApiKey>,

    /// Log query parameters
    #[serde(flatten)]
    pub query: QueryConfig,

    /// Polling parameters
    #[serde(flatten)]
    pub poll: PollConfig,

    /// Per-request HTTP timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Output CSV path (default: "hip_users_report.csv")
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: None,
            api_key: None,
            query: QueryConfig::default(),
            poll: PollConfig::default(),
            request_timeout: default_request_timeout(),
            output: default_output(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// With an explicit `path`, the file must exist and parse. With `None`,
    /// [`DEFAULT_CONFIG_FILE`] is read if present, otherwise defaults are
    /// returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) if !required => return Ok(Self::default()),
            Err(e) => {
                return Err(Error::Config {
                    message: format!("cannot read {}: {}", path.display(), e),
                    key: None,
                });
            }
        };

        toml::from_str(&contents).map_err(|e| Error::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Resolve the API key, preferring [`API_KEY_ENV`] over the config file
    pub fn resolve_api_key(&self) -> Result<ApiKey> {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            return Ok(ApiKey::new(key));
        }
        self.api_key.clone().ok_or_else(|| Error::Config {
            message: format!("no API key configured (set {} or api_key)", API_KEY_ENV),
            key: Some("api_key".to_string()),
        })
    }
}

/// Validate a start-date string against [`START_DATE_FORMAT`]
pub fn validate_start_date(start_date: &str) -> Result<()> {
    NaiveDateTime::parse_from_str(start_date, START_DATE_FORMAT)
        .map(|_| ())
        .map_err(|e| Error::Config {
            message: format!(
                "invalid start date {:?} (expected YYYY/MM/DD HH:MM:SS): {}",
                start_date, e
            ),
            key: Some("start_date".to_string()),
        })
}

fn default_log_type() -> String {
    "hipmatch".to_string()
}

fn default_max_logs() -> u32 {
    5000
}

fn default_start_date() -> String {
    "2023/01/01 00:00:00".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_max_attempts() -> u32 {
    30
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_output() -> PathBuf {
    PathBuf::from("hip_users_report.csv")
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
