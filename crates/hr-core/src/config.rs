//! Configuration management
//!
//! Settings are loaded from environment variables with sensible defaults.
//! The gateway binary loads a `.env` file before calling [`Config::from_env`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Session lifecycle tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hard dialog timeout in seconds, measured from session creation.
    /// A session past this age is terminated on next contact no matter
    /// how recently it was active.
    #[serde(default = "default_session_timeout")]
    pub timeout_secs: u64,

    /// Invalid-input strikes before a session is terminated
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,

    /// Idle retention window for the background sweep, in seconds
    #[serde(default = "default_retention")]
    pub retention_secs: u64,

    /// Sweep interval in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_session_timeout(),
            max_attempts: default_max_attempts(),
            retention_secs: default_retention(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Africa's Talking SMS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Account username (sandbox mode uses "sandbox")
    pub username: Option<String>,

    /// API key
    pub api_key: Option<String>,

    /// Use the sandbox endpoint
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            username: None,
            api_key: None,
            sandbox: default_sandbox(),
        }
    }
}

impl SmsConfig {
    /// Whether outbound SMS can actually be sent
    pub fn is_configured(&self) -> bool {
        self.username.is_some() && self.api_key.is_some()
    }
}

/// Main configuration for the USSD gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port for the webhook HTTP server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Session lifecycle settings
    #[serde(default)]
    pub session: SessionConfig,

    /// SMS settings
    #[serde(default)]
    pub sms: SmsConfig,

    /// Path to the SQLite record database; in-memory records when unset
    pub db_path: Option<String>,

    /// Base URL for generated document links
    #[serde(default = "default_docs_base_url")]
    pub docs_base_url: String,

    /// Authorized employee roster as `ID:Display Name` pairs
    #[serde(default)]
    pub employees: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            session: SessionConfig::default(),
            sms: SmsConfig::default(),
            db_path: None,
            docs_base_url: default_docs_base_url(),
            employees: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("USSD_PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid USSD_PORT: {}", port)))?;
        }

        if let Ok(secs) = std::env::var("SESSION_TIMEOUT_SECS") {
            config.session.timeout_secs = parse_secs("SESSION_TIMEOUT_SECS", &secs)?;
        }
        if let Ok(max) = std::env::var("MAX_ATTEMPTS") {
            config.session.max_attempts = max
                .parse()
                .map_err(|_| Error::Config(format!("Invalid MAX_ATTEMPTS: {}", max)))?;
        }
        if let Ok(secs) = std::env::var("SESSION_RETENTION_SECS") {
            config.session.retention_secs = parse_secs("SESSION_RETENTION_SECS", &secs)?;
        }
        if let Ok(secs) = std::env::var("SWEEP_INTERVAL_SECS") {
            config.session.sweep_interval_secs = parse_secs("SWEEP_INTERVAL_SECS", &secs)?;
        }

        if let Ok(username) = std::env::var("AT_USERNAME") {
            if !username.is_empty() {
                config.sms.username = Some(username);
            }
        }
        if let Ok(api_key) = std::env::var("AT_API_KEY") {
            if !api_key.is_empty() {
                config.sms.api_key = Some(api_key);
            }
        }
        if let Ok(sandbox) = std::env::var("AT_SANDBOX") {
            config.sms.sandbox = sandbox.to_lowercase() == "true";
        }

        if let Ok(path) = std::env::var("HR_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(path);
            }
        }
        if let Ok(url) = std::env::var("DOCS_BASE_URL") {
            if !url.is_empty() {
                config.docs_base_url = url;
            }
        }
        if let Ok(roster) = std::env::var("HR_EMPLOYEES") {
            config.employees = Self::parse_roster(&roster)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a comma-separated `ID:Display Name` roster string
    fn parse_roster(raw: &str) -> Result<Vec<(String, String)>> {
        let mut roster = Vec::new();
        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (id, name) = entry
                .split_once(':')
                .ok_or_else(|| Error::Config(format!("Invalid roster entry: {}", entry)))?;
            roster.push((id.trim().to_uppercase(), name.trim().to_string()));
        }
        Ok(roster)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.sms.sandbox && !self.sms.is_configured() {
            return Err(Error::Config(
                "Live SMS mode requires AT_USERNAME and AT_API_KEY".to_string(),
            ));
        }
        if self.session.timeout_secs == 0 {
            return Err(Error::Config("SESSION_TIMEOUT_SECS must be positive".to_string()));
        }
        if self.session.max_attempts == 0 {
            return Err(Error::Config("MAX_ATTEMPTS must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_secs(name: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid {}: {}", name, value)))
}

fn default_session_timeout() -> u64 {
    300
}

fn default_max_attempts() -> u8 {
    3
}

fn default_retention() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_sandbox() -> bool {
    true
}

fn default_port() -> u16 {
    8000
}

fn default_docs_base_url() -> String {
    "https://elevatehr.example.com/docs".to_string()
}
