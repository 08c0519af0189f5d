//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. twilio.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::{Deserialize, Serialize};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default config file looked up by [`TwilioConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "twilio.toml";

/// Account context shared by every request against the messaging API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    /// Account SID (`AC...`), used in every resource path
    pub account_sid: String,

    /// Auth token, sent as the basic-auth password
    #[serde(skip_serializing)]
    pub auth_token: String,

    /// Scheme and host of the API. Pagination cursors are resolved against it.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// API version path segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout for the HTTP transport
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Walk both legs of a conversation concurrently
    #[serde(default)]
    pub concurrent_legs: bool,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            api_host: default_api_host(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            concurrent_legs: false,
        }
    }
}

fn default_api_host() -> String {
    "https://api.twilio.com".to_string()
}

fn default_api_version() -> String {
    "2010-04-01".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl TwilioConfig {
    /// Create a config with default host and version
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            ..Default::default()
        }
    }

    /// Point the config at another host (tests, regional edges)
    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable or disable concurrent conversation legs
    pub fn with_concurrent_legs(mut self, enabled: bool) -> Self {
        self.concurrent_legs = enabled;
        self
    }

    /// Versioned API root, e.g. `https://api.twilio.com/2010-04-01`
    pub fn api_base(&self) -> String {
        format!(
            "{}/{}",
            self.api_host.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// Check the fields every request depends on
    pub fn validate(&self) -> Result<()> {
        if self.account_sid.trim().is_empty() {
            return Err(Error::Config("account_sid is empty".to_string()));
        }

        url::Url::parse(&self.api_host)
            .map_err(|e| Error::Config(format!("Invalid api_host '{}': {}", self.api_host, e)))?;

        Ok(())
    }

    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                while let Some(c) = chars.next() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Parse TOML content (after `${VAR}` expansion) without env overrides
    fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);
        let toml_config: TomlConfig = toml::from_str(&expanded)?;
        Ok(Self::from_toml_config(toml_config))
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換され、
    /// その後 `TWILIO_*` 環境変数で上書きされます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&content)?;
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `.env` を読み込んだ後、`./twilio.toml` があればそれを使い、
    /// なければ環境変数のみから構築します。
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        debug!("{} not found, using environment only", DEFAULT_CONFIG_FILE);
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID")
            .map_err(|_| Error::Config("TWILIO_ACCOUNT_SID not set".to_string()))?;
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN")
            .map_err(|_| Error::Config("TWILIO_AUTH_TOKEN not set".to_string()))?;

        let mut cfg = Self::new(account_sid, auth_token);
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// TOML 構造から TwilioConfig を構築
    fn from_toml_config(toml: TomlConfig) -> Self {
        let account = toml.account.unwrap_or_default();
        let api = toml.api.unwrap_or_default();

        Self {
            account_sid: account.sid.unwrap_or_default(),
            auth_token: account.auth_token.unwrap_or_default(),
            api_host: api
                .host
                .map(|h| h.trim_end_matches('/').to_string())
                .unwrap_or_else(default_api_host),
            api_version: api.version.unwrap_or_else(default_api_version),
            request_timeout_secs: api
                .request_timeout_secs
                .unwrap_or_else(default_request_timeout_secs),
            concurrent_legs: toml
                .conversation
                .and_then(|c| c.concurrent_legs)
                .unwrap_or(false),
        }
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        if let Ok(sid) = std::env::var("TWILIO_ACCOUNT_SID") {
            if !sid.is_empty() {
                self.account_sid = sid;
            }
        }
        if let Ok(token) = std::env::var("TWILIO_AUTH_TOKEN") {
            if !token.is_empty() {
                self.auth_token = token;
            }
        }
        if let Ok(host) = std::env::var("TWILIO_API_HOST") {
            if !host.is_empty() {
                self.api_host = host.trim_end_matches('/').to_string();
            }
        }
        if let Ok(version) = std::env::var("TWILIO_API_VERSION") {
            if !version.is_empty() {
                self.api_version = version;
            }
        }
        if let Ok(secs) = std::env::var("TWILIO_REQUEST_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                self.request_timeout_secs = s;
            }
        }
        if let Ok(enabled) = std::env::var("TWILIO_CONCURRENT_LEGS") {
            self.concurrent_legs = matches!(enabled.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    account: Option<TomlAccountConfig>,
    api: Option<TomlApiConfig>,
    conversation: Option<TomlConversationConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlAccountConfig {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    auth_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConversationConfig {
    #[serde(default)]
    concurrent_legs: Option<bool>,
}
