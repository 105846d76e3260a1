use serde::{Deserialize, Deserializer, Serialize};
use std::net::IpAddr;

use crate::encoder::EncoderConfig;
use crate::fetcher::FetcherConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub access: AccessConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Long-poll timeout passed to getUpdates.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u32,
    /// HTTP timeout for a single Bot API call. Must exceed the poll timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u32,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u32 {
    30
}

fn default_request_timeout() -> u32 {
    60
}

/// Who may talk to the bot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessConfig {
    /// Telegram user ids. Accepts a TOML array or a whitespace/comma separated string.
    #[serde(deserialize_with = "deserialize_user_list")]
    pub authorized_users: Vec<i64>,
}

/// Optional status server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8090
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn deserialize_user_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UserList {
        List(Vec<i64>),
        Single(i64),
        Text(String),
    }

    match UserList::deserialize(deserializer)? {
        UserList::List(ids) => Ok(ids),
        UserList::Single(id) => Ok(vec![id]),
        UserList::Text(text) => parse_user_list(&text).map_err(serde::de::Error::custom),
    }
}

/// Parses `"123 456,789"` into a list of ids.
pub fn parse_user_list(text: &str) -> Result<Vec<i64>, String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| format!("invalid user id: {:?}", part))
        })
        .collect()
}

/// Sanitized config for the status server (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub authorized_users: usize,
    pub fetcher: SanitizedFetcherConfig,
    pub encoder: EncoderConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_url: String,
    pub token_configured: bool,
    pub poll_timeout_secs: u32,
}

/// Fetcher config with the account password hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedFetcherConfig {
    pub program: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password_configured: bool,
    pub max_retries: u32,
    pub stall_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            telegram: SanitizedTelegramConfig {
                api_url: config.telegram.api_url.clone(),
                token_configured: !config.telegram.token.is_empty(),
                poll_timeout_secs: config.telegram.poll_timeout_secs,
            },
            authorized_users: config.access.authorized_users.len(),
            fetcher: SanitizedFetcherConfig {
                program: config.fetcher.program.to_string_lossy().to_string(),
                format: config.fetcher.format.clone(),
                username: config.fetcher.username.clone(),
                password_configured: config.fetcher.password.is_some(),
                max_retries: config.fetcher.max_retries,
                stall_timeout_secs: config.fetcher.stall_timeout_secs,
            },
            encoder: config.encoder.clone(),
            http: config.http.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncodeStrategy;

    const MINIMAL: &str = r#"
[telegram]
token = "123:abc"

[access]
authorized_users = [42, 7]
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.telegram.token, "123:abc");
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.access.authorized_users, vec![42, 7]);
        assert_eq!(config.encoder.parallel_encoders, 1);
        assert_eq!(config.encoder.strategy, EncodeStrategy::CpuTwoPass);
        assert_eq!(config.fetcher.format, "bestvideo[height<=1080]+bestaudio");
        assert_eq!(config.fetcher.max_retries, 5);
        assert_eq!(config.fetcher.stall_timeout_secs, 120);
        assert!(!config.http.enabled);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_missing_telegram_fails() {
        let toml = r#"
[access]
authorized_users = [1]
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_user_list_as_string() {
        let toml = r#"
[telegram]
token = "t"

[access]
authorized_users = "11 22,33"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.access.authorized_users, vec![11, 22, 33]);
    }

    #[test]
    fn test_user_list_rejects_garbage() {
        assert!(parse_user_list("12 abc").is_err());
        assert_eq!(parse_user_list("  ").unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.fetcher.username = Some("viewer".to_string());
        config.fetcher.password = Some("hunter2".to_string());

        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(sanitized.telegram.token_configured);
        assert!(sanitized.fetcher.password_configured);
        assert_eq!(sanitized.authorized_users, 2);
        assert!(!json.contains("123:abc"));
        assert!(!json.contains("hunter2"));
    }
}
