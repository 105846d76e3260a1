use figment::{
    providers::{Env, Format, Toml},
    value::{Uncased, UncasedStr},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Flat variables understood by older deployments, and the key each one sets.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("BOT_ID", "telegram.token"),
    ("USER_IDS", "access.authorized_users"),
    ("PARALLEL_ENCODERS", "encoder.parallel_encoders"),
    ("YT_USER", "fetcher.username"),
    ("YT_PASS", "fetcher.password"),
    ("YT_FORMAT", "fetcher.format"),
];

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(Figment::new())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .merge(legacy_env())
        .merge(Env::prefixed("TUBERECODE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(legacy, _)| *legacy).collect();
    Env::raw().only(&names).map(legacy_key)
}

fn legacy_key(key: &UncasedStr) -> Uncased<'_> {
    match LEGACY_ENV_KEYS.iter().find(|(legacy, _)| key == *legacy) {
        Some(&(_, nested)) => Uncased::from_borrowed(nested),
        None => key.into(),
    }
}
