use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Bot token and authorized user list are present
/// - At least one encoder slot
/// - Fetch timeouts are non-zero and credentials come in pairs
/// - Status server port is not 0 when enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "telegram.token cannot be empty".to_string(),
        ));
    }

    if config.access.authorized_users.is_empty() {
        return Err(ConfigError::ValidationError(
            "access.authorized_users must list at least one user".to_string(),
        ));
    }

    if config.encoder.parallel_encoders == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.parallel_encoders must be at least 1".to_string(),
        ));
    }

    let fetcher = &config.fetcher;
    if fetcher.stall_timeout_secs == 0 || fetcher.metadata_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher timeouts must be greater than 0".to_string(),
        ));
    }

    if fetcher.username.is_some() != fetcher.password.is_some() {
        return Err(ConfigError::ValidationError(
            "fetcher.username and fetcher.password must be set together".to_string(),
        ));
    }

    if fetcher.format.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "fetcher.format cannot be empty".to_string(),
        ));
    }

    if config.http.enabled && config.http.port == 0 {
        return Err(ConfigError::ValidationError(
            "http.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[telegram]
token = "t"

[access]
authorized_users = [1]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_zero_encoders_fails() {
        let mut config = valid_config();
        config.encoder.parallel_encoders = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_user_list_fails() {
        let mut config = valid_config();
        config.access.authorized_users.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_lonely_username_fails() {
        let mut config = valid_config();
        config.fetcher.username = Some("viewer".to_string());
        assert!(validate_config(&config).is_err());

        config.fetcher.password = Some("secret".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_http_port_zero_only_when_enabled() {
        let mut config = valid_config();
        config.http.port = 0;
        assert!(validate_config(&config).is_ok());

        config.http.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
